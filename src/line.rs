use thiserror::Error;

/// An ordered sequence of text lines, each retaining its original terminator.
///
/// Splitting follows the same rules as reading a file line by line with the
/// terminator kept: `\n` and `\r\n` stay attached to the line they end, and a
/// final unterminated fragment is its own line. Rendering is plain
/// concatenation, so parse-then-render reproduces the input byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineBuffer {
    lines: Vec<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    #[error("line index {index} out of range (buffer has {len} lines)")]
    OutOfRange { index: usize, len: usize },
}

impl LineBuffer {
    /// Split `content` into lines, keeping terminators.
    pub fn from_str(content: &str) -> Self {
        Self {
            lines: content.split_inclusive('\n').map(str::to_string).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    /// Like [`get`](Self::get), but an out-of-range index is an error.
    pub fn line(&self, index: usize) -> Result<&str, LineError> {
        self.get(index).ok_or(LineError::OutOfRange {
            index,
            len: self.lines.len(),
        })
    }

    /// Exchange the contents of two positions. Length unchanged.
    pub fn swap(&mut self, i: usize, j: usize) -> Result<(), LineError> {
        let len = self.lines.len();
        for index in [i, j] {
            if index >= len {
                return Err(LineError::OutOfRange { index, len });
            }
        }
        self.lines.swap(i, j);
        Ok(())
    }

    /// Remove and return the line at `index`; subsequent lines shift left.
    pub fn remove(&mut self, index: usize) -> Result<String, LineError> {
        if index >= self.lines.len() {
            return Err(LineError::OutOfRange {
                index,
                len: self.lines.len(),
            });
        }
        Ok(self.lines.remove(index))
    }

    /// Insert `line` at `index`, clamping to the end when `index > len`.
    ///
    /// Clamping matches the list-insert semantics the fixup operations are
    /// specified against, so a destination past the end appends rather than
    /// failing.
    pub fn insert(&mut self, index: usize, line: String) {
        let index = index.min(self.lines.len());
        self.lines.insert(index, line);
    }

    /// Render the buffer back to a single string by concatenation.
    pub fn render(&self) -> String {
        self.lines.concat()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_keeps_terminators() {
        let buf = LineBuffer::from_str("a\nb\nc\n");
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.get(0), Some("a\n"));
        assert_eq!(buf.get(2), Some("c\n"));
    }

    #[test]
    fn test_split_unterminated_tail() {
        let buf = LineBuffer::from_str("a\nb");
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.get(1), Some("b"));
    }

    #[test]
    fn test_split_crlf_stays_attached() {
        let buf = LineBuffer::from_str("a\r\nb\r\n");
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.get(0), Some("a\r\n"));
    }

    #[test]
    fn test_empty_input() {
        let buf = LineBuffer::from_str("");
        assert!(buf.is_empty());
        assert_eq!(buf.render(), "");
    }

    #[test]
    fn test_render_round_trip_mixed_terminators() {
        let content = "one\r\ntwo\nthree";
        assert_eq!(LineBuffer::from_str(content).render(), content);
    }

    #[test]
    fn test_swap() {
        let mut buf = LineBuffer::from_str("a\nb\nc\n");
        buf.swap(0, 2).unwrap();
        assert_eq!(buf.render(), "c\nb\na\n");
    }

    #[test]
    fn test_swap_out_of_range() {
        let mut buf = LineBuffer::from_str("a\nb\n");
        let err = buf.swap(0, 5).unwrap_err();
        assert_eq!(err, LineError::OutOfRange { index: 5, len: 2 });
    }

    #[test]
    fn test_remove_shifts_left() {
        let mut buf = LineBuffer::from_str("a\nb\nc\n");
        let taken = buf.remove(1).unwrap();
        assert_eq!(taken, "b\n");
        assert_eq!(buf.get(1), Some("c\n"));
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut buf = LineBuffer::from_str("a\n");
        assert!(matches!(
            buf.remove(3),
            Err(LineError::OutOfRange { index: 3, len: 1 })
        ));
    }

    #[test]
    fn test_insert_clamps_to_end() {
        let mut buf = LineBuffer::from_str("a\nb\n");
        buf.insert(10, "z\n".to_string());
        assert_eq!(buf.render(), "a\nb\nz\n");
    }

    #[test]
    fn test_line_errors_past_end() {
        let buf = LineBuffer::from_str("a\n");
        assert!(buf.line(0).is_ok());
        assert!(matches!(buf.line(1), Err(LineError::OutOfRange { .. })));
    }
}
