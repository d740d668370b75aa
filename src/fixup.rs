use crate::line::{LineBuffer, LineError};
use std::fmt;
use std::ops::Range;
use xxhash_rust::xxh3::xxh3_64;

/// Precondition on a single line before a mutation is allowed.
///
/// Guards are weak by design: a substring check, an exact comparison, or an
/// xxh3 hash of the whole line (faster for very long lines). A failing guard
/// is never an error; it means the fixup does not apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineGuard {
    /// Line must contain this substring
    Contains(String),
    /// Line must match exactly, terminator included
    Exact(String),
    /// xxh3 hash of the full line must match
    Hash(u64),
}

impl LineGuard {
    /// Check if a line satisfies the guard.
    pub fn matches(&self, line: &str) -> bool {
        match self {
            LineGuard::Contains(needle) => line.contains(needle),
            LineGuard::Exact(expected) => line == expected,
            LineGuard::Hash(expected) => xxh3_64(line.as_bytes()) == *expected,
        }
    }

    /// Exact-match guard from text, switching to a hash for lines over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            LineGuard::Hash(xxh3_64(text.as_bytes()))
        } else {
            LineGuard::Exact(text.to_string())
        }
    }
}

impl fmt::Display for LineGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineGuard::Contains(needle) => write!(f, "contains {needle:?}"),
            LineGuard::Exact(expected) => write!(f, "equals {expected:?}"),
            LineGuard::Hash(hash) => write!(f, "xxh3 {hash:#018x}"),
        }
    }
}

/// Outcome of one fixup step.
///
/// A skipped step left the buffer untouched; callers can report the reason
/// instead of conflating it with success.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "FixOutcome should be checked for applied/skipped"]
pub enum FixOutcome {
    Applied,
    Skipped { reason: String },
}

impl FixOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FixOutcome::Applied)
    }
}

impl fmt::Display for FixOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixOutcome::Applied => write!(f, "applied"),
            FixOutcome::Skipped { reason } => write!(f, "skipped: {reason}"),
        }
    }
}

/// A single guarded positional edit.
///
/// These are the only two operation kinds: a conditional pairwise swap and a
/// scan-remove-reinsert relocation. Both are keyed on fixed line indices with
/// guard substrings as the precondition, and both are pure transformations of
/// a [`LineBuffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fixup {
    /// Exchange the contents of two positions when both guards hold.
    SwapPair {
        first: usize,
        second: usize,
        first_guard: LineGuard,
        second_guard: LineGuard,
    },
    /// Scan `window` in increasing order; remove the first line matching
    /// `guard` and re-insert it at `dest`.
    ///
    /// `dest` is measured after the removal shift, so the destination is an
    /// absolute post-removal index rather than a position relative to where
    /// the line was found.
    Relocate {
        window: Range<usize>,
        guard: LineGuard,
        dest: usize,
    },
}

impl Fixup {
    /// Apply the fixup to `buf`.
    ///
    /// An index that falls outside the buffer is an error and propagates; a
    /// guard that fails to match is a [`FixOutcome::Skipped`]. The relocation
    /// scan indexes lazily, so a window that runs past the end of the buffer
    /// only errors if no earlier position matched.
    pub fn apply(&self, buf: &mut LineBuffer) -> Result<FixOutcome, LineError> {
        match self {
            Fixup::SwapPair {
                first,
                second,
                first_guard,
                second_guard,
            } => {
                let first_ok = first_guard.matches(buf.line(*first)?);
                let second_ok = second_guard.matches(buf.line(*second)?);
                if !(first_ok && second_ok) {
                    return Ok(FixOutcome::Skipped {
                        reason: format!("guards did not match lines {first} and {second}"),
                    });
                }
                buf.swap(*first, *second)?;
                Ok(FixOutcome::Applied)
            }
            Fixup::Relocate { window, guard, dest } => {
                for index in window.clone() {
                    let matched = guard.matches(buf.line(index)?);
                    if matched {
                        let taken = buf.remove(index)?;
                        buf.insert(*dest, taken);
                        return Ok(FixOutcome::Applied);
                    }
                }
                Ok(FixOutcome::Skipped {
                    reason: format!(
                        "no line in [{}, {}) matched guard ({guard})",
                        window.start, window.end
                    ),
                })
            }
        }
    }
}

impl fmt::Display for Fixup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fixup::SwapPair { first, second, .. } => {
                write!(f, "swap-pair {first} <-> {second}")
            }
            Fixup::Relocate { window, dest, .. } => {
                write!(f, "relocate [{}, {}) -> {dest}", window.start, window.end)
            }
        }
    }
}
