//! Fix plans: named fixups applied in order to a single file's lines.
//!
//! A plan is the pure core of the tool. It never touches the file system;
//! it takes file content in and hands the transformed content back together
//! with a per-step outcome, so every step is independently observable and
//! the two built-in route fixes can be tested without a real server tree.

use crate::fixup::{FixOutcome, Fixup, LineGuard};
use crate::line::{LineBuffer, LineError};

/// Default target of the built-in plan, relative to the root.
pub const DEFAULT_TARGET: &str = "index.js";

/// One named step in a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    pub id: String,
    pub fixup: Fixup,
}

/// An ordered list of fixups for one target file.
///
/// Steps run sequentially against the same buffer, so a later step sees the
/// shifts an earlier step introduced. Order matters and is part of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixPlan {
    /// Target file, resolved against the root when relative
    pub file: String,
    pub steps: Vec<PlanStep>,
}

/// Result of running a plan against file content.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "ApplyReport should be checked for outcomes"]
pub struct ApplyReport {
    /// Transformed content (possibly identical to the input)
    pub content: String,
    /// Per-step outcome, in plan order
    pub outcomes: Vec<(String, FixOutcome)>,
}

impl ApplyReport {
    /// True if at least one step applied.
    pub fn any_applied(&self) -> bool {
        self.outcomes.iter().any(|(_, o)| o.is_applied())
    }
}

impl FixPlan {
    /// The built-in route fixes for a generated Express `index.js`.
    ///
    /// Two edits near the movie and episode route handlers:
    /// - `movie-route-order`: the entry-type lookup at line 303 runs before
    ///   the slug it needs is resolved at line 304; swap the two lines when
    ///   both markers are present.
    /// - `episode-route-decl`: the `const actualSlug` declaration sits inside
    ///   the window 315..320 ahead of the destructuring it depends on; move
    ///   it down to line 317.
    pub fn builtin() -> Self {
        FixPlan {
            file: DEFAULT_TARGET.to_string(),
            steps: vec![
                PlanStep {
                    id: "movie-route-order".to_string(),
                    fixup: Fixup::SwapPair {
                        first: 303,
                        second: 304,
                        first_guard: LineGuard::Contains(
                            "detectEntryType(actualSlug)".to_string(),
                        ),
                        second_guard: LineGuard::Contains("findActualSlug".to_string()),
                    },
                },
                PlanStep {
                    id: "episode-route-decl".to_string(),
                    fixup: Fixup::Relocate {
                        window: 315..320,
                        guard: LineGuard::Contains("const actualSlug".to_string()),
                        dest: 317,
                    },
                },
            ],
        }
    }

    /// Run every step in order against `content`.
    ///
    /// The first out-of-range index aborts the whole plan; earlier steps'
    /// changes are discarded because nothing has been written anywhere.
    pub fn apply_to_string(&self, content: &str) -> Result<ApplyReport, LineError> {
        let mut buf = LineBuffer::from_str(content);
        let mut outcomes = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            let outcome = step.fixup.apply(&mut buf)?;
            outcomes.push((step.id.clone(), outcome));
        }

        Ok(ApplyReport {
            content: buf.render(),
            outcomes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_run_in_order_on_the_same_buffer() {
        // The relocate window only contains its marker after the swap has
        // moved it, so outcome depends on step order.
        let content = "marker\nplain\nother\n";
        let plan = FixPlan {
            file: "t.txt".to_string(),
            steps: vec![
                PlanStep {
                    id: "swap".to_string(),
                    fixup: Fixup::SwapPair {
                        first: 0,
                        second: 2,
                        first_guard: LineGuard::Contains("marker".to_string()),
                        second_guard: LineGuard::Contains("other".to_string()),
                    },
                },
                PlanStep {
                    id: "move".to_string(),
                    fixup: Fixup::Relocate {
                        window: 2..3,
                        guard: LineGuard::Contains("marker".to_string()),
                        dest: 0,
                    },
                },
            ],
        };

        let report = plan.apply_to_string(content).unwrap();
        assert!(report.outcomes.iter().all(|(_, o)| o.is_applied()));
        assert_eq!(report.content, "marker\nother\nplain\n");
    }

    #[test]
    fn test_out_of_range_aborts_plan() {
        let plan = FixPlan::builtin();
        // Far fewer than 305 lines.
        let result = plan.apply_to_string("a\nb\nc\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_all_skipped_leaves_content_identical() {
        let content: String = (0..400).map(|i| format!("line {i}\n")).collect();
        let report = FixPlan::builtin().apply_to_string(&content).unwrap();
        assert!(!report.any_applied());
        assert_eq!(report.content, content);
    }

    #[test]
    fn test_builtin_targets_index_js() {
        assert_eq!(FixPlan::builtin().file, "index.js");
        assert_eq!(FixPlan::builtin().steps.len(), 2);
    }
}
