use crate::fixup::{Fixup, LineGuard};
use crate::plan::{FixPlan, PlanStep};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct FixConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub fixes: Vec<FixDefinition>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Resolve relative target paths against the root (instead of the
    /// invoking directory)
    #[serde(default)]
    pub root_relative: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FixDefinition {
    pub id: String,
    /// Target file; relative paths resolve per `meta.root_relative`
    pub file: String,
    pub op: FixOp,
}

/// Guards take one of two forms per line: a `*_contains` marker substring,
/// or a `*_exact` full-line match (terminator included; lowered to an xxh3
/// hash guard for lines over 1KB). Exactly one must be given.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FixOp {
    /// Exchange two lines when both guards hold
    SwapPair {
        first: usize,
        second: usize,
        #[serde(default)]
        first_contains: Option<String>,
        #[serde(default)]
        first_exact: Option<String>,
        #[serde(default)]
        second_contains: Option<String>,
        #[serde(default)]
        second_exact: Option<String>,
    },
    /// Move the first guarded line in [window_start, window_end) to the
    /// post-removal index `dest`
    Relocate {
        window_start: usize,
        window_end: usize,
        #[serde(default)]
        contains: Option<String>,
        #[serde(default)]
        exact: Option<String>,
        dest: usize,
    },
}

impl fmt::Display for FixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixOp::SwapPair { first, second, .. } => {
                write!(f, "swap-pair {first} <-> {second}")
            }
            FixOp::Relocate {
                window_start,
                window_end,
                dest,
                ..
            } => write!(f, "relocate [{window_start}, {window_end}) -> {dest}"),
        }
    }
}

/// Lower a validated guard pair to a [`LineGuard`]. Exact guards go through
/// [`LineGuard::from_text`], so long lines become hash guards.
fn lower_guard(contains: &Option<String>, exact: &Option<String>) -> LineGuard {
    match (contains, exact) {
        (_, Some(text)) => LineGuard::from_text(text),
        (Some(needle), None) => LineGuard::Contains(needle.clone()),
        (None, None) => LineGuard::Contains(String::new()),
    }
}

impl FixDefinition {
    /// Lower the definition to an executable fixup.
    pub fn to_fixup(&self) -> Fixup {
        match &self.op {
            FixOp::SwapPair {
                first,
                second,
                first_contains,
                first_exact,
                second_contains,
                second_exact,
            } => Fixup::SwapPair {
                first: *first,
                second: *second,
                first_guard: lower_guard(first_contains, first_exact),
                second_guard: lower_guard(second_contains, second_exact),
            },
            FixOp::Relocate {
                window_start,
                window_end,
                contains,
                exact,
                dest,
            } => Fixup::Relocate {
                window: *window_start..*window_end,
                guard: lower_guard(contains, exact),
                dest: *dest,
            },
        }
    }
}

impl FixConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.fixes.is_empty() {
            issues.push(ValidationIssue::EmptyFixList);
        }

        for fix in &self.fixes {
            if fix.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    fix_id: None,
                    field: "id",
                });
            }
            if fix.file.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    fix_id: Some(fix.id.clone()),
                    field: "file",
                });
            }

            match &fix.op {
                FixOp::SwapPair {
                    first,
                    second,
                    first_contains,
                    first_exact,
                    second_contains,
                    second_exact,
                } => {
                    check_guard(
                        &mut issues,
                        &fix.id,
                        first_contains,
                        first_exact,
                        "op.first_contains",
                        "op.first_exact",
                    );
                    check_guard(
                        &mut issues,
                        &fix.id,
                        second_contains,
                        second_exact,
                        "op.second_contains",
                        "op.second_exact",
                    );
                    if first >= second {
                        issues.push(ValidationIssue::InvalidCombo {
                            fix_id: Some(fix.id.clone()),
                            message: format!(
                                "swap-pair requires first < second (got {first} and {second})"
                            ),
                        });
                    }
                }
                FixOp::Relocate {
                    window_start,
                    window_end,
                    contains,
                    exact,
                    ..
                } => {
                    check_guard(
                        &mut issues,
                        &fix.id,
                        contains,
                        exact,
                        "op.contains",
                        "op.exact",
                    );
                    if window_start >= window_end {
                        issues.push(ValidationIssue::InvalidCombo {
                            fix_id: Some(fix.id.clone()),
                            message: format!(
                                "relocate window is empty ([{window_start}, {window_end}))"
                            ),
                        });
                    }
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Group fixes into per-file plans, preserving first-seen file order and
    /// fix order within each file.
    pub fn plans(&self) -> Vec<FixPlan> {
        let mut plans: Vec<FixPlan> = Vec::new();

        for fix in &self.fixes {
            let step = PlanStep {
                id: fix.id.clone(),
                fixup: fix.to_fixup(),
            };
            match plans.iter_mut().find(|p| p.file == fix.file) {
                Some(plan) => plan.steps.push(step),
                None => plans.push(FixPlan {
                    file: fix.file.clone(),
                    steps: vec![step],
                }),
            }
        }

        plans
    }
}

/// One guard per line: exactly one of the contains/exact fields, non-empty.
fn check_guard(
    issues: &mut Vec<ValidationIssue>,
    fix_id: &str,
    contains: &Option<String>,
    exact: &Option<String>,
    contains_field: &'static str,
    exact_field: &'static str,
) {
    match (contains, exact) {
        (Some(_), Some(_)) => issues.push(ValidationIssue::InvalidCombo {
            fix_id: Some(fix_id.to_string()),
            message: format!("only one of '{contains_field}' and '{exact_field}' is allowed"),
        }),
        (None, None) => issues.push(ValidationIssue::InvalidCombo {
            fix_id: Some(fix_id.to_string()),
            message: format!("one of '{contains_field}' and '{exact_field}' is required"),
        }),
        (Some(needle), None) if needle.is_empty() => {
            issues.push(ValidationIssue::MissingField {
                fix_id: Some(fix_id.to_string()),
                field: contains_field,
            });
        }
        (None, Some(text)) if text.is_empty() => issues.push(ValidationIssue::MissingField {
            fix_id: Some(fix_id.to_string()),
            field: exact_field,
        }),
        _ => {}
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyFixList,
    MissingField {
        fix_id: Option<String>,
        field: &'static str,
    },
    InvalidCombo {
        fix_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyFixList => write!(f, "fix config contains no fixes"),
            ValidationIssue::MissingField { fix_id, field } => match fix_id {
                Some(id) => write!(f, "fix '{id}' missing required field '{field}'"),
                None => write!(f, "fix missing required field '{field}'"),
            },
            ValidationIssue::InvalidCombo { fix_id, message } => match fix_id {
                Some(id) => write!(f, "fix '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid fix configuration: {message}"),
            },
        }
    }
}
