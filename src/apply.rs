//! Fix application - runs plans against files under a guarded root.
//!
//! This is the only module that touches the file system. Plans themselves
//! are pure; this layer reads each target once, threads the content through
//! the plan, and writes back atomically only when something changed.

use crate::config::FixConfig;
use crate::fixup::FixOutcome;
use crate::line::LineError;
use crate::plan::FixPlan;
use crate::safety::{RootGuard, SafetyError};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Result of running a single fix.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "FixResult should be checked for applied/skipped"]
pub enum FixResult {
    /// The fix changed its target lines
    Applied { file: PathBuf },
    /// A guard did not match; the target is untouched by this fix
    Skipped { file: PathBuf, reason: String },
}

impl fmt::Display for FixResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixResult::Applied { file } => write!(f, "Applied to {}", file.display()),
            FixResult::Skipped { file, reason } => {
                write!(f, "Skipped on {}: {}", file.display(), reason)
            }
        }
    }
}

/// Errors during fix application
#[derive(Debug)]
pub enum ApplicationError {
    /// File I/O error
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A fixup indexed past the end of the file
    Line { file: PathBuf, source: LineError },
    /// Target path rejected by the root guard
    Safety(SafetyError),
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            ApplicationError::Line { file, source } => {
                write!(f, "line error in {}: {}", file.display(), source)
            }
            ApplicationError::Safety(e) => write!(f, "safety error: {}", e),
        }
    }
}

impl std::error::Error for ApplicationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApplicationError::Io { source, .. } => Some(source),
            ApplicationError::Line { source, .. } => Some(source),
            ApplicationError::Safety(e) => Some(e),
        }
    }
}

impl From<SafetyError> for ApplicationError {
    fn from(e: SafetyError) -> Self {
        ApplicationError::Safety(e)
    }
}

/// Per-fix results, in plan order.
pub type FixReport = Vec<(String, Result<FixResult, ApplicationError>)>;

/// Resolve a config's plans into application-ready target paths.
///
/// With `meta.root_relative` set, relative targets stay as-is and are
/// joined to the fix root when applied. Otherwise targets are taken as
/// written: absolute paths pass through, relative ones resolve against
/// the invoking directory.
pub fn resolve_plans(config: &FixConfig) -> Vec<FixPlan> {
    let mut plans = config.plans();
    if !config.meta.root_relative {
        if let Ok(cwd) = std::env::current_dir() {
            for plan in &mut plans {
                let path = Path::new(&plan.file);
                if !path.is_absolute() {
                    plan.file = cwd.join(path).display().to_string();
                }
            }
        }
    }
    plans
}

/// Apply a fix configuration under `root`.
///
/// Fixes are grouped by target file; each file is read once and its fixes
/// run in definition order against the same buffer. The file is rewritten
/// atomically only when at least one fix changed it.
pub fn apply_fixes(config: &FixConfig, root: &Path) -> FixReport {
    run_plans(&resolve_plans(config), root, true)
}

/// Evaluate a fix configuration without writing anything.
///
/// Result semantics mirror [`apply_fixes`]: `Applied` means "would apply".
pub fn check_fixes(config: &FixConfig, root: &Path) -> FixReport {
    run_plans(&resolve_plans(config), root, false)
}

/// Apply plans directly (used for the built-in plan, which has no config).
pub fn apply_plans(plans: &[FixPlan], root: &Path) -> FixReport {
    run_plans(plans, root, true)
}

/// Read-only counterpart of [`apply_plans`].
pub fn check_plans(plans: &[FixPlan], root: &Path) -> FixReport {
    run_plans(plans, root, false)
}

fn run_plans(plans: &[FixPlan], root: &Path, write: bool) -> FixReport {
    let mut results: FixReport = Vec::new();

    let guard = match RootGuard::new(root) {
        Ok(guard) => guard,
        Err(e) => {
            for plan in plans {
                push_error_for_plan(&mut results, plan, || {
                    ApplicationError::Safety(clone_safety(&e))
                });
            }
            return results;
        }
    };

    for plan in plans {
        let target = match guard.validate_path(&plan.file) {
            Ok(path) => path,
            Err(e) => {
                push_error_for_plan(&mut results, plan, || {
                    ApplicationError::Safety(clone_safety(&e))
                });
                continue;
            }
        };

        let original = match fs::read_to_string(&target) {
            Ok(content) => content,
            Err(source) => {
                let kind = source.kind();
                let msg = source.to_string();
                push_error_for_plan(&mut results, plan, || ApplicationError::Io {
                    path: target.clone(),
                    source: std::io::Error::new(kind, msg.clone()),
                });
                continue;
            }
        };

        let report = match plan.apply_to_string(&original) {
            Ok(report) => report,
            Err(line_err) => {
                push_error_for_plan(&mut results, plan, || ApplicationError::Line {
                    file: target.clone(),
                    source: line_err.clone(),
                });
                continue;
            }
        };

        if write && report.content != original {
            if let Err(source) = write_atomic(&target, report.content.as_bytes()) {
                let kind = source.kind();
                let msg = source.to_string();
                push_error_for_plan(&mut results, plan, || ApplicationError::Io {
                    path: target.clone(),
                    source: std::io::Error::new(kind, msg.clone()),
                });
                continue;
            }
        }

        for (id, outcome) in report.outcomes {
            let result = match outcome {
                FixOutcome::Applied => FixResult::Applied {
                    file: target.clone(),
                },
                FixOutcome::Skipped { reason } => FixResult::Skipped {
                    file: target.clone(),
                    reason,
                },
            };
            results.push((id, Ok(result)));
        }
    }

    results
}

fn push_error_for_plan<F>(results: &mut FixReport, plan: &FixPlan, mut make: F)
where
    F: FnMut() -> ApplicationError,
{
    for step in &plan.steps {
        results.push((step.id.clone(), Err(make())));
    }
}

/// `SafetyError` holds an `io::Error` in one variant, so replicating it per
/// fix rebuilds that variant from its kind and message.
fn clone_safety(e: &SafetyError) -> SafetyError {
    match e {
        SafetyError::OutsideRoot { path, root } => SafetyError::OutsideRoot {
            path: path.clone(),
            root: root.clone(),
        },
        SafetyError::ForbiddenPath { path, forbidden } => SafetyError::ForbiddenPath {
            path: path.clone(),
            forbidden: forbidden.clone(),
        },
        SafetyError::Canonicalize(io) => {
            SafetyError::Canonicalize(std::io::Error::new(io.kind(), io.to_string()))
        }
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or the original file is untouched. The
/// mtime bump afterwards makes sure file watchers on the target (nodemon
/// and friends) notice the change.
fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Path has no parent directory",
        )
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    filetime::set_file_mtime(path, filetime::FileTime::now())?;

    Ok(())
}
