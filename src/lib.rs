//! Linefix: guarded line-level fixups for generated server code
//!
//! A small patching tool built on one primitive: a guarded positional edit
//! over an ordered [`LineBuffer`]. The two operation kinds - a conditional
//! pairwise swap and a scan-remove-reinsert relocation - are pure
//! transformations; file I/O lives at the edges.
//!
//! # Architecture
//!
//! A [`FixPlan`] threads a file's lines through its fixups in order and
//! reports an explicit per-step outcome, so a guard that fails to match is
//! visible as a skip rather than disguised as success. Fix definitions can
//! be loaded from TOML, or the built-in route-fix plan can run directly.
//!
//! # Safety
//!
//! - Out-of-range line indices are errors, never silent truncation
//! - Atomic file writes (tempfile + fsync + rename)
//! - Target paths are confined to the root (no `node_modules/`, no `.git/`)
//!
//! # Example
//!
//! ```
//! use linefix::FixPlan;
//!
//! let content: String = (0..400).map(|i| format!("line {i}\n")).collect();
//! let report = FixPlan::builtin().apply_to_string(&content).unwrap();
//!
//! // No marker lines present: both fixes skip and the content is unchanged.
//! assert!(!report.any_applied());
//! assert_eq!(report.content, content);
//! ```

pub mod apply;
pub mod config;
pub mod fixup;
pub mod line;
pub mod plan;
pub mod safety;

// Re-exports
pub use apply::{
    apply_fixes, apply_plans, check_fixes, check_plans, resolve_plans, ApplicationError, FixReport,
    FixResult,
};
pub use config::{load_from_path, load_from_str, ConfigError, FixConfig, FixDefinition, FixOp};
pub use fixup::{FixOutcome, Fixup, LineGuard};
pub use line::{LineBuffer, LineError};
pub use plan::{ApplyReport, FixPlan, PlanStep};
pub use safety::{RootGuard, SafetyError};
