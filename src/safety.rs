use std::path::{Path, PathBuf};
use thiserror::Error;

/// Path safety checks to keep fixups confined to the target tree.
#[derive(Debug, Clone)]
pub struct RootGuard {
    /// Absolute path to the target root
    root: PathBuf,
    /// Canonical paths that must never be edited
    forbidden_paths: Vec<PathBuf>,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Path is outside target root: {path} (root: {root})")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("Path is in forbidden directory: {path} (forbidden: {forbidden})")]
    ForbiddenPath { path: PathBuf, forbidden: PathBuf },

    #[error("Failed to canonicalize path: {0}")]
    Canonicalize(#[from] std::io::Error),
}

impl RootGuard {
    /// Create a guard for the given root.
    ///
    /// The root is canonicalized to handle symlinks correctly. Vendored and
    /// VCS trees under the root are forbidden: the tool fixes generated
    /// server sources, never dependencies or repository metadata.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let root = root.as_ref().canonicalize()?;

        let mut forbidden_paths = Vec::new();
        for name in ["node_modules", ".git"] {
            if let Ok(dir) = root.join(name).canonicalize() {
                forbidden_paths.push(dir);
            }
        }

        Ok(Self {
            root,
            forbidden_paths,
        })
    }

    /// Check if a path is safe to edit.
    ///
    /// Relative paths resolve against the root. Returns the canonicalized
    /// absolute path if safe.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let path = path.as_ref();

        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        // Canonicalize to resolve symlinks and .. components
        let canonical = absolute.canonicalize()?;

        if !canonical.starts_with(&self.root) {
            return Err(SafetyError::OutsideRoot {
                path: canonical,
                root: self.root.clone(),
            });
        }

        for forbidden in &self.forbidden_paths {
            if canonical.starts_with(forbidden) {
                return Err(SafetyError::ForbiddenPath {
                    path: canonical,
                    forbidden: forbidden.clone(),
                });
            }
        }

        Ok(canonical)
    }

    /// Get the target root.
    pub fn root(&self) -> &Path {
        &self.root
    }
}
