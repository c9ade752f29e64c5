//! Working-directory confinement for all filesystem access.
//!
//! Every tool resolves model-supplied paths through [`WorkingRoot::resolve`];
//! no other code in the crate touches the filesystem with an unchecked path.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("cannot access \"{}\" as it is outside the permitted working directory", .0.display())]
    Confinement(PathBuf),

    #[error("working directory \"{}\" is not usable: {1}", .0.display())]
    BadRoot(PathBuf, #[source] std::io::Error),
}

/// The single directory all sandboxed operations are confined to.
///
/// Established once per agent session and immutable afterwards. Passed
/// explicitly into every tool invocation so the boundary stays visible and
/// testable; there is no ambient/global working directory anywhere.
#[derive(Debug, Clone)]
pub struct WorkingRoot(PathBuf);

impl WorkingRoot {
    /// Canonicalize `path` and use it as the sandbox root.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, SandboxError> {
        let path = path.as_ref();
        let root = path
            .canonicalize()
            .map_err(|e| SandboxError::BadRoot(path.to_path_buf(), e))?;
        Ok(Self(root))
    }

    /// The absolute root path.
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Resolve a model-supplied path against the root.
    ///
    /// The candidate is joined onto the root (an absolute input replaces the
    /// join base and must still land inside), then `.`/`..` segments are
    /// collapsed lexically without consulting the filesystem. Containment
    /// requires the root's components to be an ordered prefix of the
    /// result's components: a sibling such as `/workshop` is not inside
    /// `/work` even though the raw strings share a prefix.
    pub fn resolve(&self, supplied: &str) -> Result<PathBuf, SandboxError> {
        let candidate = normalize(&self.0.join(supplied));
        if contains(&self.0, &candidate) {
            Ok(candidate)
        } else {
            Err(SandboxError::Confinement(candidate))
        }
    }
}

/// Lexically collapse `.` and `..` segments. `..` at the filesystem root
/// stays at the root, matching OS path resolution.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Full-segment prefix check: every component of `root`, in order, must
/// match the head of `candidate`'s components.
fn contains(root: &Path, candidate: &Path) -> bool {
    let mut parts = candidate.components();
    root.components().all(|r| parts.next() == Some(r))
}
