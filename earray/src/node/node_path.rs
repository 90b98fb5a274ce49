use derive_more::Display;
use thiserror::Error;

use crate::storage::StorePrefix;

/// A node path.
///
/// A valid node path starts with `/`, has no trailing `/` (except for the root path `/`), and has no empty, `.` or `..` components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("{}", _0)]
pub struct NodePath(String);

/// An invalid node path.
#[derive(Clone, Debug, Error)]
#[error("invalid node path {0}")]
pub struct NodePathError(String);

impl NodePath {
    /// Create a new node path from `path`.
    ///
    /// # Errors
    /// Returns [`NodePathError`] if `path` is not valid.
    pub fn new(path: &str) -> Result<Self, NodePathError> {
        if Self::validate(path) {
            Ok(Self(path.to_string()))
        } else {
            Err(NodePathError(path.to_string()))
        }
    }

    /// The root node path `/`.
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Extracts a string slice of the underlying path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validates a path.
    #[must_use]
    pub fn validate(path: &str) -> bool {
        if path == "/" {
            return true;
        }
        let Some(components) = path.strip_prefix('/') else {
            return false;
        };
        components
            .split('/')
            .all(|component| !component.is_empty() && component != "." && component != "..")
    }

    /// Return the name of the node, the last component of the path.
    ///
    /// The root node has an empty name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// Return the parent of the node, or [`None`] for the root node.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0 == "/" {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) | None => Some(Self::root()),
            Some(end) => Some(Self(self.0[..end].to_string())),
        }
    }

    /// Return the ancestors of the node, nearest first and ending at the root.
    pub fn ancestors(&self) -> impl Iterator<Item = NodePath> + use<> {
        std::iter::successors(self.parent(), Self::parent)
    }
}

impl TryFrom<&str> for NodePath {
    type Error = NodePathError;

    fn try_from(path: &str) -> Result<Self, Self::Error> {
        Self::new(path)
    }
}

impl From<&NodePath> for StorePrefix {
    fn from(path: &NodePath) -> Self {
        let path = path.as_str();
        if path == "/" {
            StorePrefix::root()
        } else {
            // SAFETY: the components of a valid node path are non-empty
            unsafe {
                StorePrefix::new_unchecked(format!("{}/", path.strip_prefix('/').unwrap_or(path)))
            }
        }
    }
}
