use serde::{Deserialize, Serialize};

use super::{ArrayCreateError, Atom, Filters, Flavor, array_data::num_elements};
use crate::node::NodePath;

/// The node type recorded in earray metadata.
pub const EARRAY_NODE_TYPE: &str = "earray";

/// The byte order of elements written by this build.
#[must_use]
pub const fn native_byteorder() -> &'static str {
    if cfg!(target_endian = "little") {
        "little"
    } else {
        "big"
    }
}

fn default_byteorder() -> String {
    native_byteorder().to_string()
}

/// Earray metadata.
///
/// The metadata is stored as pretty JSON at `{path}/.earray`, for example
/// ```json
/// {
///   "node_type": "earray",
///   "shape": [0, 3],
///   "extdim": 0,
///   "nrows": 10,
///   "atom": { "kind": "int32" },
///   "chunk_rows": 2730,
///   "filters": { "complevel": 0, "complib": "zlib", "shuffle": true, "fletcher32": false },
///   "flavor": "native",
///   "byteorder": "little"
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EArrayMetadata {
    /// Always `earray`.
    pub node_type: String,
    /// The declared shape, zero along the extensible dimension.
    pub shape: Vec<u64>,
    /// The extensible dimension.
    pub extdim: usize,
    /// The number of rows along the extensible dimension.
    pub nrows: u64,
    /// The atom.
    pub atom: Atom,
    /// The number of rows per chunk.
    pub chunk_rows: u64,
    /// The filters.
    pub filters: Filters,
    /// The flavor of flavored reads.
    #[serde(default)]
    pub flavor: Flavor,
    /// The title.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// The byte order of the stored elements.
    #[serde(default = "default_byteorder")]
    pub byteorder: String,
}

impl EArrayMetadata {
    /// Return the logical shape: the declared shape with `nrows` at the extensible dimension, followed by the atom shape.
    #[must_use]
    pub fn logical_shape(&self) -> Vec<u64> {
        let mut shape = self.shape.clone();
        if let Some(len) = shape.get_mut(self.extdim) {
            *len = self.nrows;
        }
        shape.extend_from_slice(self.atom.shape());
        shape
    }

    /// Return the number of elements in one row (one index along the extensible dimension).
    #[must_use]
    pub fn row_elements(&self) -> u64 {
        self.shape
            .iter()
            .enumerate()
            .filter(|&(axis, _)| axis != self.extdim)
            .map(|(_, &len)| len)
            .chain(self.atom.shape().iter().copied())
            .product()
    }

    /// Return the number of bytes in one row.
    #[must_use]
    pub fn row_bytes(&self) -> u64 {
        self.row_elements() * self.atom.item_size() as u64
    }

    /// Validate the metadata read from `path`.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError::InvalidMetadata`] if the metadata is inconsistent or was written with a different byte order.
    pub fn validate(&self, path: &NodePath) -> Result<(), ArrayCreateError> {
        let invalid = |reason: String| Err(ArrayCreateError::InvalidMetadata(path.clone(), reason));
        if self.node_type != EARRAY_NODE_TYPE {
            return invalid(format!("node type {} is not {EARRAY_NODE_TYPE}", self.node_type));
        }
        if self.shape.get(self.extdim) != Some(&0) {
            return invalid(format!(
                "extensible dimension {} is not zero-sized in shape {:?}",
                self.extdim, self.shape
            ));
        }
        if self.chunk_rows == 0 {
            return invalid("chunk_rows is zero".to_string());
        }
        if self.byteorder != native_byteorder() {
            return invalid(format!(
                "byte order {} differs from the native byte order {}",
                self.byteorder,
                native_byteorder()
            ));
        }
        self.atom.validate()?;
        let mut row_shape = self.logical_shape();
        row_shape[self.extdim] = 1;
        num_elements(&row_shape)
            .ok()
            .and_then(|n| n.checked_mul(self.atom.item_size() as u64))
            .map_or_else(|| invalid(format!("row shape {row_shape:?} overflows")), |_| Ok(()))
    }

    /// Serialise as pretty JSON.
    ///
    /// # Errors
    /// Returns a [`serde_json::Error`] if serialisation fails.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    /// Parse from JSON stored at `path`.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError::InvalidMetadata`] if the JSON is not valid metadata.
    pub fn from_json(path: &NodePath, json: &[u8]) -> Result<Self, ArrayCreateError> {
        let metadata: Self = serde_json::from_slice(json)
            .map_err(|err| ArrayCreateError::InvalidMetadata(path.clone(), err.to_string()))?;
        metadata.validate(path)?;
        Ok(metadata)
    }
}
