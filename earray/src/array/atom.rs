use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::ArrayCreateError;

/// The kind of element held by an [`Atom`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AtomKind {
    /// A boolean stored as one byte.
    #[display("bool")]
    Bool,
    /// A signed 8-bit integer.
    #[display("int8")]
    Int8,
    /// A signed 16-bit integer.
    #[display("int16")]
    Int16,
    /// A signed 32-bit integer.
    #[display("int32")]
    Int32,
    /// A signed 64-bit integer.
    #[display("int64")]
    Int64,
    /// An unsigned 8-bit integer.
    #[display("uint8")]
    UInt8,
    /// An unsigned 16-bit integer.
    #[display("uint16")]
    UInt16,
    /// An unsigned 32-bit integer.
    #[display("uint32")]
    UInt32,
    /// An unsigned 64-bit integer.
    #[display("uint64")]
    UInt64,
    /// A 32-bit float.
    #[display("float32")]
    Float32,
    /// A 64-bit float.
    #[display("float64")]
    Float64,
    /// A complex number of two 32-bit floats.
    #[display("complex64")]
    Complex64,
    /// A complex number of two 64-bit floats.
    #[display("complex128")]
    Complex128,
    /// A fixed-length byte string, NUL padded.
    #[display("string{length}")]
    String {
        /// The length of the string in bytes.
        length: usize,
    },
}

impl AtomKind {
    /// Return the size in bytes of one element of this kind.
    #[must_use]
    pub const fn item_size(&self) -> usize {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 | Self::Complex64 => 8,
            Self::Complex128 => 16,
            Self::String { length } => *length,
        }
    }
}

/// An element descriptor.
///
/// An atom is an [`AtomKind`] and an optional embedded per-element shape.
/// The embedded shape is appended to the declared shape of an array, so an array of shape `(0, 2)` with an atom of shape `(3,)` has a logical shape of `(nrows, 2, 3)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Atom {
    #[serde(flatten)]
    kind: AtomKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    shape: Vec<u64>,
}

impl Atom {
    /// Create a new scalar atom of `kind`.
    #[must_use]
    pub const fn new(kind: AtomKind) -> Self {
        Self {
            kind,
            shape: Vec::new(),
        }
    }

    /// Create a new fixed-length string atom.
    #[must_use]
    pub const fn string(length: usize) -> Self {
        Self::new(AtomKind::String { length })
    }

    /// Set the embedded per-element shape.
    #[must_use]
    pub fn with_shape(mut self, shape: Vec<u64>) -> Self {
        self.shape = shape;
        self
    }

    /// Return the atom kind.
    #[must_use]
    pub const fn kind(&self) -> &AtomKind {
        &self.kind
    }

    /// Return the embedded per-element shape.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the size in bytes of one item.
    #[must_use]
    pub const fn item_size(&self) -> usize {
        self.kind.item_size()
    }

    /// Validate the atom.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError::InvalidAtom`] if the string length or an embedded dimension is zero.
    pub fn validate(&self) -> Result<(), ArrayCreateError> {
        if self.item_size() == 0 {
            return Err(ArrayCreateError::InvalidAtom(format!(
                "{} has a zero item size",
                self.kind
            )));
        }
        if self.shape.contains(&0) {
            return Err(ArrayCreateError::InvalidAtom(format!(
                "embedded shape {:?} has a zero-sized dimension",
                self.shape
            )));
        }
        Ok(())
    }
}

impl From<AtomKind> for Atom {
    fn from(kind: AtomKind) -> Self {
        Self::new(kind)
    }
}
