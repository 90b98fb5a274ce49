use thiserror::Error;

use super::{ArrayState, AtomKind, FlavorError, codec::CodecError};
use crate::indexer::IndexerError;
use crate::node::{NodePath, NodePathError};
use crate::storage::StorageError;

/// An array creation error.
#[derive(Clone, Debug, Error)]
pub enum ArrayCreateError {
    /// An invalid node path
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// Storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// Missing metadata.
    #[error("earray metadata is missing at {_0}")]
    MissingMetadata(NodePath),
    /// Metadata that could not be parsed or is inconsistent.
    #[error("invalid earray metadata at {_0}: {_1}")]
    InvalidMetadata(NodePath, String),
    /// The shape does not have exactly one zero-sized (extensible) dimension.
    #[error("invalid shape {_0:?}: exactly one dimension must be zero-sized to mark the extensible dimension")]
    InvalidShape(Vec<u64>),
    /// An invalid atom.
    #[error("invalid atom: {_0}")]
    InvalidAtom(String),
    /// Invalid filters.
    #[error("invalid filters: {_0}")]
    InvalidFilters(String),
    /// An invalid chunk size.
    #[error("invalid chunk size of {_0} rows: must be non-zero")]
    InvalidChunkRows(u64),
    /// A node already exists at the requested path.
    #[error("a node already exists at {_0}")]
    NodeExists(NodePath),
    /// The requested path is inside an earray.
    #[error("cannot create {_0} inside the earray {_1}")]
    InsideEArray(NodePath, NodePath),
    /// An earray exists below the requested path.
    #[error("cannot create {_0}, the earray {_1} is below it")]
    EArrayBelow(NodePath, NodePath),
    /// An array cannot be copied onto itself.
    #[error("cannot copy {_0} onto itself")]
    CopyOntoItself(NodePath),
}

/// Array errors.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ArrayError {
    /// The payload shape does not match the fixed dimensions of the array.
    #[error("{operation} on {path}: data has shape {got:?}, expected {expected}")]
    ShapeMismatch {
        /// The array path.
        path: NodePath,
        /// The failing operation.
        operation: &'static str,
        /// The shape of the supplied data.
        got: Vec<u64>,
        /// A description of the expected shape.
        expected: String,
    },
    /// A malformed or out of range selection.
    #[error("{operation} on {path} with selection {selection}: {source}")]
    IndexError {
        /// The array path.
        path: NodePath,
        /// The failing operation.
        operation: &'static str,
        /// The requested selection.
        selection: String,
        /// The reason the selection could not be resolved.
        source: IndexerError,
    },
    /// A chunk was addressed that has not been written.
    #[error("chunk {index} of {path} was not found (rows {rows:?}, nrows {nrows})")]
    ChunkNotFound {
        /// The array path.
        path: NodePath,
        /// The chunk index.
        index: u64,
        /// The rows held by the chunk.
        rows: std::ops::Range<u64>,
        /// The number of rows in the array.
        nrows: u64,
    },
    /// A filter failed to encode or decode a chunk.
    #[error("filter error on chunk {index} of {path}: {source}")]
    FilterError {
        /// The array path.
        path: NodePath,
        /// The chunk index.
        index: u64,
        /// The codec error.
        source: CodecError,
    },
    /// The array is not open.
    #[error("{operation} on {path} requires an open earray, but it is {state}")]
    InvalidState {
        /// The array path.
        path: NodePath,
        /// The failing operation.
        operation: &'static str,
        /// The state of the array.
        state: ArrayState,
    },
    /// An error creating or opening an array.
    #[error(transparent)]
    ArrayCreateError(#[from] ArrayCreateError),
    /// A store error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// A flavor conversion error.
    #[error(transparent)]
    FlavorError(#[from] FlavorError),
    /// The element type does not match the atom.
    #[error("the element type does not match the atom kind {_0}")]
    IncompatibleElementType(AtomKind),
    /// Bytes with a length that does not match the shape and atom.
    #[error("got {_0} bytes, expected {_1} bytes")]
    InvalidBytesLength(usize, usize),
    /// A value that does not fit in memory on this platform.
    #[error("{_0} does not fit in memory on this platform")]
    SizeOverflow(String),
    /// Any other error.
    #[error("{_0}")]
    Other(String),
}
