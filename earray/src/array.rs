//! Extensible arrays.
//!
//! An extensible array ([`EArray`]) is a chunked N-dimensional array with exactly one extensible dimension.
//! The extensible dimension has zero size on creation and grows by [appending](EArray::append) rows.
//! It shrinks only by explicit [truncation](EArray::truncate).
//!
//! Rows are stored in chunks of [`chunk_rows`](EArray::chunk_rows) rows along the extensible dimension.
//! Each chunk passes through a [`FilterPipeline`] configured by the [`Filters`] of the array.
//!
//! Use [`ArrayBuilder`] to create a new array and [`EArray::open`] to open an existing one.
//! The [`File`](crate::file::File) container wraps these with open modes.
//!
//! ## Reading
//! There are two distinct call shapes for reading:
//!  - [`EArray::read`] takes a [`RowRange`] over the extensible dimension, where a `None` stop selects a single row, and
//!  - [`EArray::get_item`] takes per-axis [`AxisSelector`](crate::indexer::AxisSelector)s with NumPy slicing semantics.
//!
//! Reads return [`ArrayData`], which can be converted to elements, an [`ndarray`] array, or the [`Flavor`] of the array.
//!
//! ## Writing
//! [`EArray::append`] and [`EArray::set_item`] accept any [`IntoArrayData`].
//! The last chunk is buffered in memory until it is completed, so call [`EArray::flush`] or [`EArray::close`] to store it along with the metadata.

mod array_builder;
mod array_copy;
mod array_data;
mod array_errors;
mod array_sync_readable;
mod array_sync_writable;
mod atom;
mod chunk_store;
mod element;
mod filter_pipeline;
mod filters;
mod flavor;
mod into_array_data;
mod metadata;
mod read_options;
mod row_iterator;

pub mod codec;

use std::sync::Arc;

use derive_more::Display;

pub use self::array_builder::{ArrayBuilder, DEFAULT_EXPECTED_ROWS, compute_chunk_rows};
pub use self::array_copy::CopyOptions;
pub use self::array_data::ArrayData;
pub use self::array_errors::{ArrayCreateError, ArrayError};
pub use self::atom::{Atom, AtomKind};
pub use self::chunk_store::ChunkStore;
pub use self::element::Element;
pub use self::filter_pipeline::FilterPipeline;
pub use self::filters::{Complib, Filters};
#[cfg(feature = "ndarray")]
pub use self::flavor::NdArray;
pub use self::flavor::{
    Flavor, FlavorError, FlavoredData, NestedValue, Scalar, checked_cast, checked_cast_value,
};
pub use self::into_array_data::IntoArrayData;
pub use self::metadata::{EARRAY_NODE_TYPE, EArrayMetadata, native_byteorder};
pub use self::read_options::{DEFAULT_BUFFER_BYTES, ReadOptions};
pub use self::row_iterator::RowIterator;
pub use crate::indexer::RowRange;

use crate::indexer::{IndexerError, ShapeIndexer};
use crate::node::NodePath;

/// The lifecycle state of an [`EArray`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum ArrayState {
    /// Built but its metadata has not been stored.
    #[display("uninitialized")]
    Uninitialized,
    /// Open for reading and writing.
    #[display("open")]
    Open,
    /// Closed. Every operation fails.
    #[display("closed")]
    Closed,
}

/// An extensible array.
///
/// An [`EArray`] owns the chunks of one array node in a store.
/// Operations that change the array take `&mut self` and there is no internal locking.
/// Handles onto the same node must be serialised by the caller.
#[derive(Debug)]
pub struct EArray<TStorage: ?Sized> {
    /// The storage (including storage transformers).
    storage: Arc<TStorage>,
    /// The path of the array in the store.
    path: NodePath,
    /// The metadata, with `nrows` kept in sync with the chunk store.
    metadata: EArrayMetadata,
    /// The chunks.
    chunk_store: ChunkStore<TStorage>,
    state: ArrayState,
    read_only: bool,
}

impl<TStorage: ?Sized> EArray<TStorage> {
    /// Create an array in `storage` at `path` with `metadata`.
    ///
    /// This does not read or write to the store.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError::InvalidMetadata`] if the metadata is invalid.
    pub fn new_with_metadata(
        storage: Arc<TStorage>,
        path: NodePath,
        metadata: EArrayMetadata,
        state: ArrayState,
    ) -> Result<Self, ArrayCreateError> {
        metadata.validate(&path)?;
        let row_bytes = usize::try_from(metadata.row_bytes()).map_err(|_| {
            ArrayCreateError::InvalidMetadata(
                path.clone(),
                format!("rows of {} bytes do not fit in memory", metadata.row_bytes()),
            )
        })?;
        let pipeline =
            FilterPipeline::from_filters(&metadata.filters, metadata.atom.kind().item_size());
        let chunk_store = ChunkStore::new(
            storage.clone(),
            path.clone(),
            metadata.chunk_rows,
            row_bytes,
            pipeline,
            metadata.nrows,
        );
        Ok(Self {
            storage,
            path,
            metadata,
            chunk_store,
            state,
            read_only: false,
        })
    }

    /// Return the path of the array.
    #[must_use]
    pub const fn path(&self) -> &NodePath {
        &self.path
    }

    /// Return the metadata.
    #[must_use]
    pub const fn metadata(&self) -> &EArrayMetadata {
        &self.metadata
    }

    /// Return the storage.
    #[must_use]
    pub fn storage(&self) -> Arc<TStorage> {
        self.storage.clone()
    }

    /// Return the chunk store.
    #[must_use]
    pub const fn chunk_store(&self) -> &ChunkStore<TStorage> {
        &self.chunk_store
    }

    /// Return the logical shape: `nrows` along the extensible dimension, followed by the atom shape.
    #[must_use]
    pub fn shape(&self) -> Vec<u64> {
        self.metadata.logical_shape()
    }

    /// Return the shape of one row: the logical shape without the extensible dimension.
    #[must_use]
    pub fn row_shape(&self) -> Vec<u64> {
        let mut shape = self.shape();
        shape.remove(self.metadata.extdim);
        shape
    }

    /// Return the number of dimensions of the logical shape.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.metadata.shape.len() + self.metadata.atom.shape().len()
    }

    /// Return the number of rows along the extensible dimension.
    #[must_use]
    pub const fn nrows(&self) -> u64 {
        self.metadata.nrows
    }

    /// Return the extensible dimension.
    #[must_use]
    pub const fn extdim(&self) -> usize {
        self.metadata.extdim
    }

    /// Return the atom.
    #[must_use]
    pub const fn atom(&self) -> &Atom {
        &self.metadata.atom
    }

    /// Return the number of rows per chunk.
    #[must_use]
    pub const fn chunk_rows(&self) -> u64 {
        self.metadata.chunk_rows
    }

    /// Return the size of one row in bytes.
    #[must_use]
    pub const fn row_bytes(&self) -> usize {
        self.chunk_store.row_bytes()
    }

    /// Return the filters.
    #[must_use]
    pub const fn filters(&self) -> &Filters {
        &self.metadata.filters
    }

    /// Return the flavor.
    #[must_use]
    pub const fn flavor(&self) -> Flavor {
        self.metadata.flavor
    }

    /// Return the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    /// Return the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ArrayState {
        self.state
    }

    /// Return true if the array refuses writes.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub(crate) const fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    fn check_open(&self, operation: &'static str) -> Result<(), ArrayError> {
        if self.state == ArrayState::Open {
            Ok(())
        } else {
            Err(ArrayError::InvalidState {
                path: self.path.clone(),
                operation,
                state: self.state,
            })
        }
    }

    fn index_error(
        &self,
        operation: &'static str,
        selection: String,
        source: IndexerError,
    ) -> ArrayError {
        ArrayError::IndexError {
            path: self.path.clone(),
            operation,
            selection,
            source,
        }
    }

    /// Describe the shapes accepted by append, e.g. `[*, 3]`.
    fn expected_shape(&self) -> String {
        let shape = self.shape();
        let axes: Vec<String> = shape
            .iter()
            .enumerate()
            .map(|(axis, len)| {
                if axis == self.extdim() {
                    "*".to_string()
                } else {
                    len.to_string()
                }
            })
            .collect();
        format!("[{}]", axes.join(", "))
    }

    fn indexer<'a>(&self, shape: &'a [u64]) -> ShapeIndexer<'a> {
        ShapeIndexer::new(shape, self.extdim())
    }

    /// Return the number of bytes of the selected lengths before and after the extensible dimension.
    ///
    /// Bytes in logical order are `[before][rows][after]` and in physical order `[rows][before][after]`.
    fn outer_inner(&self, lens: &[u64]) -> Result<(usize, usize), ArrayError> {
        let extdim = self.extdim();
        let before = array_data::num_elements(&lens[..extdim])?;
        let after = array_data::num_elements(&lens[extdim + 1..])?;
        let after_bytes = array_data::to_usize(after, "selection")?
            .checked_mul(self.atom().item_size())
            .ok_or_else(|| ArrayError::SizeOverflow(format!("selection {lens:?}")))?;
        Ok((array_data::to_usize(before, "selection")?, after_bytes))
    }
}

impl<TStorage: ?Sized> Drop for EArray<TStorage> {
    fn drop(&mut self) {
        if self.chunk_store.has_unflushed_rows() {
            log::warn!(
                "earray {} dropped with unflushed rows, call flush or close to store them",
                self.path
            );
        }
    }
}
