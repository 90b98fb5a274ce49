use std::sync::Arc;

use super::{
    ArrayCreateError, ArrayState, Atom, EArray, Filters, Flavor,
    metadata::{EARRAY_NODE_TYPE, EArrayMetadata, native_byteorder},
};
use crate::node::NodePath;

/// The default number of rows an earray is expected to hold.
pub const DEFAULT_EXPECTED_ROWS: u64 = 1000;

/// Return the number of rows per chunk for an earray expected to hold `expected_rows` rows of `row_bytes` bytes.
///
/// The chunk size grows by a factor of two for every tenfold increase of the expected size in MiB:
///  - the expected size is clamped to between 1 MiB and 10 TiB,
///  - a chunk is `64 KiB * 2^zone`, where `zone` is the base 10 order of magnitude of the expected size in MiB.
///
/// A chunk holds at least one row.
#[must_use]
pub fn compute_chunk_rows(expected_rows: u64, row_bytes: u64) -> u64 {
    if row_bytes == 0 {
        return 1;
    }
    #[allow(clippy::cast_precision_loss)]
    let expected_mb = (expected_rows as f64 * row_bytes as f64 / f64::from(1 << 20)).clamp(1.0, 1e7);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let zone = expected_mb.log10().floor() as u32;
    let chunk_bytes = 8192u64 * 2u64.pow(zone) * 8;
    (chunk_bytes / row_bytes).max(1)
}

/// An [`EArray`] builder.
///
/// [`ArrayBuilder`] is initialised from a shape and an [`Atom`].
/// Exactly one dimension of the shape must be zero: that is the extensible dimension.
///  - The default number of rows per chunk is computed from the expected number of rows with [`compute_chunk_rows`].
///  - The default filters disable compression, shuffle and checksums.
///  - The default flavor is [`Flavor::Native`] and the title is empty.
///
/// [`build`](ArrayBuilder::build) does not modify the store!
/// Array metadata has to be explicitly written with [`EArray::store_metadata`], which opens the array.
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # use std::sync::Arc;
/// use earray::array::{ArrayBuilder, AtomKind, Complib, Filters};
/// # let store = Arc::new(earray::storage::store::MemoryStore::new());
/// let mut array = ArrayBuilder::new(vec![0, 3], AtomKind::Float64)
///     .chunk_rows(128)
///     .filters(Filters::new().with_complevel(5).with_complib(Complib::Zlib).with_shuffle(true))
///     .title("temperatures")
///     .build(store.clone(), "/group/earray1")?;
/// array.store_metadata()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ArrayBuilder {
    /// The declared shape, zero along the extensible dimension.
    pub shape: Vec<u64>,
    /// The atom.
    pub atom: Atom,
    /// Rows per chunk. If [`None`], computed from `expected_rows`.
    pub chunk_rows: Option<u64>,
    /// The expected number of rows.
    pub expected_rows: u64,
    /// The filters.
    pub filters: Filters,
    /// The flavor.
    pub flavor: Flavor,
    /// The title.
    pub title: String,
}

impl ArrayBuilder {
    /// Create a new earray builder.
    #[must_use]
    pub fn new(shape: impl Into<Vec<u64>>, atom: impl Into<Atom>) -> Self {
        Self {
            shape: shape.into(),
            atom: atom.into(),
            chunk_rows: None,
            expected_rows: DEFAULT_EXPECTED_ROWS,
            filters: Filters::default(),
            flavor: Flavor::default(),
            title: String::new(),
        }
    }

    /// Create a new builder copying the configuration of `array`.
    #[must_use]
    pub fn from_array<T: ?Sized>(array: &EArray<T>) -> Self {
        let metadata = array.metadata();
        let mut builder = Self::new(metadata.shape.clone(), metadata.atom.clone());
        builder
            .chunk_rows(metadata.chunk_rows)
            .filters(metadata.filters)
            .flavor(metadata.flavor)
            .title(metadata.title.clone());
        builder
    }

    /// Set the declared shape.
    pub fn shape(&mut self, shape: impl Into<Vec<u64>>) -> &mut Self {
        self.shape = shape.into();
        self
    }

    /// Set the atom.
    pub fn atom(&mut self, atom: impl Into<Atom>) -> &mut Self {
        self.atom = atom.into();
        self
    }

    /// Set the number of rows per chunk.
    pub fn chunk_rows(&mut self, chunk_rows: u64) -> &mut Self {
        self.chunk_rows = Some(chunk_rows);
        self
    }

    /// Set the expected number of rows, used to compute the number of rows per chunk if it is not set.
    pub fn expected_rows(&mut self, expected_rows: u64) -> &mut Self {
        self.expected_rows = expected_rows;
        self
    }

    /// Set the filters.
    pub fn filters(&mut self, filters: Filters) -> &mut Self {
        self.filters = filters;
        self
    }

    /// Set the flavor.
    pub fn flavor(&mut self, flavor: Flavor) -> &mut Self {
        self.flavor = flavor;
        self
    }

    /// Set the title.
    pub fn title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = title.into();
        self
    }

    /// Return the extensible dimension: the single zero-sized dimension of the shape.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError::InvalidShape`] if the shape does not have exactly one zero-sized dimension.
    pub fn extdim(&self) -> Result<usize, ArrayCreateError> {
        let mut zeros = self
            .shape
            .iter()
            .enumerate()
            .filter(|&(_, &len)| len == 0)
            .map(|(axis, _)| axis);
        match (zeros.next(), zeros.next()) {
            (Some(extdim), None) => Ok(extdim),
            _ => Err(ArrayCreateError::InvalidShape(self.shape.clone())),
        }
    }

    /// Build earray metadata with no rows.
    ///
    /// Unavailable compression libraries are substituted, see [`Filters::resolve`].
    ///
    /// # Errors
    /// Returns an [`ArrayCreateError`] if the shape, atom, filters or chunk size are invalid.
    pub fn build_metadata(&self, path: &NodePath) -> Result<EArrayMetadata, ArrayCreateError> {
        let extdim = self.extdim()?;
        self.atom.validate()?;
        let filters = self.filters.resolve()?;
        let mut metadata = EArrayMetadata {
            node_type: EARRAY_NODE_TYPE.to_string(),
            shape: self.shape.clone(),
            extdim,
            nrows: 0,
            atom: self.atom.clone(),
            chunk_rows: 1,
            filters,
            flavor: self.flavor,
            title: self.title.clone(),
            byteorder: native_byteorder().to_string(),
        };
        metadata.validate(path)?;
        metadata.chunk_rows = match self.chunk_rows {
            Some(0) => return Err(ArrayCreateError::InvalidChunkRows(0)),
            Some(chunk_rows) => chunk_rows,
            None => compute_chunk_rows(self.expected_rows, metadata.row_bytes()),
        };
        metadata
            .chunk_rows
            .checked_mul(metadata.row_bytes())
            .and_then(|bytes| usize::try_from(bytes).ok())
            .ok_or(ArrayCreateError::InvalidChunkRows(metadata.chunk_rows))?;
        Ok(metadata)
    }

    /// Build into an [`EArray`].
    ///
    /// The array is [`Uninitialized`](ArrayState::Uninitialized) until [`EArray::store_metadata`] is called.
    ///
    /// # Errors
    /// Returns an [`ArrayCreateError`] if `path` or the configuration is invalid.
    pub fn build<TStorage: ?Sized>(
        &self,
        storage: Arc<TStorage>,
        path: &str,
    ) -> Result<EArray<TStorage>, ArrayCreateError> {
        let path = NodePath::new(path)?;
        let metadata = self.build_metadata(&path)?;
        EArray::new_with_metadata(storage, path, metadata, ArrayState::Uninitialized)
    }
}
