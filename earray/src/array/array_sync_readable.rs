use std::sync::Arc;

use super::{
    ArrayCreateError, ArrayData, ArrayError, ArrayState, EArray, EArrayMetadata, Element,
    FlavoredData, ReadOptions, RowIterator, RowRange,
    array_data::{num_elements, swap_outer, to_usize},
};
use crate::indexer::{AxisSelector, ResolvedAxis, ResolvedSelection, selection_to_string};
use crate::node::{NodePath, meta_key_earray};
use crate::storage::ReadableStorageTraits;

/// Return the offsets in elements within a physical row of every selected element, in selection order.
///
/// A physical row holds every axis except `extdim` in row-major order.
pub(super) fn row_element_offsets(
    shape: &[u64],
    extdim: usize,
    selection: &ResolvedSelection,
) -> Result<Vec<usize>, ArrayError> {
    let mut offsets = vec![0usize];
    let mut stride = 1usize;
    let mut strides = vec![0usize; shape.len()];
    for axis in (0..shape.len()).rev().filter(|&axis| axis != extdim) {
        strides[axis] = stride;
        stride = stride
            .checked_mul(to_usize(shape[axis], "dimension")?)
            .ok_or_else(|| ArrayError::SizeOverflow(format!("row shape {shape:?}")))?;
    }
    for (axis, resolved) in selection.axes().iter().enumerate() {
        if axis == extdim {
            continue;
        }
        let indices = resolved
            .indices()
            .map(|index| to_usize(index, "index"))
            .collect::<Result<Vec<_>, _>>()?;
        let stride = strides[axis];
        offsets = offsets
            .iter()
            .flat_map(|&offset| indices.iter().map(move |&index| offset + index * stride))
            .collect();
    }
    Ok(offsets)
}

/// Coalesce element offsets into runs of `(start, length)` contiguous elements.
pub(super) fn coalesce_runs(offsets: &[usize]) -> Vec<(usize, usize)> {
    let mut runs: Vec<(usize, usize)> = Vec::new();
    for &offset in offsets {
        match runs.last_mut() {
            Some((start, length)) if *start + *length == offset => *length += 1,
            _ => runs.push((offset, 1)),
        }
    }
    runs
}

impl<TStorage: ?Sized + ReadableStorageTraits + 'static> EArray<TStorage> {
    /// Open an existing earray in `storage` at `path`, reading its metadata from the store.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if there is a storage error or the metadata is missing or invalid.
    pub fn open(storage: Arc<TStorage>, path: &str) -> Result<Self, ArrayCreateError> {
        let path = NodePath::new(path)?;
        let json = storage
            .get(&meta_key_earray(&path))?
            .ok_or_else(|| ArrayCreateError::MissingMetadata(path.clone()))?;
        let metadata = EArrayMetadata::from_json(&path, &json)?;
        Self::new_with_metadata(storage, path, metadata, ArrayState::Open)
    }

    /// Open an existing earray that refuses writes.
    ///
    /// # Errors
    /// See [`open`](EArray::open).
    pub fn open_read_only(storage: Arc<TStorage>, path: &str) -> Result<Self, ArrayCreateError> {
        let mut array = Self::open(storage, path)?;
        array.set_read_only(true);
        Ok(array)
    }

    /// Read and decode chunk `index` in physical row order.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the array is not open or the chunk cannot be read, see [`ChunkStore::read_chunk`](super::ChunkStore::read_chunk).
    pub fn read_chunk(&self, index: u64, options: &ReadOptions) -> Result<Vec<u8>, ArrayError> {
        self.check_open("read_chunk")?;
        self.chunk_store.read_chunk(index, options.codec_options())
    }

    /// Read rows of the extensible dimension.
    ///
    /// Every other axis is read in full and the result has the rank of the array.
    /// See [`RowRange`] for how a `None` stop selects a single row.
    /// The step must be positive; read rows in reverse with [`get_item`](EArray::get_item) and a negative [`SliceSpec`](crate::indexer::SliceSpec) step.
    ///
    /// # Errors
    /// Returns
    ///  - [`ArrayError::InvalidState`] if the array is not open,
    ///  - [`ArrayError::IndexError`] if the range is invalid, including a zero or negative step, or
    ///  - an [`ArrayError`] if a chunk cannot be read.
    pub fn read(&self, range: RowRange) -> Result<ArrayData, ArrayError> {
        self.read_opt(range, &ReadOptions::default())
    }

    /// Explicit options version of [`read`](EArray::read).
    #[allow(clippy::missing_errors_doc)]
    pub fn read_opt(&self, range: RowRange, options: &ReadOptions) -> Result<ArrayData, ArrayError> {
        self.check_open("read")?;
        let selection = self.row_range_selection("read", &range)?;
        self.retrieve(&selection, options)
    }

    /// Read rows into a vector of elements in logical row-major order.
    ///
    /// # Errors
    /// See [`read`](EArray::read), and [`ArrayError::IncompatibleElementType`] if `T` does not match the atom.
    pub fn read_elements<T: Element>(&self, range: RowRange) -> Result<Vec<T>, ArrayError> {
        T::validate_kind(self.atom().kind())?;
        self.read(range)?.to_elements()
    }

    /// Read rows into an [`ndarray::ArrayD`].
    ///
    /// # Errors
    /// See [`read_elements`](EArray::read_elements).
    #[cfg(feature = "ndarray")]
    pub fn read_ndarray<T: Element>(&self, range: RowRange) -> Result<ndarray::ArrayD<T>, ArrayError> {
        T::validate_kind(self.atom().kind())?;
        self.read(range)?.to_ndarray()
    }

    /// Read rows in the [`Flavor`](super::Flavor) of the array.
    ///
    /// # Errors
    /// See [`read`](EArray::read).
    pub fn read_flavored(&self, range: RowRange) -> Result<FlavoredData, ArrayError> {
        FlavoredData::from_array_data(self.read(range)?, self.flavor())
    }

    /// Read the elements selected by per-axis selectors.
    ///
    /// Axes selected by a single index are dropped from the result.
    /// A selection that selects nothing returns empty data without accessing the store.
    ///
    /// # Errors
    /// Returns
    ///  - [`ArrayError::InvalidState`] if the array is not open,
    ///  - [`ArrayError::IndexError`] if the selection is malformed or an index is out of bounds, or
    ///  - an [`ArrayError`] if a chunk cannot be read.
    pub fn get_item(&self, selection: &[AxisSelector]) -> Result<ArrayData, ArrayError> {
        self.get_item_opt(selection, &ReadOptions::default())
    }

    /// Explicit options version of [`get_item`](EArray::get_item).
    #[allow(clippy::missing_errors_doc)]
    pub fn get_item_opt(
        &self,
        selection: &[AxisSelector],
        options: &ReadOptions,
    ) -> Result<ArrayData, ArrayError> {
        self.check_open("get_item")?;
        let shape = self.shape();
        let resolved = self
            .indexer(&shape)
            .resolve(selection)
            .map_err(|source| self.index_error("get_item", selection_to_string(selection), source))?;
        self.retrieve(&resolved, options)
    }

    /// Read the elements selected by per-axis selectors into a vector of elements.
    ///
    /// # Errors
    /// See [`get_item`](EArray::get_item), and [`ArrayError::IncompatibleElementType`] if `T` does not match the atom.
    pub fn get_item_elements<T: Element>(
        &self,
        selection: &[AxisSelector],
    ) -> Result<Vec<T>, ArrayError> {
        T::validate_kind(self.atom().kind())?;
        self.get_item(selection)?.to_elements()
    }

    /// Read the elements selected by per-axis selectors in the [`Flavor`](super::Flavor) of the array.
    ///
    /// # Errors
    /// See [`get_item`](EArray::get_item).
    pub fn get_item_flavored(&self, selection: &[AxisSelector]) -> Result<FlavoredData, ArrayError> {
        FlavoredData::from_array_data(self.get_item(selection)?, self.flavor())
    }

    /// Iterate over rows of the extensible dimension, fetching `buffer_rows` rows at a time.
    ///
    /// Each item is the row number and the array indexed at that row, which has a rank one lower than the array.
    /// The iterator holds a snapshot of the row range, a new iterator starts again from the first row.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the array is not open or the range is invalid.
    pub fn iter_rows(
        &self,
        range: RowRange,
        options: &ReadOptions,
    ) -> Result<RowIterator<'_, TStorage>, ArrayError> {
        self.check_open("iter_rows")?;
        let rows = range
            .resolve(self.nrows())
            .map_err(|source| self.index_error("iter_rows", range.to_string(), source))?;
        let buffer_rows = options.effective_buffer_rows(self.row_bytes() as u64);
        Ok(RowIterator::new(self, rows, buffer_rows, *options))
    }

    pub(super) fn row_range_selection(
        &self,
        operation: &'static str,
        range: &RowRange,
    ) -> Result<ResolvedSelection, ArrayError> {
        let rows = range
            .resolve(self.nrows())
            .map_err(|source| self.index_error(operation, range.to_string(), source))?;
        self.rows_selection(operation, rows)
    }

    /// Select `rows` of the extensible dimension and every other axis in full.
    pub(super) fn rows_selection(
        &self,
        operation: &'static str,
        rows: ResolvedAxis,
    ) -> Result<ResolvedSelection, ArrayError> {
        let shape = self.shape();
        let axes = shape
            .iter()
            .enumerate()
            .map(|(axis, &len)| {
                if axis == self.extdim() {
                    Ok(rows)
                } else {
                    ResolvedAxis::resolve(&AxisSelector::Full, axis, len)
                        .map_err(|source| self.index_error(operation, rows.to_string(), source))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ResolvedSelection::new(axes))
    }

    /// Gather the selected elements in physical order, `[rows][before][after]`.
    pub(super) fn gather_physical(
        &self,
        selection: &ResolvedSelection,
        options: &ReadOptions,
    ) -> Result<Vec<u8>, ArrayError> {
        if selection.is_empty() {
            return Ok(Vec::new());
        }
        let shape = self.shape();
        let extdim = self.extdim();
        let item_size = self.atom().item_size();
        let row_bytes = self.row_bytes();
        let chunk_rows = self.chunk_rows();
        let runs = coalesce_runs(&row_element_offsets(&shape, extdim, selection)?);
        let total = to_usize(num_elements(&selection.lens())?, "selection")?
            .checked_mul(item_size)
            .ok_or_else(|| ArrayError::SizeOverflow(format!("selection {selection}")))?;

        let mut bytes = Vec::with_capacity(total);
        let mut cached: Option<(u64, Vec<u8>)> = None;
        for row in selection.axes()[extdim].indices() {
            let index = row / chunk_rows;
            let chunk = match cached.take() {
                Some((cached_index, chunk)) if cached_index == index => chunk,
                _ => self.chunk_store.read_chunk(index, options.codec_options())?,
            };
            let base = to_usize(row - index * chunk_rows, "row")? * row_bytes;
            for &(start, length) in &runs {
                let start = base + start * item_size;
                bytes.extend_from_slice(&chunk[start..start + length * item_size]);
            }
            cached = Some((index, chunk));
        }
        Ok(bytes)
    }

    /// Gather the selected elements in logical order.
    fn retrieve(
        &self,
        selection: &ResolvedSelection,
        options: &ReadOptions,
    ) -> Result<ArrayData, ArrayError> {
        let kind = *self.atom().kind();
        let shape = selection.shape();
        if selection.is_empty() {
            return Ok(ArrayData::new_unchecked(kind, shape, Vec::new()));
        }
        let physical = self.gather_physical(selection, options)?;
        let lens = selection.lens();
        let rows = to_usize(lens[self.extdim()], "rows")?;
        let (before, after_bytes) = self.outer_inner(&lens)?;
        let bytes = swap_outer(&physical, rows, before, after_bytes);
        Ok(ArrayData::new_unchecked(kind, shape, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::{ShapeIndexer, SliceSpec};

    #[test]
    fn row_offsets() {
        // logical [2, nrows, 3], physical row [2, 3]
        let shape = [2, 5, 3];
        let selection = ShapeIndexer::new(&shape, 1)
            .resolve(&[
                AxisSelector::Full,
                AxisSelector::Index(0),
                AxisSelector::Slice(SliceSpec::new(Some(1), None, None)),
            ])
            .unwrap();
        let offsets = row_element_offsets(&shape, 1, &selection).unwrap();
        assert_eq!(offsets, vec![1, 2, 4, 5]);
        assert_eq!(coalesce_runs(&offsets), vec![(1, 2), (4, 2)]);
        assert_eq!(coalesce_runs(&[3, 2, 1]), vec![(3, 1), (2, 1), (1, 1)]);
    }
}
