use std::collections::BTreeMap;

use super::{
    ArrayError, ArrayState, EArray, IntoArrayData,
    array_data::{swap_outer, to_usize},
    array_sync_readable::row_element_offsets,
    chunk_store::ChunkWrite,
    codec::CodecOptions,
};
use crate::indexer::{AxisSelector, selection_to_string};
use crate::node::meta_key_earray;
use crate::storage::{Bytes, ReadableWritableStorageTraits, StorageError};

impl<TStorage: ?Sized + ReadableWritableStorageTraits + 'static> EArray<TStorage> {
    /// Store the metadata of the array, including its current number of rows.
    ///
    /// This opens an [`Uninitialized`](ArrayState::Uninitialized) array.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidState`] if the array is closed, [`StorageError::ReadOnly`] if it is read only, or an [`ArrayError`] if there is an underlying store error.
    pub fn store_metadata(&mut self) -> Result<(), ArrayError> {
        if self.state == ArrayState::Closed {
            return Err(ArrayError::InvalidState {
                path: self.path.clone(),
                operation: "store_metadata",
                state: self.state,
            });
        }
        if self.read_only {
            return Err(StorageError::ReadOnly.into());
        }
        self.metadata.nrows = self.chunk_store.nrows();
        let json = self
            .metadata
            .to_json()
            .map_err(|err| StorageError::Other(err.to_string()))?;
        self.storage
            .set(&meta_key_earray(&self.path), Bytes::from(json))?;
        self.state = ArrayState::Open;
        Ok(())
    }

    /// Append rows to the end of the array.
    ///
    /// `data` must match every fixed dimension of the array and may hold any number of rows along the extensible dimension.
    /// Completed chunks are stored immediately and the last partial chunk is buffered until it is completed, [flushed](EArray::flush) or the array is [closed](EArray::close).
    ///
    /// # Errors
    /// Returns
    ///  - [`ArrayError::InvalidState`] if the array is not open,
    ///  - [`ArrayError::ShapeMismatch`] if `data` does not match the fixed dimensions,
    ///  - [`ArrayError::FlavorError`] or [`ArrayError::IncompatibleElementType`] if `data` cannot be converted to the atom, or
    ///  - an [`ArrayError`] if a chunk cannot be encoded or stored, in which case the array is left unchanged.
    pub fn append(&mut self, data: impl IntoArrayData) -> Result<(), ArrayError> {
        self.append_opt(data, &CodecOptions::default())
    }

    /// Explicit options version of [`append`](EArray::append).
    #[allow(clippy::missing_errors_doc)]
    pub fn append_opt(
        &mut self,
        data: impl IntoArrayData,
        options: &CodecOptions,
    ) -> Result<(), ArrayError> {
        self.check_writable("append")?;
        let data = data.into_array_data(self.atom().kind())?;
        let shape = self.shape();
        let extdim = self.extdim();
        let matches = data.rank() == shape.len()
            && data
                .shape()
                .iter()
                .zip(&shape)
                .enumerate()
                .all(|(axis, (got, expected))| axis == extdim || got == expected);
        if !matches {
            return Err(ArrayError::ShapeMismatch {
                path: self.path.clone(),
                operation: "append",
                got: data.shape().to_vec(),
                expected: self.expected_shape(),
            });
        }
        let rows = to_usize(data.shape()[extdim], "rows")?;
        if rows == 0 {
            return Ok(());
        }
        let (before, after_bytes) = self.outer_inner(data.shape())?;
        let physical = swap_outer(data.bytes(), before, rows, after_bytes);
        let result = self.chunk_store.append_rows(&physical, options);
        self.metadata.nrows = self.chunk_store.nrows();
        result
    }

    /// Assign `values` to the elements selected by per-axis selectors.
    ///
    /// `values` must match the shape of the selection or broadcast to it.
    /// Assignment never extends the array, use [`append`](EArray::append) to add rows.
    ///
    /// # Errors
    /// Returns
    ///  - [`ArrayError::InvalidState`] if the array is not open,
    ///  - [`ArrayError::IndexError`] if the selection is malformed or reaches beyond the current rows,
    ///  - [`ArrayError::ShapeMismatch`] if `values` cannot be broadcast to the selection, or
    ///  - an [`ArrayError`] if a chunk cannot be read, encoded or stored, in which case the array is left unchanged.
    pub fn set_item(
        &mut self,
        selection: &[AxisSelector],
        values: impl IntoArrayData,
    ) -> Result<(), ArrayError> {
        self.set_item_opt(selection, values, &CodecOptions::default())
    }

    /// Explicit options version of [`set_item`](EArray::set_item).
    #[allow(clippy::missing_errors_doc)]
    pub fn set_item_opt(
        &mut self,
        selection: &[AxisSelector],
        values: impl IntoArrayData,
        options: &CodecOptions,
    ) -> Result<(), ArrayError> {
        self.check_writable("set_item")?;
        let shape = self.shape();
        let extdim = self.extdim();
        let resolved = self
            .indexer(&shape)
            .resolve_write(selection)
            .map_err(|source| self.index_error("set_item", selection_to_string(selection), source))?;
        let values = values.into_array_data(self.atom().kind())?;
        let target_shape = resolved.shape();
        let Some(logical) = values.broadcast_bytes(&target_shape) else {
            return Err(ArrayError::ShapeMismatch {
                path: self.path.clone(),
                operation: "set_item",
                got: values.shape().to_vec(),
                expected: format!("{target_shape:?} or a shape that broadcasts to it"),
            });
        };
        if resolved.is_empty() {
            return Ok(());
        }

        let lens = resolved.lens();
        let rows = to_usize(lens[extdim], "rows")?;
        let (before, after_bytes) = self.outer_inner(&lens)?;
        let physical = swap_outer(&logical, before, rows, after_bytes);
        let offsets = row_element_offsets(&shape, extdim, &resolved)?;
        let item_size = self.atom().item_size();
        let row_bytes = self.row_bytes();
        let chunk_rows = self.chunk_rows();
        let selected_row_bytes = offsets.len() * item_size;

        let mut contents: BTreeMap<u64, Vec<u8>> = BTreeMap::new();
        for (row, source) in resolved.axes()[extdim]
            .indices()
            .zip(physical.chunks_exact(selected_row_bytes))
        {
            let index = row / chunk_rows;
            let content = match contents.entry(index) {
                std::collections::btree_map::Entry::Occupied(entry) => entry.into_mut(),
                std::collections::btree_map::Entry::Vacant(entry) => {
                    entry.insert(self.chunk_store.read_chunk(index, options)?)
                }
            };
            let base = to_usize(row - index * chunk_rows, "row")? * row_bytes;
            for (&offset, element) in offsets.iter().zip(source.chunks_exact(item_size)) {
                let start = base + offset * item_size;
                content[start..start + item_size].copy_from_slice(element);
            }
        }
        let writes = contents
            .into_iter()
            .map(|(index, bytes)| ChunkWrite {
                index,
                row_offset: 0,
                bytes,
            })
            .collect();
        self.chunk_store.apply_writes(writes, options).map(drop)
    }

    /// Truncate the array to `nrows` rows.
    ///
    /// Truncating to `nrows` at or above the current number of rows does nothing.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the array is not open or writable, or if a chunk or the metadata cannot be rewritten.
    /// The rows and the stored chunks are left unchanged on error.
    pub fn truncate(&mut self, nrows: u64) -> Result<(), ArrayError> {
        self.truncate_opt(nrows, &CodecOptions::default())
    }

    /// Explicit options version of [`truncate`](EArray::truncate).
    #[allow(clippy::missing_errors_doc)]
    pub fn truncate_opt(&mut self, nrows: u64, options: &CodecOptions) -> Result<(), ArrayError> {
        self.check_writable("truncate")?;
        if nrows >= self.nrows() {
            return Ok(());
        }
        let snapshot = self.chunk_store.snapshot();
        let previous_nrows = self.metadata.nrows;
        let journal = self.chunk_store.truncate_journaled(nrows, options)?;
        if let Err(err) = self.store_metadata() {
            log::warn!("rolling back truncation of {}: {err}", self.path);
            journal.rollback(&*self.storage);
            self.chunk_store.restore(snapshot);
            self.metadata.nrows = previous_nrows;
            return Err(err);
        }
        log::debug!("truncated {} to {nrows} rows", self.path);
        Ok(())
    }

    /// Store the buffered partial chunk and the metadata.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the array is not open or writable, or if the chunk or metadata cannot be stored.
    pub fn flush(&mut self) -> Result<(), ArrayError> {
        self.flush_opt(&CodecOptions::default())
    }

    /// Explicit options version of [`flush`](EArray::flush).
    #[allow(clippy::missing_errors_doc)]
    pub fn flush_opt(&mut self, options: &CodecOptions) -> Result<(), ArrayError> {
        self.check_writable("flush")?;
        self.chunk_store.flush(options)?;
        self.store_metadata()
    }

    /// Close the array, flushing it if it is open and writable.
    ///
    /// Every operation on a closed array fails with [`ArrayError::InvalidState`].
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidState`] if the array is already closed, or an [`ArrayError`] if flushing fails.
    /// The array is closed even if flushing fails.
    pub fn close(&mut self) -> Result<(), ArrayError> {
        if self.state == ArrayState::Closed {
            return Err(ArrayError::InvalidState {
                path: self.path.clone(),
                operation: "close",
                state: self.state,
            });
        }
        let result = if self.state == ArrayState::Open && !self.read_only {
            self.flush()
        } else {
            Ok(())
        };
        self.state = ArrayState::Closed;
        result
    }

    fn check_writable(&self, operation: &'static str) -> Result<(), ArrayError> {
        self.check_open(operation)?;
        if self.read_only {
            Err(StorageError::ReadOnly.into())
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::array::{ArrayBuilder, ArrayData, AtomKind, RowRange};
    use crate::indexer::SliceSpec;
    use crate::storage::store::MemoryStore;

    #[test]
    fn array_append_shape_mismatch() -> Result<(), Box<dyn std::error::Error>> {
        let store = Arc::new(MemoryStore::new());
        let mut array = ArrayBuilder::new(vec![0, 3], AtomKind::Int16).build(store, "/a")?;
        array.store_metadata()?;
        let err = array
            .append(ArrayData::from_elements(AtomKind::Int16, vec![2, 2], &[0i16; 4])?)
            .unwrap_err();
        assert!(matches!(err, ArrayError::ShapeMismatch { .. }));
        assert!(err.to_string().contains("[*, 3]"));
        assert!(
            array
                .append(ArrayData::from_elements(AtomKind::Int16, vec![3], &[0i16; 3])?)
                .is_err()
        );
        array.append(ArrayData::from_elements(AtomKind::Int16, vec![0, 3], &[0i16; 0])?)?;
        assert_eq!(array.nrows(), 0);
        Ok(())
    }

    #[test]
    fn array_set_item() -> Result<(), Box<dyn std::error::Error>> {
        let store = Arc::new(MemoryStore::new());
        let mut array = ArrayBuilder::new(vec![2, 0], AtomKind::UInt8)
            .chunk_rows(2)
            .build(store, "/a")?;
        array.store_metadata()?;
        let elements: Vec<u8> = (0..10).collect();
        array.append((elements.as_slice(), [2u64, 5].as_slice()))?;

        // a column over every row
        array.set_item(
            &[AxisSelector::Index(1), AxisSelector::Full],
            ArrayData::from_elements(AtomKind::UInt8, vec![], &[9u8])?,
        )?;
        assert_eq!(
            array.read_elements::<u8>(RowRange::all())?,
            vec![0, 1, 2, 3, 4, 9, 9, 9, 9, 9]
        );

        // strided rows crossing chunks
        array.set_item(
            &[
                AxisSelector::Full,
                AxisSelector::Slice(SliceSpec::new(Some(0), None, Some(2))),
            ],
            ArrayData::from_elements(AtomKind::UInt8, vec![2, 3], &[20u8, 21, 22, 30, 31, 32])?,
        )?;
        assert_eq!(
            array.read_elements::<u8>(RowRange::all())?,
            vec![20, 1, 21, 3, 22, 30, 9, 31, 9, 32]
        );

        // beyond nrows
        let err = array
            .set_item(
                &[
                    AxisSelector::Full,
                    AxisSelector::Slice(SliceSpec::new(Some(3), Some(7), None)),
                ],
                ArrayData::from_elements(AtomKind::UInt8, vec![], &[0u8])?,
            )
            .unwrap_err();
        assert!(matches!(err, ArrayError::IndexError { .. }));

        // not broadcastable
        let err = array
            .set_item(
                &[AxisSelector::Full],
                ArrayData::from_elements(AtomKind::UInt8, vec![3], &[0u8; 3])?,
            )
            .unwrap_err();
        assert!(matches!(err, ArrayError::ShapeMismatch { .. }));
        assert_eq!(array.nrows(), 5);
        Ok(())
    }

    #[test]
    fn array_truncate_and_close() -> Result<(), Box<dyn std::error::Error>> {
        let store = Arc::new(MemoryStore::new());
        let mut array = ArrayBuilder::new(vec![0], AtomKind::Int64)
            .chunk_rows(4)
            .build(store.clone(), "/a")?;
        assert!(matches!(
            array.append(ArrayData::from_elements(AtomKind::Int64, vec![1], &[1i64])?),
            Err(ArrayError::InvalidState {
                state: ArrayState::Uninitialized,
                ..
            })
        ));
        array.store_metadata()?;
        let elements: Vec<i64> = (0..10).collect();
        array.append(ArrayData::from_elements(AtomKind::Int64, vec![10], &elements)?)?;
        array.truncate(12)?;
        assert_eq!(array.nrows(), 10);
        array.truncate(5)?;
        array.truncate(5)?;
        assert_eq!(array.nrows(), 5);
        assert_eq!(array.read_elements::<i64>(RowRange::all())?, vec![0, 1, 2, 3, 4]);

        array.close()?;
        assert_eq!(array.state(), ArrayState::Closed);
        assert!(matches!(
            array.read(RowRange::all()),
            Err(ArrayError::InvalidState { .. })
        ));
        assert!(array.close().is_err());

        let array = EArray::open(store, "/a")?;
        assert_eq!(array.nrows(), 5);
        assert_eq!(array.read_elements::<i64>(RowRange::span(3, 10))?, vec![3, 4]);
        Ok(())
    }

    #[test]
    fn array_read_only() -> Result<(), Box<dyn std::error::Error>> {
        let store = Arc::new(MemoryStore::new());
        let mut array = ArrayBuilder::new(vec![0], AtomKind::Int8).build(store.clone(), "/a")?;
        array.store_metadata()?;
        array.close()?;

        let mut array = EArray::open_read_only(store, "/a")?;
        assert!(matches!(
            array.append(ArrayData::from_elements(AtomKind::Int8, vec![1], &[1i8])?),
            Err(ArrayError::StorageError(StorageError::ReadOnly))
        ));
        array.close()?;
        Ok(())
    }
}
