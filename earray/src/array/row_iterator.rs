use std::collections::VecDeque;

use super::{ArrayData, ArrayError, EArray, ReadOptions};
use crate::indexer::ResolvedAxis;
use crate::storage::ReadableStorageTraits;

/// An iterator over the rows of an [`EArray`], created by [`EArray::iter_rows`].
///
/// Rows are fetched `buffer_rows` at a time and yielded one by one as `(row, data)`.
/// The data of a row has the rank of the array minus one.
/// Iteration stops after the first error.
#[derive(Debug)]
pub struct RowIterator<'a, TStorage: ?Sized> {
    array: &'a EArray<TStorage>,
    rows: ResolvedAxis,
    position: u64,
    buffer_rows: u64,
    options: ReadOptions,
    buffer: VecDeque<(u64, ArrayData)>,
}

impl<'a, TStorage: ?Sized + ReadableStorageTraits + 'static> RowIterator<'a, TStorage> {
    pub(super) fn new(
        array: &'a EArray<TStorage>,
        rows: ResolvedAxis,
        buffer_rows: u64,
        options: ReadOptions,
    ) -> Self {
        Self {
            array,
            rows,
            position: 0,
            buffer_rows: buffer_rows.max(1),
            options,
            buffer: VecDeque::new(),
        }
    }

    /// Return the number of rows yet to be yielded.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.rows.len() - self.position + self.buffer.len() as u64
    }

    fn fill(&mut self) -> Result<(), ArrayError> {
        let batch = self.rows.sub_range(self.position, self.buffer_rows);
        self.position += batch.len();
        let selection = self.array.rows_selection("iter_rows", batch)?;
        let physical = self.array.gather_physical(&selection, &self.options)?;
        let kind = *self.array.atom().kind();
        let row_shape = self.array.row_shape();
        let row_bytes = self.array.row_bytes();
        if row_bytes == 0 {
            return Ok(());
        }
        self.buffer.extend(
            batch
                .indices()
                .zip(physical.chunks_exact(row_bytes))
                .map(|(row, bytes)| {
                    (
                        row,
                        ArrayData::new_unchecked(kind, row_shape.clone(), bytes.to_vec()),
                    )
                }),
        );
        Ok(())
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits + 'static> Iterator for RowIterator<'_, TStorage> {
    type Item = Result<(u64, ArrayData), ArrayError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && self.position < self.rows.len() {
            if let Err(err) = self.fill() {
                self.position = self.rows.len();
                return Some(Err(err));
            }
        }
        self.buffer.pop_front().map(Ok)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}
