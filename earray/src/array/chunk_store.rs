//! The chunk store of an earray.
//!
//! A [`ChunkStore`] maps a chunk index along the extensible dimension to the bytes of `chunk_rows` rows.
//! Rows are held in physical order: the extensible dimension first, followed by the remaining axes in declared order.
//!
//! Completed chunks are encoded with the [`FilterPipeline`] and stored at `{path}/c/{index}` as soon as they are filled.
//! The last, partially filled chunk is kept raw in memory as the *tail* until it is completed or [flushed](ChunkStore::flush).
//! A partial chunk is stored with exactly the rows it holds.

use std::ops::Range;
use std::sync::Arc;

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use super::{ArrayError, FilterPipeline, codec::CodecOptions};
use crate::node::{NodePath, chunk_key};
use crate::storage::{
    Bytes, MaybeBytes, ReadableStorageTraits, ReadableWritableStorageTraits, StorageError,
    StoreKey,
};

/// The raw bytes of the last, partially filled chunk.
#[derive(Clone, Debug)]
struct TailChunk {
    index: u64,
    bytes: Vec<u8>,
    dirty: bool,
}

/// A write of whole rows into one chunk.
#[derive(Clone, Debug)]
pub(crate) struct ChunkWrite {
    pub(crate) index: u64,
    pub(crate) row_offset: u64,
    pub(crate) bytes: Vec<u8>,
}

/// The in-memory state of a [`ChunkStore`], used to undo an operation.
#[derive(Clone, Debug)]
pub(crate) struct ChunkStoreSnapshot {
    nrows: u64,
    tail: Option<TailChunk>,
}

/// The previous values of the keys changed by an operation.
///
/// Rolling back restores every key in reverse order.
#[derive(Debug, Default)]
#[must_use]
pub(crate) struct Journal {
    entries: Vec<(StoreKey, MaybeBytes)>,
}

impl Journal {
    /// Store `value` at `key`, reading the previous value if the key may exist.
    fn set<TStorage: ?Sized + ReadableWritableStorageTraits>(
        &mut self,
        storage: &TStorage,
        key: StoreKey,
        value: Vec<u8>,
        may_exist: bool,
    ) -> Result<(), StorageError> {
        let previous = if may_exist { storage.get(&key)? } else { None };
        self.entries.push((key.clone(), previous));
        storage.set(&key, Bytes::from(value))
    }

    fn erase<TStorage: ?Sized + ReadableWritableStorageTraits>(
        &mut self,
        storage: &TStorage,
        key: StoreKey,
    ) -> Result<(), StorageError> {
        let previous = storage.get(&key)?;
        self.entries.push((key.clone(), previous));
        storage.erase(&key)
    }

    /// Restore the previous value of every changed key.
    pub(crate) fn rollback<TStorage: ?Sized + ReadableWritableStorageTraits>(self, storage: &TStorage) {
        for (key, previous) in self.entries.into_iter().rev() {
            let result = match previous {
                Some(bytes) => storage.set(&key, bytes),
                None => storage.erase(&key),
            };
            if let Err(err) = result {
                log::warn!("failed to restore {key} while rolling back: {err}");
            }
        }
    }
}

/// Chunked row storage of an earray.
#[derive(Debug)]
pub struct ChunkStore<TStorage: ?Sized> {
    storage: Arc<TStorage>,
    path: NodePath,
    chunk_rows: u64,
    row_bytes: usize,
    pipeline: FilterPipeline,
    nrows: u64,
    tail: Option<TailChunk>,
}

impl<TStorage: ?Sized> ChunkStore<TStorage> {
    /// Create a chunk store for the earray at `path` currently holding `nrows` rows.
    pub(crate) fn new(
        storage: Arc<TStorage>,
        path: NodePath,
        chunk_rows: u64,
        row_bytes: usize,
        pipeline: FilterPipeline,
        nrows: u64,
    ) -> Self {
        Self {
            storage,
            path,
            chunk_rows,
            row_bytes,
            pipeline,
            nrows,
            tail: None,
        }
    }

    /// Return the number of rows.
    #[must_use]
    pub const fn nrows(&self) -> u64 {
        self.nrows
    }

    /// Return the number of rows per chunk.
    #[must_use]
    pub const fn chunk_rows(&self) -> u64 {
        self.chunk_rows
    }

    /// Return the size of a row in bytes.
    #[must_use]
    pub const fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    /// Return the filter pipeline.
    #[must_use]
    pub const fn pipeline(&self) -> &FilterPipeline {
        &self.pipeline
    }

    /// Return the number of chunks holding at least one row.
    #[must_use]
    pub const fn num_chunks(&self) -> u64 {
        self.nrows.div_ceil(self.chunk_rows)
    }

    /// Return the index of the chunk holding `row`.
    #[must_use]
    pub const fn chunk_index(&self, row: u64) -> u64 {
        row / self.chunk_rows
    }

    /// Return the rows held by chunk `index`.
    #[must_use]
    pub fn chunk_row_range(&self, index: u64) -> Range<u64> {
        let start = index.saturating_mul(self.chunk_rows);
        start.min(self.nrows)..start.saturating_add(self.chunk_rows).min(self.nrows)
    }

    /// Return true if the last chunk holds rows that have not been stored.
    #[must_use]
    pub fn has_unflushed_rows(&self) -> bool {
        self.tail.as_ref().is_some_and(|tail| tail.dirty)
    }

    pub(crate) fn snapshot(&self) -> ChunkStoreSnapshot {
        ChunkStoreSnapshot {
            nrows: self.nrows,
            tail: self.tail.clone(),
        }
    }

    pub(crate) fn restore(&mut self, snapshot: ChunkStoreSnapshot) {
        self.nrows = snapshot.nrows;
        self.tail = snapshot.tail;
    }

    fn chunk_not_found(&self, index: u64) -> ArrayError {
        let start = index.saturating_mul(self.chunk_rows);
        ArrayError::ChunkNotFound {
            path: self.path.clone(),
            index,
            rows: start..start.saturating_add(self.chunk_rows),
            nrows: self.nrows,
        }
    }

    fn raw_length(&self, rows: u64) -> Result<usize, ArrayError> {
        usize::try_from(rows)
            .ok()
            .and_then(|rows| rows.checked_mul(self.row_bytes))
            .ok_or_else(|| ArrayError::SizeOverflow(format!("{rows} rows of chunk")))
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> ChunkStore<TStorage> {
    /// Read and decode chunk `index`.
    ///
    /// The returned bytes hold every row of the chunk, which is fewer than `chunk_rows` for the last chunk.
    ///
    /// # Errors
    /// Returns
    ///  - [`ArrayError::ChunkNotFound`] if the chunk is beyond the rows of the array or is missing from the store,
    ///  - [`ArrayError::FilterError`] if decoding fails, including a checksum mismatch, or
    ///  - [`ArrayError::StorageError`] if there is an underlying error with the store.
    pub fn read_chunk(&self, index: u64, options: &CodecOptions) -> Result<Vec<u8>, ArrayError> {
        let rows = self.chunk_row_range(index);
        if rows.is_empty() {
            return Err(self.chunk_not_found(index));
        }
        if let Some(tail) = self.tail.as_ref().filter(|tail| tail.index == index) {
            return Ok(tail.bytes.clone());
        }
        let stored = self
            .storage
            .get(&chunk_key(&self.path, index))?
            .ok_or_else(|| self.chunk_not_found(index))?;
        let expected = self.raw_length(rows.end - rows.start)?;
        self.pipeline
            .decode(&stored, expected, options)
            .map_err(|source| ArrayError::FilterError {
                path: self.path.clone(),
                index,
                source,
            })
    }
}

impl<TStorage: ?Sized + ReadableWritableStorageTraits> ChunkStore<TStorage> {
    /// Write whole rows into chunk `index`, starting at `row_offset` rows into the chunk.
    ///
    /// The chunk is created if absent, and the rows may extend the array.
    /// A completed chunk is encoded and stored, a partial last chunk is buffered until it is completed or flushed.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `bytes` is not a whole number of rows,
    ///  - the rows would pass the end of the chunk or leave a gap after the last row, or
    ///  - there is an error decoding, encoding or storing a chunk.
    ///
    /// The store is left unchanged on error.
    pub fn write_chunk(
        &mut self,
        index: u64,
        row_offset: u64,
        bytes: &[u8],
        options: &CodecOptions,
    ) -> Result<(), ArrayError> {
        self.apply_writes(
            vec![ChunkWrite {
                index,
                row_offset,
                bytes: bytes.to_vec(),
            }],
            options,
        )
        .map(drop)
    }

    /// Append rows in physical order after the last row.
    ///
    /// # Errors
    /// See [`write_chunk`](ChunkStore::write_chunk).
    pub(crate) fn append_rows(&mut self, bytes: &[u8], options: &CodecOptions) -> Result<(), ArrayError> {
        if bytes.is_empty() {
            return Ok(());
        }
        let rows = self.rows_of(bytes)?;
        let mut writes = Vec::new();
        let mut row = self.nrows;
        let end = self.nrows + rows;
        let mut offset = 0;
        while row < end {
            let index = self.chunk_index(row);
            let row_offset = row - index * self.chunk_rows;
            let count = (self.chunk_rows - row_offset).min(end - row);
            let length = self.raw_length(count)?;
            writes.push(ChunkWrite {
                index,
                row_offset,
                bytes: bytes[offset..offset + length].to_vec(),
            });
            offset += length;
            row += count;
        }
        self.apply_writes(writes, options).map(drop)
    }

    fn rows_of(&self, bytes: &[u8]) -> Result<u64, ArrayError> {
        if self.row_bytes == 0 || bytes.len() % self.row_bytes != 0 {
            return Err(ArrayError::Other(format!(
                "{} bytes is not a whole number of {}-byte rows",
                bytes.len(),
                self.row_bytes
            )));
        }
        Ok((bytes.len() / self.row_bytes) as u64)
    }

    /// Apply writes to chunks, storing completed chunks and buffering a partial last chunk.
    ///
    /// Either every write is applied or the store and the chunk store are left unchanged.
    pub(crate) fn apply_writes(
        &mut self,
        writes: Vec<ChunkWrite>,
        options: &CodecOptions,
    ) -> Result<Journal, ArrayError> {
        let stored_chunks = self.num_chunks();
        let mut nrows = self.nrows;
        let mut contents: Vec<(u64, Vec<u8>)> = Vec::new();
        for write in writes {
            let rows = self.rows_of(&write.bytes)?;
            let start = write.index.saturating_mul(self.chunk_rows) + write.row_offset;
            if write.row_offset + rows > self.chunk_rows || start > nrows {
                return Err(ArrayError::Other(format!(
                    "cannot write rows {}..{} of chunk {} holding at most {} rows at {}: the array has {nrows} rows",
                    write.row_offset,
                    write.row_offset + rows,
                    write.index,
                    self.chunk_rows,
                    self.path
                )));
            }
            let position = if let Some(position) =
                contents.iter().position(|(index, _)| *index == write.index)
            {
                position
            } else {
                let content = if write.index < stored_chunks {
                    self.read_chunk(write.index, options)?
                } else {
                    Vec::new()
                };
                contents.push((write.index, content));
                contents.len() - 1
            };
            let content = &mut contents[position].1;
            let offset = self.raw_length(write.row_offset)?;
            let end = offset + write.bytes.len();
            if content.len() < end {
                content.resize(end, 0);
            }
            content[offset..end].copy_from_slice(&write.bytes);
            nrows = nrows.max(start + rows);
        }
        contents.sort_by_key(|(index, _)| *index);

        let chunk_length = self.raw_length(self.chunk_rows)?;
        let (complete, partial): (Vec<_>, Vec<_>) = contents
            .into_iter()
            .partition(|(_, content)| content.len() == chunk_length);
        let last_chunk = nrows.div_ceil(self.chunk_rows).saturating_sub(1);
        if partial.iter().any(|(index, _)| *index != last_chunk) {
            return Err(ArrayError::Other(format!(
                "only the last chunk of {} may be partially filled",
                self.path
            )));
        }

        let mut journal = Journal::default();
        if let Err(err) = self.store_chunks(&complete, stored_chunks, options, &mut journal) {
            journal.rollback(&*self.storage);
            return Err(err);
        }

        self.nrows = nrows;
        let completed_tail = self
            .tail
            .as_ref()
            .is_some_and(|tail| complete.iter().any(|(index, _)| *index == tail.index));
        if completed_tail {
            self.tail = None;
        }
        if let Some((index, bytes)) = partial.into_iter().next() {
            self.tail = Some(TailChunk {
                index,
                bytes,
                dirty: true,
            });
        }
        Ok(journal)
    }

    /// Encode chunks in parallel batches of `concurrent_target` chunks and store them.
    fn store_chunks(
        &self,
        chunks: &[(u64, Vec<u8>)],
        stored_chunks: u64,
        options: &CodecOptions,
        journal: &mut Journal,
    ) -> Result<(), ArrayError> {
        for batch in chunks.chunks(options.concurrent_target()) {
            let encoded = batch
                .par_iter()
                .map(|(index, content)| {
                    self.pipeline
                        .encode(content, options)
                        .map(|encoded| (*index, encoded))
                        .map_err(|source| ArrayError::FilterError {
                            path: self.path.clone(),
                            index: *index,
                            source,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            for (index, encoded) in encoded {
                log::debug!(
                    "storing chunk {index} of {} ({} bytes encoded)",
                    self.path,
                    encoded.len()
                );
                let may_exist = index < stored_chunks;
                journal.set(
                    &*self.storage,
                    chunk_key(&self.path, index),
                    encoded,
                    may_exist,
                )?;
            }
        }
        Ok(())
    }

    /// Store the partial last chunk if it holds rows that have not been stored.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if encoding or storing the chunk fails.
    pub fn flush(&mut self, options: &CodecOptions) -> Result<(), ArrayError> {
        let Some(tail) = self.tail.as_mut().filter(|tail| tail.dirty) else {
            return Ok(());
        };
        let encoded = self
            .pipeline
            .encode(&tail.bytes, options)
            .map_err(|source| ArrayError::FilterError {
                path: self.path.clone(),
                index: tail.index,
                source,
            })?;
        self.storage
            .set(&chunk_key(&self.path, tail.index), Bytes::from(encoded))?;
        tail.dirty = false;
        Ok(())
    }

    /// Truncate to `nrows` rows.
    ///
    /// Chunks entirely beyond `nrows` are erased and a chunk left partially filled is rewritten with exactly its remaining rows.
    /// The row count is updated only once every chunk has been rewritten or erased.
    /// Truncating to `nrows` at or above the current row count does nothing.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if a chunk cannot be read, encoded, stored or erased.
    /// The store is left unchanged on error.
    pub fn truncate_at(&mut self, nrows: u64, options: &CodecOptions) -> Result<(), ArrayError> {
        self.truncate_journaled(nrows, options).map(drop)
    }

    pub(crate) fn truncate_journaled(
        &mut self,
        nrows: u64,
        options: &CodecOptions,
    ) -> Result<Journal, ArrayError> {
        let mut journal = Journal::default();
        if nrows >= self.nrows {
            return Ok(journal);
        }
        match self.truncate_chunks(nrows, options, &mut journal) {
            Ok(tail) => {
                self.nrows = nrows;
                self.tail = tail;
                Ok(journal)
            }
            Err(err) => {
                journal.rollback(&*self.storage);
                Err(err)
            }
        }
    }

    fn truncate_chunks(
        &self,
        nrows: u64,
        options: &CodecOptions,
        journal: &mut Journal,
    ) -> Result<Option<TailChunk>, ArrayError> {
        let old_chunks = self.num_chunks();
        let new_chunks = nrows.div_ceil(self.chunk_rows);
        let mut tail = None;
        if new_chunks > 0 {
            let index = new_chunks - 1;
            let rows = nrows - index * self.chunk_rows;
            let old_rows = self.chunk_row_range(index);
            if rows != old_rows.end - old_rows.start {
                let mut content = self.read_chunk(index, options)?;
                content.truncate(self.raw_length(rows)?);
                let encoded = self.pipeline.encode(&content, options).map_err(|source| {
                    ArrayError::FilterError {
                        path: self.path.clone(),
                        index,
                        source,
                    }
                })?;
                log::debug!("rewriting chunk {index} of {} with {rows} rows", self.path);
                journal.set(&*self.storage, chunk_key(&self.path, index), encoded, true)?;
                if rows < self.chunk_rows {
                    tail = Some(TailChunk {
                        index,
                        bytes: content,
                        dirty: false,
                    });
                }
            }
        }
        for index in new_chunks..old_chunks {
            log::debug!("erasing chunk {index} of {}", self.path);
            journal.erase(&*self.storage, chunk_key(&self.path, index))?;
        }
        Ok(tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::Filters;
    use crate::storage::store::MemoryStore;
    use crate::storage::{ListableStorageTraits, WritableStorageTraits};

    fn chunk_store(filters: Filters) -> ChunkStore<MemoryStore> {
        ChunkStore::new(
            Arc::new(MemoryStore::new()),
            NodePath::new("/a").unwrap(),
            4,
            2,
            FilterPipeline::from_filters(&filters, 2),
            0,
        )
    }

    fn rows(range: Range<u8>) -> Vec<u8> {
        range.flat_map(|row| [row, row]).collect()
    }

    #[test]
    fn chunk_store_append() {
        let options = CodecOptions::default();
        let mut store = chunk_store(Filters::default().with_complevel(5).with_fletcher32(true));
        store.append_rows(&rows(0..6), &options).unwrap();
        assert_eq!(store.nrows(), 6);
        assert_eq!(store.num_chunks(), 2);
        assert!(store.has_unflushed_rows());
        assert!(store.storage.get(&chunk_key(&store.path, 0)).unwrap().is_some());
        assert!(store.storage.get(&chunk_key(&store.path, 1)).unwrap().is_none());
        assert_eq!(store.read_chunk(0, &options).unwrap(), rows(0..4));
        assert_eq!(store.read_chunk(1, &options).unwrap(), rows(4..6));
        assert!(matches!(
            store.read_chunk(2, &options),
            Err(ArrayError::ChunkNotFound { index: 2, .. })
        ));

        store.flush(&options).unwrap();
        assert!(!store.has_unflushed_rows());
        assert!(store.storage.get(&chunk_key(&store.path, 1)).unwrap().is_some());

        store.append_rows(&rows(6..9), &options).unwrap();
        assert_eq!(store.nrows(), 9);
        assert_eq!(store.read_chunk(1, &options).unwrap(), rows(4..8));
        assert_eq!(store.read_chunk(2, &options).unwrap(), rows(8..9));
    }

    #[test]
    fn chunk_store_write_chunk() {
        let options = CodecOptions::default();
        let mut store = chunk_store(Filters::default());
        store.write_chunk(0, 0, &rows(0..4), &options).unwrap();
        store.write_chunk(1, 0, &rows(4..5), &options).unwrap();
        store.write_chunk(0, 1, &rows(9..11), &options).unwrap();
        assert_eq!(store.nrows(), 5);
        assert_eq!(
            store.read_chunk(0, &options).unwrap(),
            [rows(0..1), rows(9..11), rows(3..4)].concat()
        );
        // past the end of the chunk
        assert!(store.write_chunk(1, 3, &rows(0..2), &options).is_err());
        // gap after the last row
        assert!(store.write_chunk(1, 2, &rows(0..1), &options).is_err());
        assert!(store.write_chunk(1, 0, &[0; 3], &options).is_err());
        assert_eq!(store.nrows(), 5);
    }

    #[test]
    fn chunk_store_truncate() {
        let options = CodecOptions::default();
        let mut store = chunk_store(Filters::default().with_complevel(1));
        store.append_rows(&rows(0..10), &options).unwrap();
        store.flush(&options).unwrap();

        store.truncate_at(20, &options).unwrap();
        assert_eq!(store.nrows(), 10);

        store.truncate_at(6, &options).unwrap();
        assert_eq!(store.nrows(), 6);
        assert!(store.storage.get(&chunk_key(&store.path, 2)).unwrap().is_none());
        assert_eq!(store.read_chunk(1, &options).unwrap(), rows(4..6));
        store.truncate_at(6, &options).unwrap();
        assert_eq!(store.nrows(), 6);

        store.truncate_at(4, &options).unwrap();
        assert_eq!(store.num_chunks(), 1);
        assert!(store.storage.get(&chunk_key(&store.path, 1)).unwrap().is_none());
        assert_eq!(store.read_chunk(0, &options).unwrap(), rows(0..4));

        store.truncate_at(0, &options).unwrap();
        assert_eq!(store.nrows(), 0);
        assert!(store.storage.list().unwrap().is_empty());
    }

    #[test]
    fn chunk_store_checksum_failure() {
        let options = CodecOptions::default();
        let mut store = chunk_store(Filters::default().with_fletcher32(true));
        store.append_rows(&rows(0..4), &options).unwrap();
        let key = chunk_key(&store.path, 0);
        let mut stored = store.storage.get(&key).unwrap().unwrap().to_vec();
        stored[0] ^= 0xff;
        store.storage.set(&key, Bytes::from(stored)).unwrap();
        assert!(matches!(
            store.read_chunk(0, &options),
            Err(ArrayError::FilterError { index: 0, .. })
        ));
    }
}
