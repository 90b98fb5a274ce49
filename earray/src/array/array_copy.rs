use std::sync::Arc;

use super::{ArrayBuilder, ArrayCreateError, ArrayError, EArray, ReadOptions, RowRange};
use crate::attributes::{retrieve_attributes, store_attributes};
use crate::indexer::ResolvedAxis;
use crate::node::{NodePath, NodeSnapshot, check_leaf, erase_node, node_exists};
use crate::storage::{
    ReadableStorageTraits, ReadableWritableListableStorageTraits, ReadableWritableStorageTraits,
};

/// Options for copying an earray with [`EArray::copy_to`].
#[derive(Clone, Debug)]
pub struct CopyOptions {
    range: RowRange,
    title: Option<String>,
    copy_user_attrs: bool,
    chunk_rows: Option<u64>,
    overwrite: bool,
    read_options: ReadOptions,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            range: RowRange::all(),
            title: None,
            copy_user_attrs: true,
            chunk_rows: None,
            overwrite: false,
            read_options: ReadOptions::default(),
        }
    }
}

impl CopyOptions {
    /// Return the rows to copy.
    #[must_use]
    pub const fn range(&self) -> RowRange {
        self.range
    }

    /// Set the rows to copy.
    pub fn set_range(&mut self, range: RowRange) -> &mut Self {
        self.range = range;
        self
    }

    /// Set the rows to copy.
    #[must_use]
    pub fn with_range(mut self, range: RowRange) -> Self {
        self.range = range;
        self
    }

    /// Return the title of the copy, or [`None`] to keep the title of the source.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Set the title of the copy.
    pub fn set_title(&mut self, title: Option<String>) -> &mut Self {
        self.title = title;
        self
    }

    /// Set the title of the copy.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Return true if user attributes are copied. Defaults to true.
    #[must_use]
    pub const fn copy_user_attrs(&self) -> bool {
        self.copy_user_attrs
    }

    /// Set whether user attributes are copied.
    pub fn set_copy_user_attrs(&mut self, copy_user_attrs: bool) -> &mut Self {
        self.copy_user_attrs = copy_user_attrs;
        self
    }

    /// Set whether user attributes are copied.
    #[must_use]
    pub fn with_copy_user_attrs(mut self, copy_user_attrs: bool) -> Self {
        self.copy_user_attrs = copy_user_attrs;
        self
    }

    /// Return the number of rows per chunk of the copy, or [`None`] to keep the chunk size of the source.
    #[must_use]
    pub const fn chunk_rows(&self) -> Option<u64> {
        self.chunk_rows
    }

    /// Set the number of rows per chunk of the copy.
    pub fn set_chunk_rows(&mut self, chunk_rows: Option<u64>) -> &mut Self {
        self.chunk_rows = chunk_rows;
        self
    }

    /// Set the number of rows per chunk of the copy.
    #[must_use]
    pub fn with_chunk_rows(mut self, chunk_rows: u64) -> Self {
        self.chunk_rows = Some(chunk_rows);
        self
    }

    /// Return true if an existing node at the destination is replaced. Defaults to false.
    #[must_use]
    pub const fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Set whether an existing node at the destination is replaced.
    pub fn set_overwrite(&mut self, overwrite: bool) -> &mut Self {
        self.overwrite = overwrite;
        self
    }

    /// Set whether an existing node at the destination is replaced.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Return the options used to read the source.
    #[must_use]
    pub const fn read_options(&self) -> &ReadOptions {
        &self.read_options
    }

    /// Set the options used to read the source.
    pub fn set_read_options(&mut self, read_options: ReadOptions) -> &mut Self {
        self.read_options = read_options;
        self
    }

    /// Set the options used to read the source.
    #[must_use]
    pub fn with_read_options(mut self, read_options: ReadOptions) -> Self {
        self.read_options = read_options;
        self
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits + 'static> EArray<TStorage> {
    /// Copy rows of the array to a new earray at `dest_path` in `dest_storage`.
    ///
    /// The copy has the shape, atom, filters, flavor and title of this array and holds the rows selected by [`CopyOptions::range`].
    /// It may be chunked differently with [`CopyOptions::with_chunk_rows`].
    /// Rows are copied [`buffer_rows`](ReadOptions::buffer_rows) at a time and the returned copy is open and flushed.
    ///
    /// A node replaced with [`CopyOptions::with_overwrite`] is restored if the copy fails.
    ///
    /// # Errors
    /// Returns
    ///  - [`ArrayError::InvalidState`] if the array is not open,
    ///  - [`ArrayError::IndexError`] if the range is invalid,
    ///  - [`ArrayCreateError::CopyOntoItself`] if the destination is this array,
    ///  - [`ArrayCreateError::NodeExists`] if a node exists at the destination and overwriting is disabled,
    ///  - [`ArrayCreateError::InsideEArray`] or [`ArrayCreateError::EArrayBelow`] if the destination would nest earrays, or
    ///  - an [`ArrayError`] if reading or writing fails, in which case the destination is left as it was.
    pub fn copy_to<TDest: ?Sized + ReadableWritableListableStorageTraits + 'static>(
        &self,
        dest_storage: Arc<TDest>,
        dest_path: &str,
        options: &CopyOptions,
    ) -> Result<EArray<TDest>, ArrayError> {
        self.check_open("copy")?;
        let rows = options
            .range
            .resolve(self.nrows())
            .map_err(|source| self.index_error("copy", options.range.to_string(), source))?;
        let dest_node = NodePath::new(dest_path).map_err(ArrayCreateError::from)?;
        if dest_node == self.path
            && std::ptr::addr_eq(Arc::as_ptr(&self.storage), Arc::as_ptr(&dest_storage))
        {
            return Err(ArrayCreateError::CopyOntoItself(dest_node).into());
        }
        check_leaf(&*dest_storage, &dest_node)?;
        let replaced = if node_exists(&*dest_storage, &dest_node)? {
            if !options.overwrite {
                return Err(ArrayCreateError::NodeExists(dest_node).into());
            }
            let snapshot = NodeSnapshot::take(&*dest_storage, &dest_node)?;
            erase_node(&*dest_storage, &dest_node)?;
            Some(snapshot)
        } else {
            None
        };

        let mut builder = ArrayBuilder::from_array(self);
        if let Some(chunk_rows) = options.chunk_rows {
            builder.chunk_rows(chunk_rows);
        }
        if let Some(title) = &options.title {
            builder.title(title.clone());
        }
        let result = builder
            .build(dest_storage.clone(), dest_path)
            .map_err(ArrayError::from)
            .and_then(|mut dest| self.copy_rows(&mut dest, rows, options).map(|()| dest));
        if let Err(err) = &result {
            log::debug!("copy of {} to {dest_node} failed: {err}", self.path);
            let restored = match replaced {
                Some(snapshot) => snapshot.restore(&*dest_storage),
                None => erase_node(&*dest_storage, &dest_node),
            };
            if let Err(restore_err) = restored {
                log::warn!("failed to restore {dest_node} after a failed copy: {restore_err}");
            }
        }
        result
    }

    fn copy_rows<TDest: ?Sized + ReadableWritableStorageTraits + 'static>(
        &self,
        dest: &mut EArray<TDest>,
        rows: ResolvedAxis,
        options: &CopyOptions,
    ) -> Result<(), ArrayError> {
        dest.store_metadata()?;
        if options.copy_user_attrs {
            let attributes = retrieve_attributes(&*self.storage, &self.path)?;
            if !attributes.is_empty() {
                store_attributes(&*dest.storage, &dest.path, &attributes)?;
            }
        }

        let read_options = &options.read_options;
        let codec_options = read_options.codec_options();
        let buffer_rows = read_options.effective_buffer_rows(self.row_bytes() as u64);
        let mut position = 0;
        while position < rows.len() {
            let batch = rows.sub_range(position, buffer_rows);
            position += batch.len();
            let selection = self.rows_selection("copy", batch)?;
            let physical = self.gather_physical(&selection, read_options)?;
            dest.chunk_store.append_rows(&physical, codec_options)?;
            dest.metadata.nrows = dest.chunk_store.nrows();
        }
        dest.flush_opt(codec_options)
    }
}
