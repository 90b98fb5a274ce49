use auto_impl::auto_impl;

use super::{Bytes, MaybeBytes, StorageError, StoreKey, StoreKeys, StorePrefix};

/// A store that values can be read from.
///
/// Chunks and metadata documents are always read whole.
#[auto_impl(Arc)]
pub trait ReadableStorageTraits: Send + Sync {
    /// Return the value stored at `key`, or [`None`] if there is none.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the store fails.
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError>;
}

/// A store that can enumerate its keys.
#[auto_impl(Arc)]
pub trait ListableStorageTraits: Send + Sync {
    /// Return every key in the store, in order.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the store fails.
    fn list(&self) -> Result<StoreKeys, StorageError> {
        self.list_prefix(&StorePrefix::root())
    }

    /// Return the keys below `prefix`, in order.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the store fails.
    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError>;
}

/// A store that values can be written to and erased from.
#[auto_impl(Arc)]
pub trait WritableStorageTraits: Send + Sync {
    /// Store `value` at `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns [`StorageError::ReadOnly`] for a read only store, or another [`StorageError`] if the store fails.
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError>;

    /// Erase the value at `key`. Erasing a missing key succeeds.
    ///
    /// # Errors
    /// Returns [`StorageError::ReadOnly`] for a read only store, or another [`StorageError`] if the store fails.
    fn erase(&self, key: &StoreKey) -> Result<(), StorageError>;

    /// Erase every value below `prefix`.
    ///
    /// The root prefix clears the store.
    ///
    /// # Errors
    /// Returns [`StorageError::ReadOnly`] for a read only store, or another [`StorageError`] if the store fails.
    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError>;
}

/// A store that is both readable and writable, as needed to append to an earray.
pub trait ReadableWritableStorageTraits: ReadableStorageTraits + WritableStorageTraits {}

impl<T: ?Sized + ReadableStorageTraits + WritableStorageTraits> ReadableWritableStorageTraits
    for T
{
}

/// A readable and writable store that can also enumerate its keys, as needed by a container.
pub trait ReadableWritableListableStorageTraits:
    ReadableWritableStorageTraits + ListableStorageTraits
{
}

impl<T: ?Sized + ReadableWritableStorageTraits + ListableStorageTraits>
    ReadableWritableListableStorageTraits for T
{
}
