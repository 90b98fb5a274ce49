//! Store test utilities.

use crate::{
    Bytes, ListableStorageTraits, ReadableStorageTraits, StorageError, StoreKey, StorePrefix,
    WritableStorageTraits,
};

/// Write a set of keys to a store.
///
/// # Errors
/// Returns a [`StorageError`] if an underlying store operation fails.
pub fn store_write<T: ?Sized + WritableStorageTraits>(store: &T) -> Result<(), StorageError> {
    store.erase_prefix(&StorePrefix::root())?;

    store.set(&"a/b".try_into()?, Bytes::from_static(&[0, 1, 2, 3]))?;
    store.set(&"a/c".try_into()?, Bytes::from_static(&[0]))?;
    store.set(&"a/d/e".try_into()?, Bytes::new())?;
    store.set(&"a/f/g".try_into()?, Bytes::from_static(&[0, 1]))?;
    store.set(&"a/f/h".try_into()?, Bytes::from_static(&[0, 1, 2]))?;
    store.set(&"b/c/d".try_into()?, Bytes::from_static(&[0, 1, 2, 3, 4]))?;
    store.set(&"i".try_into()?, Bytes::from_static(&[9]))?;
    store.erase(&"i".try_into()?)?;
    store.erase(&"does/not/exist".try_into()?)?;
    store.erase_prefix(&StorePrefix::new("b/")?)?;
    Ok(())
}

/// Read the keys written by [`store_write`].
///
/// # Errors
/// Returns a [`StorageError`] if an underlying store operation fails.
///
/// # Panics
/// Panics if the store contents do not match.
pub fn store_read<T: ?Sized + ReadableStorageTraits>(store: &T) -> Result<(), StorageError> {
    assert!(store.get(&"notfound".try_into()?)?.is_none());
    assert_eq!(
        store.get(&"a/b".try_into()?)?,
        Some(Bytes::from_static(&[0, 1, 2, 3]))
    );
    assert_eq!(store.get(&"a/d/e".try_into()?)?, Some(Bytes::new()));
    assert!(store.get(&"i".try_into()?)?.is_none());
    assert!(store.get(&"b/c/d".try_into()?)?.is_none());
    Ok(())
}

/// List the keys written by [`store_write`].
///
/// # Errors
/// Returns a [`StorageError`] if an underlying store operation fails.
///
/// # Panics
/// Panics if the store listing does not match.
pub fn store_list<T: ?Sized + ListableStorageTraits>(store: &T) -> Result<(), StorageError> {
    assert_eq!(
        store.list()?,
        vec![
            StoreKey::new("a/b")?,
            StoreKey::new("a/c")?,
            StoreKey::new("a/d/e")?,
            StoreKey::new("a/f/g")?,
            StoreKey::new("a/f/h")?,
        ]
    );
    assert_eq!(
        store.list_prefix(&StorePrefix::new("a/f/")?)?,
        vec![StoreKey::new("a/f/g")?, StoreKey::new("a/f/h")?]
    );
    assert!(store.list_prefix(&StorePrefix::new("b/")?)?.is_empty());
    Ok(())
}
