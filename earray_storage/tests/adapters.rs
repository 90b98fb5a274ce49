#![allow(missing_docs)]

use std::error::Error;
use std::sync::Arc;

use earray_storage::storage_adapter::performance_metrics::PerformanceMetricsStorageAdapter;
use earray_storage::store::MemoryStore;
use earray_storage::{
    Bytes, ListableStorageTraits, ReadableStorageTraits, ReadableWritableListableStorageTraits,
    StoreKey, StorePrefix, WritableStorageTraits,
};

#[test]
fn performance_metrics_memory_store() -> Result<(), Box<dyn Error>> {
    let store = Arc::new(MemoryStore::new());
    let store = Arc::new(PerformanceMetricsStorageAdapter::new(store));
    store.set(&StoreKey::new("array/c/0")?, Bytes::from_static(&[1, 2, 3, 4]))?;
    store.set(&StoreKey::new("array/c/1")?, Bytes::from_static(&[5, 6]))?;
    assert_eq!(store.bytes_written(), 6);
    assert_eq!(store.list_prefix(&StorePrefix::new("array/c/")?)?.len(), 2);
    assert_eq!(
        store.get(&StoreKey::new("array/c/1")?)?,
        Some(Bytes::from_static(&[5, 6]))
    );
    assert_eq!(store.reads(), 1);
    store.erase(&StoreKey::new("array/c/0")?)?;
    store.erase(&StoreKey::new("array/c/1")?)?;
    assert_eq!(store.keys_erased(), 2);
    assert!(store.list()?.is_empty());
    Ok(())
}

#[test]
fn performance_metrics_dyn_store() -> Result<(), Box<dyn Error>> {
    let store: Arc<dyn ReadableWritableListableStorageTraits> = Arc::new(MemoryStore::new());
    let store = Arc::new(PerformanceMetricsStorageAdapter::new(store));
    store.set(&StoreKey::new("a/b")?, Bytes::from_static(&[0]))?;
    store.set(&StoreKey::new("c")?, Bytes::from_static(&[0]))?;
    store.erase_prefix(&StorePrefix::new("a/")?)?;
    assert_eq!(store.list()?, vec![StoreKey::new("c")?]);
    store.erase_prefix(&StorePrefix::root())?;
    assert!(store.list()?.is_empty());
    Ok(())
}
