#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use earray::array::{
    ArrayBuilder, ArrayCreateError, ArrayError, AtomKind, Complib, CopyOptions, EArray, Filters,
    RowRange,
};
use earray::indexer::{AxisSelector, SliceSpec};
use earray::node::{NodePath, chunk_prefix};
use earray::storage::store::MemoryStore;
use earray::storage::{
    Bytes, ListableStorageTraits, MaybeBytes, ReadableStorageTraits, StorageError, StoreKey,
    StorePrefix, WritableStorageTraits,
};

fn source_array(
    store: Arc<MemoryStore>,
    nrows: i64,
) -> Result<EArray<MemoryStore>, Box<dyn std::error::Error>> {
    let mut array = ArrayBuilder::new(vec![0, 2], AtomKind::Float64)
        .chunk_rows(8)
        .filters(
            Filters::new()
                .with_complevel(3)
                .with_complib(Complib::Zlib)
                .with_shuffle(true)
                .with_fletcher32(true),
        )
        .title("source")
        .build(store, "/source")?;
    array.store_metadata()?;
    #[allow(clippy::cast_precision_loss)]
    let elements: Vec<f64> = (0..nrows * 2).map(|i| i as f64 * 0.5).collect();
    array.append((elements.as_slice(), &[nrows.unsigned_abs(), 2][..]))?;
    Ok(array)
}

#[test]
fn earray_copy_range() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let source = source_array(store.clone(), 100)?;

    let dest_store = Arc::new(MemoryStore::new());
    let options = CopyOptions::default().with_range(RowRange::new(Some(0), Some(7), Some(1)));
    let dest = source.copy_to(dest_store.clone(), "/dest", &options)?;
    assert_eq!(dest.nrows(), 7);
    assert_eq!(dest.shape(), vec![7, 2]);
    assert_eq!(dest.atom(), source.atom());
    assert_eq!(dest.filters(), source.filters());
    assert_eq!(dest.title(), "source");
    let expected = source.get_item(&[AxisSelector::Slice(SliceSpec::new(
        Some(0),
        Some(7),
        Some(1),
    ))])?;
    assert_eq!(dest.read(RowRange::all())?, expected);

    // the copy is complete in the store
    let reopened = EArray::open(dest_store, "/dest")?;
    assert_eq!(reopened.nrows(), 7);
    assert_eq!(reopened.read(RowRange::all())?, expected);
    Ok(())
}

#[test]
fn earray_copy_rechunked_strided() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let source = source_array(store.clone(), 100)?;
    let options = CopyOptions::default()
        .with_range(RowRange::new(Some(5), Some(95), Some(3)))
        .with_chunk_rows(7)
        .with_title("strided");
    let dest = source.copy_to(store, "/dest", &options)?;
    assert_eq!(dest.nrows(), 30);
    assert_eq!(dest.chunk_rows(), 7);
    assert_eq!(dest.title(), "strided");
    assert_eq!(
        dest.read(RowRange::all())?,
        source.read(RowRange::new(Some(5), Some(95), Some(3)))?
    );
    assert_eq!(dest.read_elements::<f64>(RowRange::new(Some(-1), None, None))?, vec![92.0, 92.5]);
    Ok(())
}

#[test]
fn earray_copy_empty_range() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let source = source_array(store.clone(), 10)?;
    let dest = source.copy_to(
        store,
        "/dest",
        &CopyOptions::default().with_range(RowRange::span(20, 30)),
    )?;
    assert_eq!(dest.nrows(), 0);
    assert_eq!(dest.read(RowRange::all())?.shape(), &[0, 2]);
    Ok(())
}

#[test]
fn earray_truncate() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let mut array = source_array(store.clone(), 30)?;
    array.flush()?;
    let path = NodePath::new("/source")?;
    assert_eq!(store.list_prefix(&chunk_prefix(&path))?.len(), 4);
    let before = array.read(RowRange::all())?;

    // at or above nrows is a no-op
    array.truncate(30)?;
    array.truncate(100)?;
    assert_eq!(array.read(RowRange::all())?, before);

    array.truncate(11)?;
    assert_eq!(array.nrows(), 11);
    assert_eq!(store.list_prefix(&chunk_prefix(&path))?.len(), 2);
    let once = array.read(RowRange::all())?;
    array.truncate(11)?;
    assert_eq!(array.read(RowRange::all())?, once);
    assert_eq!(
        array.read_elements::<f64>(RowRange::all())?,
        before.to_elements::<f64>()?[..22].to_vec()
    );

    // appends continue from the truncated end
    array.append((&[-1.0f64, -2.0][..], &[1u64, 2][..]))?;
    assert_eq!(array.nrows(), 12);
    assert_eq!(array.read_elements::<f64>(RowRange::new(Some(-1), None, None))?, vec![-1.0, -2.0]);
    array.close()?;

    let mut array = EArray::open(store.clone(), "/source")?;
    assert_eq!(array.nrows(), 12);
    array.truncate(0)?;
    assert_eq!(array.nrows(), 0);
    assert!(store.list_prefix(&chunk_prefix(&path))?.is_empty());
    assert_eq!(EArray::open(store, "/source")?.nrows(), 0);
    Ok(())
}

/// A memory store that can be made to fail reads or erasures.
#[derive(Debug, Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_get: AtomicBool,
    fail_erase: AtomicBool,
}

impl ReadableStorageTraits for FlakyStore {
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        if self.fail_get.load(Ordering::SeqCst) {
            Err(StorageError::Other(format!("cannot read {key}")))
        } else {
            self.inner.get(key)
        }
    }
}

impl WritableStorageTraits for FlakyStore {
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        self.inner.set(key, value)
    }

    fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        if self.fail_erase.load(Ordering::SeqCst) {
            Err(StorageError::Other(format!("cannot erase {key}")))
        } else {
            self.inner.erase(key)
        }
    }

    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError> {
        self.inner.erase_prefix(prefix)
    }
}

#[test]
fn earray_truncate_is_atomic() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(FlakyStore::default());
    let mut array = ArrayBuilder::new(vec![0], AtomKind::Int64)
        .chunk_rows(4)
        .filters(Filters::new().with_fletcher32(true))
        .build(store.clone(), "/flaky")?;
    array.store_metadata()?;
    let elements: Vec<i64> = (0..10).collect();
    array.append((elements.as_slice(), &[10u64][..]))?;
    array.flush()?;

    store.fail_erase.store(true, Ordering::SeqCst);
    assert!(matches!(
        array.truncate(3),
        Err(ArrayError::StorageError(StorageError::Other(_)))
    ));
    assert_eq!(array.nrows(), 10);
    assert_eq!(array.read_elements::<i64>(RowRange::all())?, elements);
    assert_eq!(EArray::open(store.clone(), "/flaky")?.read_elements::<i64>(RowRange::all())?, elements);

    store.fail_erase.store(false, Ordering::SeqCst);
    array.truncate(3)?;
    assert_eq!(array.read_elements::<i64>(RowRange::all())?, vec![0, 1, 2]);
    assert_eq!(EArray::open(store, "/flaky")?.nrows(), 3);
    Ok(())
}

#[test]
fn earray_copy_onto_itself() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let mut source = source_array(store.clone(), 10)?;
    source.flush()?;
    assert!(matches!(
        source.copy_to(store.clone(), "/source", &CopyOptions::default().with_overwrite(true)),
        Err(ArrayError::ArrayCreateError(ArrayCreateError::CopyOntoItself(_)))
    ));
    let reopened = EArray::open(store.clone(), "/source")?;
    assert_eq!(reopened.read(RowRange::all())?, source.read(RowRange::all())?);

    // the same path in another store is a different node
    let other = Arc::new(MemoryStore::new());
    assert_eq!(source.copy_to(other, "/source", &CopyOptions::default())?.nrows(), 10);
    Ok(())
}

#[test]
fn earray_copy_failure_keeps_destination() -> Result<(), Box<dyn std::error::Error>> {
    let source_store = Arc::new(FlakyStore::default());
    let mut source = ArrayBuilder::new(vec![0], AtomKind::Int64)
        .chunk_rows(4)
        .build(source_store.clone(), "/flaky")?;
    source.store_metadata()?;
    source.append((&(0..10).collect::<Vec<i64>>()[..], &[10u64][..]))?;
    source.flush()?;

    let dest_store = Arc::new(MemoryStore::new());
    let mut dest = ArrayBuilder::new(vec![0], AtomKind::Int64)
        .chunk_rows(2)
        .title("previous")
        .build(dest_store.clone(), "/dest")?;
    dest.store_metadata()?;
    dest.append((&[7i64, 8, 9][..], &[3u64][..]))?;
    dest.close()?;
    let keys = dest_store.list()?;

    source_store.fail_get.store(true, Ordering::SeqCst);
    assert!(matches!(
        source.copy_to(
            dest_store.clone(),
            "/dest",
            &CopyOptions::default().with_overwrite(true)
        ),
        Err(ArrayError::StorageError(StorageError::Other(_)))
    ));
    assert_eq!(dest_store.list()?, keys);
    let dest = EArray::open(dest_store.clone(), "/dest")?;
    assert_eq!(dest.title(), "previous");
    assert_eq!(dest.read_elements::<i64>(RowRange::all())?, vec![7, 8, 9]);

    // a failed copy to a new node leaves nothing behind
    assert!(
        source
            .copy_to(dest_store.clone(), "/new", &CopyOptions::default())
            .is_err()
    );
    assert_eq!(dest_store.list()?, keys);

    source_store.fail_get.store(false, Ordering::SeqCst);
    let dest = source.copy_to(
        dest_store,
        "/dest",
        &CopyOptions::default().with_overwrite(true),
    )?;
    assert_eq!(dest.read_elements::<i64>(RowRange::all())?, (0..10).collect::<Vec<_>>());
    Ok(())
}
