#![allow(missing_docs)]
#![cfg(feature = "ndarray")]

use std::sync::Arc;

use earray::array::{
    ArrayBuilder, AtomKind, EArray, Flavor, FlavoredData, NdArray, NestedValue, RowRange,
};
use earray::indexer::{AxisSelector, SliceSpec};
use earray::storage::store::MemoryStore;
use ndarray::{Array, ArrayD, IxDyn, s};

fn slice(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> AxisSelector {
    AxisSelector::Slice(SliceSpec::new(start, stop, step))
}

/// `[a, b, c, d] = 60a + 20b + 4c + d`
fn rank4() -> ArrayD<i16> {
    Array::from_shape_vec(IxDyn(&[2, 3, 5, 4]), (0..120).collect()).unwrap()
}

fn rank4_array() -> Result<EArray<MemoryStore>, Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let mut array = ArrayBuilder::new(vec![2, 3, 0, 4], AtomKind::Int16)
        .chunk_rows(2)
        .build(store, "/group/rank4")?;
    array.store_metadata()?;
    array.append(rank4())?;
    Ok(array)
}

#[test]
fn earray_ndarray_ellipsis() -> Result<(), Box<dyn std::error::Error>> {
    let array = rank4_array()?;
    let full = rank4();
    assert_eq!(array.extdim(), 2);
    assert_eq!(array.shape(), vec![2, 3, 5, 4]);
    assert_eq!(array.read_ndarray::<i16>(RowRange::all())?, full);

    let get = |selection: &[AxisSelector]| -> Result<ArrayD<i16>, Box<dyn std::error::Error>> {
        Ok(array.get_item(selection)?.to_ndarray::<i16>()?)
    };
    assert_eq!(
        get(&[AxisSelector::Ellipsis, AxisSelector::Index(1)])?,
        full.slice(s![.., .., .., 1]).into_dyn()
    );
    assert_eq!(
        get(&[AxisSelector::Index(1), AxisSelector::Ellipsis, slice(Some(1), None, Some(2))])?,
        full.slice(s![1, .., .., 1..;2]).into_dyn()
    );
    assert_eq!(
        get(&[AxisSelector::Full, AxisSelector::Full, slice(Some(-2), None, None)])?,
        full.slice(s![.., .., 3.., ..]).into_dyn()
    );
    assert_eq!(get(&[AxisSelector::Ellipsis])?, full);
    assert_eq!(
        get(&[
            AxisSelector::Index(-1),
            AxisSelector::Index(0),
            slice(Some(4), Some(0), Some(-2)),
            AxisSelector::Index(3),
        ])?
        .iter()
        .copied()
        .collect::<Vec<_>>(),
        vec![79, 71]
    );

    // row ranges apply to the extensible dimension
    assert_eq!(
        array.read_ndarray::<i16>(RowRange::new(Some(1), Some(5), Some(3)))?,
        full.slice(s![.., .., 1..5;3, ..]).into_dyn()
    );
    Ok(())
}

#[test]
fn earray_ndarray_writes() -> Result<(), Box<dyn std::error::Error>> {
    let mut array = rank4_array()?;
    let mut full = rank4();

    array.set_item(
        &[AxisSelector::Ellipsis, AxisSelector::Index(0)],
        NestedValue::from(-1i16),
    )?;
    full.slice_mut(s![.., .., .., 0]).fill(-1);
    assert_eq!(array.read_ndarray::<i16>(RowRange::all())?, full);

    // a strided view is appended in logical order
    let extra = rank4().mapv(|value| value + 1000);
    let view = extra.slice(s![.., .., ..;2, ..]);
    assert!(view.as_slice().is_none());
    array.append(&view)?;
    assert_eq!(array.nrows(), 8);
    assert_eq!(
        array.read_ndarray::<i16>(RowRange::span(5, 8))?,
        view.into_dyn()
    );
    assert_eq!(array.read_ndarray::<i16>(RowRange::span(0, 5))?, full);
    Ok(())
}

#[test]
fn earray_flavors() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let mut python = ArrayBuilder::new(vec![0, 2], AtomKind::Int16)
        .flavor(Flavor::Python)
        .chunk_rows(4)
        .build(store.clone(), "/python")?;
    python.store_metadata()?;
    python.append(NestedValue::from(vec![vec![1i16, 2], vec![3, 4], vec![5, 6]]))?;
    assert_eq!(
        python.read_flavored(RowRange::new(Some(1), None, None))?,
        FlavoredData::Python(NestedValue::from(vec![vec![3i16, 4]]))
    );
    assert_eq!(
        python.get_item_flavored(&[AxisSelector::Index(-1), AxisSelector::Index(0)])?,
        FlavoredData::Python(NestedValue::from(5i16))
    );
    python.close()?;

    let python = EArray::open(store.clone(), "/python")?;
    assert_eq!(python.flavor(), Flavor::Python);

    let mut nd = ArrayBuilder::from_array(&python)
        .flavor(Flavor::Ndarray)
        .build(store, "/ndarray")?;
    nd.store_metadata()?;
    nd.append(python.read(RowRange::all())?)?;
    let FlavoredData::Ndarray(NdArray::Int16(values)) = nd.read_flavored(RowRange::all())? else {
        panic!("expected an int16 ndarray");
    };
    assert_eq!(values, ndarray::array![[1, 2], [3, 4], [5, 6]].into_dyn());
    Ok(())
}
