use super::{ArrayData, ArrayError, AtomKind, Element, FlavoredData, NestedValue};

/// Conversion of caller-supplied data into contiguous row-major [`ArrayData`] of an atom kind.
///
/// Strided or offset inputs such as [`ndarray`] views are materialised in logical order, so an array never receives strided bytes.
pub trait IntoArrayData {
    /// Convert into array data of atom `kind`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the data is incompatible with `kind`.
    fn into_array_data(self, kind: &AtomKind) -> Result<ArrayData, ArrayError>;
}

impl IntoArrayData for ArrayData {
    fn into_array_data(self, kind: &AtomKind) -> Result<ArrayData, ArrayError> {
        if self.kind() == kind {
            Ok(self)
        } else {
            Err(ArrayError::IncompatibleElementType(*self.kind()))
        }
    }
}

impl IntoArrayData for &ArrayData {
    fn into_array_data(self, kind: &AtomKind) -> Result<ArrayData, ArrayError> {
        self.clone().into_array_data(kind)
    }
}

impl IntoArrayData for NestedValue {
    fn into_array_data(self, kind: &AtomKind) -> Result<ArrayData, ArrayError> {
        self.to_array_data(kind)
    }
}

impl IntoArrayData for &NestedValue {
    fn into_array_data(self, kind: &AtomKind) -> Result<ArrayData, ArrayError> {
        self.to_array_data(kind)
    }
}

impl IntoArrayData for FlavoredData {
    fn into_array_data(self, kind: &AtomKind) -> Result<ArrayData, ArrayError> {
        match self {
            Self::Native(data) => data.into_array_data(kind),
            Self::Python(value) => value.to_array_data(kind),
            #[cfg(feature = "ndarray")]
            Self::Ndarray(array) => array.to_array_data(kind),
        }
    }
}

impl<T: Element> IntoArrayData for (&[T], &[u64]) {
    fn into_array_data(self, kind: &AtomKind) -> Result<ArrayData, ArrayError> {
        let (elements, shape) = self;
        ArrayData::from_elements(*kind, shape.to_vec(), elements)
    }
}

#[cfg(feature = "ndarray")]
fn ndarray_into_array_data<T, S, D>(
    array: &ndarray::ArrayBase<S, D>,
    kind: &AtomKind,
) -> Result<ArrayData, ArrayError>
where
    T: Element,
    S: ndarray::Data<Elem = T>,
    D: ndarray::Dimension,
{
    let shape = array.shape().iter().map(|&len| len as u64).collect();
    let elements: Vec<T> = match array.as_slice() {
        Some(elements) => elements.to_vec(),
        None => array.iter().cloned().collect(),
    };
    ArrayData::from_elements(*kind, shape, &elements)
}

#[cfg(feature = "ndarray")]
impl<T, S, D> IntoArrayData for ndarray::ArrayBase<S, D>
where
    T: Element,
    S: ndarray::Data<Elem = T>,
    D: ndarray::Dimension,
{
    fn into_array_data(self, kind: &AtomKind) -> Result<ArrayData, ArrayError> {
        ndarray_into_array_data(&self, kind)
    }
}

#[cfg(feature = "ndarray")]
impl<T, S, D> IntoArrayData for &ndarray::ArrayBase<S, D>
where
    T: Element,
    S: ndarray::Data<Elem = T>,
    D: ndarray::Dimension,
{
    fn into_array_data(self, kind: &AtomKind) -> Result<ArrayData, ArrayError> {
        ndarray_into_array_data(self, kind)
    }
}
