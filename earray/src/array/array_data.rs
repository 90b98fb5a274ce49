use super::{ArrayError, AtomKind, Element};

/// Convert a `u64` to `usize`, failing on platforms where it does not fit.
pub(crate) fn to_usize(value: u64, what: &str) -> Result<usize, ArrayError> {
    usize::try_from(value).map_err(|_| ArrayError::SizeOverflow(format!("{what} of {value}")))
}

/// Return the number of elements of `shape`.
pub(crate) fn num_elements(shape: &[u64]) -> Result<u64, ArrayError> {
    shape.iter().try_fold(1u64, |acc, &len| {
        acc.checked_mul(len)
            .ok_or_else(|| ArrayError::SizeOverflow(format!("shape {shape:?}")))
    })
}

/// An n-dimensional block of elements of one [`AtomKind`] in row-major (C) order.
///
/// This is the canonical representation exchanged with an [`EArray`](crate::array::EArray).
/// Elements are stored as native-endian bytes.
/// A zero-dimensional block holds a single element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayData {
    kind: AtomKind,
    shape: Vec<u64>,
    bytes: Vec<u8>,
}

impl ArrayData {
    /// Create array data from raw bytes.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidBytesLength`] if the length of `bytes` does not match `shape` and `kind`.
    pub fn new(kind: AtomKind, shape: Vec<u64>, bytes: Vec<u8>) -> Result<Self, ArrayError> {
        let expected = to_usize(num_elements(&shape)?, "number of elements")?
            .checked_mul(kind.item_size())
            .ok_or_else(|| ArrayError::SizeOverflow(format!("shape {shape:?}")))?;
        if bytes.len() == expected {
            Ok(Self { kind, shape, bytes })
        } else {
            Err(ArrayError::InvalidBytesLength(bytes.len(), expected))
        }
    }

    /// Create array data without checking the length of `bytes`.
    pub(crate) fn new_unchecked(kind: AtomKind, shape: Vec<u64>, bytes: Vec<u8>) -> Self {
        debug_assert_eq!(
            num_elements(&shape).ok().and_then(|n| usize::try_from(n).ok()),
            Some(bytes.len() / kind.item_size().max(1))
        );
        Self { kind, shape, bytes }
    }

    /// Create array data from elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the elements are incompatible with `kind` or their number does not match `shape`.
    pub fn from_elements<T: Element>(
        kind: AtomKind,
        shape: Vec<u64>,
        elements: &[T],
    ) -> Result<Self, ArrayError> {
        let bytes = T::to_bytes(&kind, elements)?;
        Self::new(kind, shape, bytes)
    }

    /// Return the atom kind of the elements.
    #[must_use]
    pub const fn kind(&self) -> &AtomKind {
        &self.kind
    }

    /// Return the shape.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the number of dimensions.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Return the underlying bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the array data and return the underlying bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Return the number of elements.
    #[must_use]
    pub fn num_elements(&self) -> usize {
        self.bytes.len() / self.kind.item_size().max(1)
    }

    /// Return true if there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Convert to a vector of elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `T` is incompatible with the atom kind or an element is invalid.
    pub fn to_elements<T: Element>(&self) -> Result<Vec<T>, ArrayError> {
        T::from_bytes(&self.kind, &self.bytes)
    }

    /// Change the shape without changing the elements.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidBytesLength`] if `shape` has a different number of elements.
    pub fn reshape(self, shape: Vec<u64>) -> Result<Self, ArrayError> {
        Self::new(self.kind, shape, self.bytes)
    }

    /// Convert to an [`ndarray::ArrayD`].
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `T` is incompatible with the atom kind or an element is invalid.
    #[cfg(feature = "ndarray")]
    pub fn to_ndarray<T: Element>(&self) -> Result<ndarray::ArrayD<T>, ArrayError> {
        let shape = self
            .shape
            .iter()
            .map(|&len| to_usize(len, "dimension"))
            .collect::<Result<Vec<_>, _>>()?;
        let elements = self.to_elements::<T>()?;
        ndarray::ArrayD::from_shape_vec(shape, elements)
            .map_err(|err| ArrayError::Other(err.to_string()))
    }

    /// Return the elements broadcast to `shape` with NumPy broadcasting rules, or [`None`] if they cannot be broadcast.
    pub(crate) fn broadcast_bytes(&self, shape: &[u64]) -> Option<Vec<u8>> {
        if self.shape == shape {
            return Some(self.bytes.clone());
        }
        if self.shape.len() > shape.len() {
            return None;
        }
        let offset = shape.len() - self.shape.len();
        let source_shape: Vec<u64> = std::iter::repeat_n(1, offset)
            .chain(self.shape.iter().copied())
            .collect();
        if source_shape
            .iter()
            .zip(shape)
            .any(|(&source, &target)| source != 1 && source != target)
        {
            return None;
        }

        // source strides in elements, zero along broadcast axes
        let mut strides = vec![0u64; shape.len()];
        let mut stride = 1;
        for axis in (0..shape.len()).rev() {
            if source_shape[axis] != 1 || shape[axis] == 1 {
                strides[axis] = stride;
            }
            stride *= source_shape[axis];
        }

        let item_size = self.kind.item_size();
        let total = usize::try_from(num_elements(shape).ok()?).ok()?;
        let mut bytes = Vec::with_capacity(total * item_size);
        let mut index = vec![0u64; shape.len()];
        for _ in 0..total {
            let source: u64 = index.iter().zip(&strides).map(|(i, s)| i * s).sum();
            let source = usize::try_from(source).ok()? * item_size;
            bytes.extend_from_slice(&self.bytes[source..source + item_size]);
            for axis in (0..shape.len()).rev() {
                index[axis] += 1;
                if index[axis] < shape[axis] {
                    break;
                }
                index[axis] = 0;
            }
        }
        Some(bytes)
    }
}

/// Swap the two outer axes of a row-major `[outer][middle][inner]` byte block.
///
/// `inner` is the size in bytes of the innermost block.
/// The result is laid out as `[middle][outer][inner]`.
pub(crate) fn swap_outer(bytes: &[u8], outer: usize, middle: usize, inner: usize) -> Vec<u8> {
    if outer <= 1 || middle <= 1 {
        return bytes.to_vec();
    }
    let mut swapped = Vec::with_capacity(bytes.len());
    for m in 0..middle {
        for o in 0..outer {
            let start = (o * middle + m) * inner;
            swapped.extend_from_slice(&bytes[start..start + inner]);
        }
    }
    swapped
}
