use num::complex::Complex;

use super::{ArrayError, AtomKind, FlavorError};

/// A trait representing an earray element type.
///
/// Elements are converted to and from the native-endian bytes of an atom.
pub trait Element: Sized + Clone {
    /// Validate the atom kind.
    ///
    /// # Errors
    /// Returns [`ArrayError::IncompatibleElementType`] if `kind` is incompatible with [`Element`].
    fn validate_kind(kind: &AtomKind) -> Result<(), ArrayError>;

    /// Convert a slice of elements into bytes.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `kind` is incompatible with [`Element`] or an element cannot be represented.
    fn to_bytes(kind: &AtomKind, elements: &[Self]) -> Result<Vec<u8>, ArrayError>;

    /// Convert bytes into elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `kind` is incompatible with [`Element`] or the bytes hold an invalid value.
    fn from_bytes(kind: &AtomKind, bytes: &[u8]) -> Result<Vec<Self>, ArrayError>;
}

macro_rules! impl_element_pod {
    ($raw_type:ty, $kind:ident) => {
        impl Element for $raw_type {
            fn validate_kind(kind: &AtomKind) -> Result<(), ArrayError> {
                matches!(kind, AtomKind::$kind)
                    .then_some(())
                    .ok_or(ArrayError::IncompatibleElementType(*kind))
            }

            fn to_bytes(kind: &AtomKind, elements: &[Self]) -> Result<Vec<u8>, ArrayError> {
                Self::validate_kind(kind)?;
                Ok(bytemuck::cast_slice(elements).to_vec())
            }

            fn from_bytes(kind: &AtomKind, bytes: &[u8]) -> Result<Vec<Self>, ArrayError> {
                Self::validate_kind(kind)?;
                Ok(bytemuck::allocation::pod_collect_to_vec(bytes))
            }
        }
    };
}

impl_element_pod!(i8, Int8);
impl_element_pod!(i16, Int16);
impl_element_pod!(i32, Int32);
impl_element_pod!(i64, Int64);
impl_element_pod!(u8, UInt8);
impl_element_pod!(u16, UInt16);
impl_element_pod!(u32, UInt32);
impl_element_pod!(u64, UInt64);
impl_element_pod!(f32, Float32);
impl_element_pod!(f64, Float64);
impl_element_pod!(Complex<f32>, Complex64);
impl_element_pod!(Complex<f64>, Complex128);

impl Element for bool {
    fn validate_kind(kind: &AtomKind) -> Result<(), ArrayError> {
        matches!(kind, AtomKind::Bool)
            .then_some(())
            .ok_or(ArrayError::IncompatibleElementType(*kind))
    }

    fn to_bytes(kind: &AtomKind, elements: &[Self]) -> Result<Vec<u8>, ArrayError> {
        Self::validate_kind(kind)?;
        Ok(elements.iter().map(|&element| u8::from(element)).collect())
    }

    fn from_bytes(kind: &AtomKind, bytes: &[u8]) -> Result<Vec<Self>, ArrayError> {
        Self::validate_kind(kind)?;
        bytes
            .iter()
            .map(|byte| match byte {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(FlavorError::InvalidElementValue {
                    kind: *kind,
                    reason: format!("{byte} is not a boolean"),
                }
                .into()),
            })
            .collect()
    }
}

impl Element for String {
    fn validate_kind(kind: &AtomKind) -> Result<(), ArrayError> {
        matches!(kind, AtomKind::String { .. })
            .then_some(())
            .ok_or(ArrayError::IncompatibleElementType(*kind))
    }

    fn to_bytes(kind: &AtomKind, elements: &[Self]) -> Result<Vec<u8>, ArrayError> {
        Self::validate_kind(kind)?;
        let length = kind.item_size();
        let mut bytes = Vec::with_capacity(elements.len() * length);
        for element in elements {
            if element.len() > length {
                return Err(FlavorError::StringTooLong {
                    length: element.len(),
                    max: length,
                }
                .into());
            }
            bytes.extend_from_slice(element.as_bytes());
            bytes.resize(bytes.len() + length - element.len(), 0);
        }
        Ok(bytes)
    }

    fn from_bytes(kind: &AtomKind, bytes: &[u8]) -> Result<Vec<Self>, ArrayError> {
        Self::validate_kind(kind)?;
        bytes
            .chunks_exact(kind.item_size())
            .map(|element| {
                let end = element
                    .iter()
                    .rposition(|&byte| byte != 0)
                    .map_or(0, |position| position + 1);
                String::from_utf8(element[..end].to_vec()).map_err(|err| {
                    FlavorError::InvalidElementValue {
                        kind: *kind,
                        reason: err.to_string(),
                    }
                    .into()
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_pod() {
        let bytes = i32::to_bytes(&AtomKind::Int32, &[1, -2]).unwrap();
        assert_eq!(bytes.len(), 8);
        assert_eq!(i32::from_bytes(&AtomKind::Int32, &bytes).unwrap(), vec![1, -2]);
        assert!(matches!(
            i32::to_bytes(&AtomKind::Int64, &[1]),
            Err(ArrayError::IncompatibleElementType(AtomKind::Int64))
        ));

        let elements = vec![Complex::new(1.0f32, -1.0), Complex::new(0.5, 2.0)];
        let bytes = Complex::<f32>::to_bytes(&AtomKind::Complex64, &elements).unwrap();
        assert_eq!(
            Complex::<f32>::from_bytes(&AtomKind::Complex64, &bytes).unwrap(),
            elements
        );
    }

    #[test]
    fn element_bool() {
        let bytes = bool::to_bytes(&AtomKind::Bool, &[true, false]).unwrap();
        assert_eq!(bytes, vec![1, 0]);
        assert_eq!(bool::from_bytes(&AtomKind::Bool, &bytes).unwrap(), vec![true, false]);
        assert!(bool::from_bytes(&AtomKind::Bool, &[2]).is_err());
    }

    #[test]
    fn element_string() {
        let kind = AtomKind::String { length: 3 };
        let elements = vec!["a".to_string(), "abc".to_string(), String::new()];
        let bytes = String::to_bytes(&kind, &elements).unwrap();
        assert_eq!(bytes, b"a\0\0abc\0\0\0");
        assert_eq!(String::from_bytes(&kind, &bytes).unwrap(), elements);
        assert!(matches!(
            String::to_bytes(&kind, &["abcd".to_string()]),
            Err(ArrayError::FlavorError(FlavorError::StringTooLong { length: 4, max: 3 }))
        ));
    }
}
