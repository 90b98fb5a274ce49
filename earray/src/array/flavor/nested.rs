use std::fmt::Display;

use num::complex::Complex;
use num::ToPrimitive;

use super::{FlavorError, checked_cast_value};
use crate::array::array_data::to_usize;
use crate::array::{ArrayData, ArrayError, AtomKind, Element};

/// A scalar of the python flavor.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    UInt(u64),
    /// A float.
    Float(f64),
    /// A complex number.
    Complex(Complex<f64>),
    /// A string.
    String(String),
}

impl Scalar {
    const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::Complex(_) => "complex",
            Self::String(_) => "string",
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Complex(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
        }
    }
}

/// A value of the python flavor: a scalar or a list of nested values.
///
/// Lists must be rectangular to convert to array data.
#[derive(Clone, Debug, PartialEq)]
pub enum NestedValue {
    /// A scalar.
    Scalar(Scalar),
    /// A list.
    List(Vec<NestedValue>),
}

macro_rules! impl_from_scalar {
    ($variant:ident, $convert:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Scalar {
                fn from(value: $t) -> Self {
                    Self::$variant(<$convert>::from(value))
                }
            }

            impl From<$t> for NestedValue {
                fn from(value: $t) -> Self {
                    Self::Scalar(Scalar::from(value))
                }
            }
        )*
    };
}

impl_from_scalar!(Bool, bool: bool);
impl_from_scalar!(Int, i64: i8, i16, i32, i64);
impl_from_scalar!(UInt, u64: u8, u16, u32, u64);
impl_from_scalar!(Float, f64: f32, f64);
impl_from_scalar!(String, String: String, &str);

impl From<Complex<f32>> for Scalar {
    fn from(value: Complex<f32>) -> Self {
        Self::Complex(Complex::new(f64::from(value.re), f64::from(value.im)))
    }
}

impl From<Complex<f64>> for Scalar {
    fn from(value: Complex<f64>) -> Self {
        Self::Complex(value)
    }
}

impl From<Scalar> for NestedValue {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl<T: Into<NestedValue>> From<Vec<T>> for NestedValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl NestedValue {
    /// Convert array data into nested lists.
    ///
    /// Zero-dimensional data converts to a scalar.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the data holds an invalid element.
    pub fn from_array_data(data: &ArrayData) -> Result<Self, ArrayError> {
        let scalars = scalars_from_array_data(data)?;
        let shape = data
            .shape()
            .iter()
            .map(|&len| to_usize(len, "dimension"))
            .collect::<Result<Vec<_>, _>>()?;
        let mut scalars = scalars.into_iter();
        nest(&shape, &mut scalars)
            .ok_or_else(|| ArrayError::Other("array data holds too few elements".to_string()))
    }

    /// Return the shape of a rectangular nested value.
    ///
    /// An empty list has shape `[0]`.
    ///
    /// # Errors
    /// Returns [`FlavorError::NotRectangular`] if sibling lists differ in shape.
    pub fn shape(&self) -> Result<Vec<u64>, FlavorError> {
        match self {
            Self::Scalar(_) => Ok(Vec::new()),
            Self::List(values) => {
                let mut inner: Option<Vec<u64>> = None;
                for value in values {
                    let shape = value.shape()?;
                    match &inner {
                        Some(inner) if *inner != shape => {
                            return Err(FlavorError::NotRectangular(format!(
                                "found sibling shapes {inner:?} and {shape:?}"
                            )));
                        }
                        Some(_) => {}
                        None => inner = Some(shape),
                    }
                }
                let mut shape = vec![values.len() as u64];
                shape.extend(inner.unwrap_or_default());
                Ok(shape)
            }
        }
    }

    fn flatten_into<'a>(&'a self, scalars: &mut Vec<&'a Scalar>) {
        match self {
            Self::Scalar(scalar) => scalars.push(scalar),
            Self::List(values) => {
                for value in values {
                    value.flatten_into(scalars);
                }
            }
        }
    }

    /// Convert into array data of atom `kind` with explicit checked casts.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the lists are not rectangular or a scalar cannot be represented by `kind`.
    pub fn to_array_data(&self, kind: &AtomKind) -> Result<ArrayData, ArrayError> {
        let shape = self.shape()?;
        let mut scalars = Vec::new();
        self.flatten_into(&mut scalars);
        let bytes = match kind {
            AtomKind::Bool => to_bytes::<bool>(kind, &scalars)?,
            AtomKind::Int8 => to_bytes::<i8>(kind, &scalars)?,
            AtomKind::Int16 => to_bytes::<i16>(kind, &scalars)?,
            AtomKind::Int32 => to_bytes::<i32>(kind, &scalars)?,
            AtomKind::Int64 => to_bytes::<i64>(kind, &scalars)?,
            AtomKind::UInt8 => to_bytes::<u8>(kind, &scalars)?,
            AtomKind::UInt16 => to_bytes::<u16>(kind, &scalars)?,
            AtomKind::UInt32 => to_bytes::<u32>(kind, &scalars)?,
            AtomKind::UInt64 => to_bytes::<u64>(kind, &scalars)?,
            AtomKind::Float32 => to_bytes::<f32>(kind, &scalars)?,
            AtomKind::Float64 => to_bytes::<f64>(kind, &scalars)?,
            AtomKind::Complex64 => to_bytes::<Complex<f32>>(kind, &scalars)?,
            AtomKind::Complex128 => to_bytes::<Complex<f64>>(kind, &scalars)?,
            AtomKind::String { .. } => to_bytes::<String>(kind, &scalars)?,
        };
        ArrayData::new(*kind, shape, bytes)
    }
}

fn nest(shape: &[usize], scalars: &mut impl Iterator<Item = Scalar>) -> Option<NestedValue> {
    match shape.split_first() {
        None => scalars.next().map(NestedValue::Scalar),
        Some((&len, inner)) => (0..len)
            .map(|_| nest(inner, scalars))
            .collect::<Option<Vec<_>>>()
            .map(NestedValue::List),
    }
}

fn elements_to_scalars<T: Element + Into<Scalar>>(data: &ArrayData) -> Result<Vec<Scalar>, ArrayError> {
    Ok(data
        .to_elements::<T>()?
        .into_iter()
        .map(Into::into)
        .collect())
}

fn scalars_from_array_data(data: &ArrayData) -> Result<Vec<Scalar>, ArrayError> {
    match data.kind() {
        AtomKind::Bool => elements_to_scalars::<bool>(data),
        AtomKind::Int8 => elements_to_scalars::<i8>(data),
        AtomKind::Int16 => elements_to_scalars::<i16>(data),
        AtomKind::Int32 => elements_to_scalars::<i32>(data),
        AtomKind::Int64 => elements_to_scalars::<i64>(data),
        AtomKind::UInt8 => elements_to_scalars::<u8>(data),
        AtomKind::UInt16 => elements_to_scalars::<u16>(data),
        AtomKind::UInt32 => elements_to_scalars::<u32>(data),
        AtomKind::UInt64 => elements_to_scalars::<u64>(data),
        AtomKind::Float32 => elements_to_scalars::<f32>(data),
        AtomKind::Float64 => elements_to_scalars::<f64>(data),
        AtomKind::Complex64 => elements_to_scalars::<Complex<f32>>(data),
        AtomKind::Complex128 => elements_to_scalars::<Complex<f64>>(data),
        AtomKind::String { .. } => elements_to_scalars::<String>(data),
    }
}

/// Conversion of a [`Scalar`] into an element with an explicit checked cast.
trait FromScalar: Element {
    fn from_scalar(scalar: &Scalar, kind: &AtomKind) -> Result<Self, FlavorError>;
}

fn incompatible(scalar: &Scalar, kind: &AtomKind) -> FlavorError {
    FlavorError::IncompatibleScalar {
        scalar: scalar.type_name(),
        kind: *kind,
    }
}

fn cast_real<T: num::NumCast + ToPrimitive>(scalar: &Scalar, kind: &AtomKind) -> Result<T, FlavorError> {
    match scalar {
        Scalar::Bool(v) => checked_cast_value(u8::from(*v), kind),
        Scalar::Int(v) => checked_cast_value(*v, kind),
        Scalar::UInt(v) => checked_cast_value(*v, kind),
        Scalar::Float(v) => checked_cast_value(*v, kind),
        Scalar::Complex(_) | Scalar::String(_) => Err(incompatible(scalar, kind)),
    }
}

macro_rules! impl_from_scalar_real {
    ($($t:ty),*) => {
        $(
            impl FromScalar for $t {
                fn from_scalar(scalar: &Scalar, kind: &AtomKind) -> Result<Self, FlavorError> {
                    cast_real(scalar, kind)
                }
            }
        )*
    };
}

impl_from_scalar_real!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

macro_rules! impl_from_scalar_complex {
    ($($t:ty),*) => {
        $(
            impl FromScalar for Complex<$t> {
                fn from_scalar(scalar: &Scalar, kind: &AtomKind) -> Result<Self, FlavorError> {
                    match scalar {
                        Scalar::Complex(v) => Ok(Complex::new(
                            checked_cast_value(v.re, kind)?,
                            checked_cast_value(v.im, kind)?,
                        )),
                        _ => Ok(Complex::new(cast_real(scalar, kind)?, 0.0)),
                    }
                }
            }
        )*
    };
}

impl_from_scalar_complex!(f32, f64);

impl FromScalar for bool {
    fn from_scalar(scalar: &Scalar, kind: &AtomKind) -> Result<Self, FlavorError> {
        match scalar {
            Scalar::Bool(v) => Ok(*v),
            _ => Err(incompatible(scalar, kind)),
        }
    }
}

impl FromScalar for String {
    fn from_scalar(scalar: &Scalar, kind: &AtomKind) -> Result<Self, FlavorError> {
        match scalar {
            Scalar::String(v) => Ok(v.clone()),
            _ => Err(incompatible(scalar, kind)),
        }
    }
}

fn to_bytes<T: FromScalar>(kind: &AtomKind, scalars: &[&Scalar]) -> Result<Vec<u8>, ArrayError> {
    let elements = scalars
        .iter()
        .map(|scalar| T::from_scalar(scalar, kind))
        .collect::<Result<Vec<_>, _>>()?;
    T::to_bytes(kind, &elements)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_shape() {
        let value = NestedValue::from(vec![vec![1i32, 2, 3], vec![4, 5, 6]]);
        assert_eq!(value.shape().unwrap(), vec![2, 3]);
        assert_eq!(NestedValue::from(7i32).shape().unwrap(), Vec::<u64>::new());
        assert_eq!(
            NestedValue::from(Vec::<i32>::new()).shape().unwrap(),
            vec![0]
        );
        let ragged = NestedValue::from(vec![vec![1i32, 2], vec![3]]);
        assert!(matches!(ragged.shape(), Err(FlavorError::NotRectangular(_))));
    }

    #[test]
    fn nested_round_trip() {
        let data =
            ArrayData::from_elements(AtomKind::Int16, vec![2, 2], &[1i16, -2, 3, -4]).unwrap();
        let nested = NestedValue::from_array_data(&data).unwrap();
        assert_eq!(nested, NestedValue::from(vec![vec![1i64, -2], vec![3, -4]]));
        assert_eq!(nested.to_array_data(&AtomKind::Int16).unwrap(), data);

        let scalar = ArrayData::from_elements(AtomKind::Float64, vec![], &[1.5f64]).unwrap();
        assert_eq!(
            NestedValue::from_array_data(&scalar).unwrap(),
            NestedValue::from(1.5f64)
        );

        let strings = NestedValue::from(vec!["ab", "c"]);
        let data = strings.to_array_data(&AtomKind::String { length: 2 }).unwrap();
        assert_eq!(data.bytes(), b"abc\0");
        assert_eq!(NestedValue::from_array_data(&data).unwrap(), strings);
    }

    #[test]
    fn nested_checked_casts() {
        let value = NestedValue::from(vec![1i64, 300]);
        assert!(matches!(
            value.to_array_data(&AtomKind::UInt8),
            Err(ArrayError::FlavorError(FlavorError::Overflow { .. }))
        ));
        let value = NestedValue::from(vec![1.0f64, 2.5]);
        assert!(matches!(
            value.to_array_data(&AtomKind::Int32),
            Err(ArrayError::FlavorError(FlavorError::Truncation { .. }))
        ));
        let value = NestedValue::from(vec![1.0f64, 2.0]);
        assert_eq!(
            value
                .to_array_data(&AtomKind::Int32)
                .unwrap()
                .to_elements::<i32>()
                .unwrap(),
            vec![1, 2]
        );
        assert!(matches!(
            NestedValue::from("a").to_array_data(&AtomKind::Int8),
            Err(ArrayError::FlavorError(FlavorError::IncompatibleScalar { .. }))
        ));
        let complex = NestedValue::from(vec![Scalar::from(Complex::new(1.0f64, 2.0)), Scalar::Int(3)]);
        assert_eq!(
            complex
                .to_array_data(&AtomKind::Complex64)
                .unwrap()
                .to_elements::<Complex<f32>>()
                .unwrap(),
            vec![Complex::new(1.0, 2.0), Complex::new(3.0, 0.0)]
        );
    }
}
