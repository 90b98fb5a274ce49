//! Flavors: the representations of array data exchanged with callers.
//!
//! Every earray records a [`Flavor`] when it is created.
//! Flavored reads convert the canonical [`ArrayData`] into the representation selected by that flavor:
//!  - [`Flavor::Native`]: [`ArrayData`] itself,
//!  - [`Flavor::Python`]: a [`NestedValue`] of nested lists of [`Scalar`]s, and
//!  - [`Flavor::Ndarray`]: an [`NdArray`] (requires the `ndarray` feature).
//!
//! Writes accept any [`IntoArrayData`](crate::array::IntoArrayData) input regardless of the flavor.

mod nested;
#[cfg(feature = "ndarray")]
mod ndarray_flavor;

pub use nested::{NestedValue, Scalar};
#[cfg(feature = "ndarray")]
pub use ndarray_flavor::NdArray;

use derive_more::Display;
use num::{NumCast, ToPrimitive};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{ArrayData, ArrayError, AtomKind};

/// The representation of data returned by flavored reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    /// [`ArrayData`].
    #[default]
    #[display("native")]
    Native,
    /// Nested lists of scalars.
    #[display("python")]
    Python,
    /// An `ndarray` array.
    #[display("ndarray")]
    Ndarray,
}

/// Array data in the representation of a [`Flavor`].
#[derive(Clone, Debug, PartialEq)]
pub enum FlavoredData {
    /// Native array data.
    Native(ArrayData),
    /// Nested lists of scalars.
    Python(NestedValue),
    /// An `ndarray` array.
    #[cfg(feature = "ndarray")]
    Ndarray(NdArray),
}

impl FlavoredData {
    /// Convert array data into `flavor`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if an element is invalid or `flavor` is unavailable in this build.
    pub fn from_array_data(data: ArrayData, flavor: Flavor) -> Result<Self, ArrayError> {
        match flavor {
            Flavor::Native => Ok(Self::Native(data)),
            Flavor::Python => Ok(Self::Python(NestedValue::from_array_data(&data)?)),
            #[cfg(feature = "ndarray")]
            Flavor::Ndarray => Ok(Self::Ndarray(NdArray::from_array_data(&data)?)),
            #[cfg(not(feature = "ndarray"))]
            Flavor::Ndarray => Err(FlavorError::Unavailable(flavor, "ndarray").into()),
        }
    }

    /// Return the flavor of the data.
    #[must_use]
    pub const fn flavor(&self) -> Flavor {
        match self {
            Self::Native(_) => Flavor::Native,
            Self::Python(_) => Flavor::Python,
            #[cfg(feature = "ndarray")]
            Self::Ndarray(_) => Flavor::Ndarray,
        }
    }
}

/// A flavor conversion error.
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum FlavorError {
    /// A value outside the range of the target kind.
    #[error("value {value} overflows {kind}")]
    Overflow {
        /// The value.
        value: String,
        /// The target kind.
        kind: AtomKind,
    },
    /// A fractional value converted to an integer kind.
    #[error("value {value} would be truncated converting to {kind}")]
    Truncation {
        /// The value.
        value: String,
        /// The target kind.
        kind: AtomKind,
    },
    /// A scalar that cannot represent the target kind.
    #[error("a {scalar} value cannot be converted to {kind}")]
    IncompatibleScalar {
        /// The scalar type.
        scalar: &'static str,
        /// The target kind.
        kind: AtomKind,
    },
    /// Nested lists with differing lengths.
    #[error("nested lists are not rectangular: {_0}")]
    NotRectangular(String),
    /// A string longer than the atom.
    #[error("a string of {length} bytes exceeds the atom length of {max} bytes")]
    StringTooLong {
        /// The string length in bytes.
        length: usize,
        /// The atom length in bytes.
        max: usize,
    },
    /// Stored bytes that are not a valid value of the atom.
    #[error("invalid {kind} value: {reason}")]
    InvalidElementValue {
        /// The atom kind.
        kind: AtomKind,
        /// Why the value is invalid.
        reason: String,
    },
    /// A flavor that is not available in this build.
    #[error("the {_0} flavor requires the `{_1}` feature")]
    Unavailable(Flavor, &'static str),
}

/// Cast a value to `U`, failing instead of wrapping, saturating or truncating.
///
/// # Errors
/// Returns [`FlavorError::Overflow`] if `value` is out of the range of `U` and [`FlavorError::Truncation`] if a fractional `value` would lose its fraction.
/// `kind` names the target in the error.
pub fn checked_cast_value<T, U>(value: T, kind: &AtomKind) -> Result<U, FlavorError>
where
    T: ToPrimitive + std::fmt::Display + Copy,
    U: NumCast + ToPrimitive,
{
    let overflow = || FlavorError::Overflow {
        value: value.to_string(),
        kind: *kind,
    };
    let converted = U::from(value).ok_or_else(overflow)?;
    if let (Some(source), Some(target)) = (value.to_f64(), converted.to_f64()) {
        if source.is_finite() && target.is_infinite() {
            return Err(overflow());
        }
        if source.fract() != 0.0 && target.fract() == 0.0 {
            return Err(FlavorError::Truncation {
                value: value.to_string(),
                kind: *kind,
            });
        }
    }
    Ok(converted)
}

/// Cast values to `U` with [`checked_cast_value`].
///
/// This makes numeric promotion explicit, e.g. computing in `i64` and storing as `i16`.
///
/// # Errors
/// Returns a [`FlavorError`] for the first value that does not fit in `U`.
pub fn checked_cast<T, U>(values: &[T], kind: &AtomKind) -> Result<Vec<U>, FlavorError>
where
    T: ToPrimitive + std::fmt::Display + Copy,
    U: NumCast + ToPrimitive,
{
    values
        .iter()
        .map(|&value| checked_cast_value(value, kind))
        .collect()
}
