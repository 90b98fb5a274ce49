use ndarray::ArrayD;
use num::complex::Complex;

use crate::array::{ArrayData, ArrayError, AtomKind};

macro_rules! nd_array {
    (@pattern String) => { AtomKind::String { .. } };
    (@pattern $variant:ident) => { AtomKind::$variant };
    ($($variant:ident($t:ty)),* $(,)?) => {
        /// An [`ndarray::ArrayD`] of the element type of an atom kind.
        #[derive(Clone, Debug, PartialEq)]
        pub enum NdArray {
            $(
                #[doc = concat!("`", stringify!($t), "` elements.")]
                $variant(ArrayD<$t>),
            )*
        }

        impl NdArray {
            /// Convert array data into an ndarray.
            ///
            /// # Errors
            /// Returns an [`ArrayError`] if the data holds an invalid element or its shape exceeds `usize`.
            pub fn from_array_data(data: &ArrayData) -> Result<Self, ArrayError> {
                match data.kind() {
                    $(nd_array!(@pattern $variant) => Ok(Self::$variant(data.to_ndarray::<$t>()?)),)*
                }
            }

            /// Return the shape.
            #[must_use]
            pub fn shape(&self) -> &[usize] {
                match self {
                    $(Self::$variant(array) => array.shape(),)*
                }
            }

            /// Convert into array data of atom `kind`.
            ///
            /// # Errors
            /// Returns [`ArrayError::IncompatibleElementType`] if the element type does not match `kind`.
            pub fn to_array_data(&self, kind: &AtomKind) -> Result<ArrayData, ArrayError> {
                match self {
                    $(Self::$variant(array) => crate::array::IntoArrayData::into_array_data(array, kind),)*
                }
            }
        }
    };
}

nd_array!(
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Complex64(Complex<f32>),
    Complex128(Complex<f64>),
    String(String),
);
