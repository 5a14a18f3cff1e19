//! Static per-dtype dispatch between Rust element types, [`TensorValue`]
//! arms and wire payload variants.

use std::fmt;

use envrpc_proto::tensor::{
    BoolArray, DoubleArray, FloatArray, Int32Array, Int64Array, Int8Array, ProtoArray,
    StringArray, Uint32Array, Uint64Array, Uint8Array,
};
use envrpc_proto::{Any, DataType, Payload};
use ndarray::ArrayD;

use crate::value::TensorValue;

/// A Rust type that can be a tensor element.
pub trait Element: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    const DTYPE: DataType;

    /// Wrap an array of this element type into the matching value arm.
    fn wrap(array: ArrayD<Self>) -> TensorValue;

    /// Borrow the array if `value` holds this element type.
    fn array_of(value: &TensorValue) -> Option<&ArrayD<Self>>;

    /// Build the wire payload from flat row-major elements.
    fn into_payload(flat: Vec<Self>) -> Payload;

    /// Read flat row-major elements if `payload` is this element type.
    fn from_payload(payload: &Payload) -> Option<Vec<Self>>;
}

macro_rules! repeated_element {
    ($ty:ty, $arm:ident, $variant:ident, $wrapper:ident) => {
        impl Element for $ty {
            const DTYPE: DataType = DataType::$arm;

            fn wrap(array: ArrayD<Self>) -> TensorValue {
                TensorValue::$arm(array)
            }

            fn array_of(value: &TensorValue) -> Option<&ArrayD<Self>> {
                match value {
                    TensorValue::$arm(array) => Some(array),
                    _ => None,
                }
            }

            fn into_payload(flat: Vec<Self>) -> Payload {
                Payload::$variant($wrapper { array: flat })
            }

            fn from_payload(payload: &Payload) -> Option<Vec<Self>> {
                match payload {
                    Payload::$variant(wrapper) => Some(wrapper.array.clone()),
                    _ => None,
                }
            }
        }
    };
}

repeated_element!(f32, Float, Floats, FloatArray);
repeated_element!(f64, Double, Doubles, DoubleArray);
repeated_element!(i32, Int32, Int32s, Int32Array);
repeated_element!(i64, Int64, Int64s, Int64Array);
repeated_element!(u8, Uint8, Uint8s, Uint8Array);
repeated_element!(u32, Uint32, Uint32s, Uint32Array);
repeated_element!(u64, Uint64, Uint64s, Uint64Array);
repeated_element!(bool, Bool, Bools, BoolArray);
repeated_element!(String, String, Strings, StringArray);
repeated_element!(Any, Proto, Protos, ProtoArray);

// int8s travel as raw bytes; reinterpret each byte as two's complement.
impl Element for i8 {
    const DTYPE: DataType = DataType::Int8;

    fn wrap(array: ArrayD<Self>) -> TensorValue {
        TensorValue::Int8(array)
    }

    fn array_of(value: &TensorValue) -> Option<&ArrayD<Self>> {
        match value {
            TensorValue::Int8(array) => Some(array),
            _ => None,
        }
    }

    fn into_payload(flat: Vec<Self>) -> Payload {
        Payload::Int8s(Int8Array {
            array: flat.into_iter().map(|v| v as u8).collect(),
        })
    }

    fn from_payload(payload: &Payload) -> Option<Vec<Self>> {
        match payload {
            Payload::Int8s(wrapper) => Some(wrapper.array.iter().map(|&b| b as i8).collect()),
            _ => None,
        }
    }
}

/// A numeric value widened for comparison and display.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum Scalar {
    Integer(i128),
    Float(f64),
}

/// Integer and floating-point element types: the ones that carry bounds and
/// take part in numeric casts.
pub trait Numeric: Element + Copy + PartialOrd + fmt::Display {
    /// Smallest finite value of the type.
    const MIN: Self;
    /// Largest finite value of the type.
    const MAX: Self;
    const IS_FLOAT: bool;

    /// Convert an integer, or `None` if it does not fit.
    fn from_integer(value: i128) -> Option<Self>;

    /// Convert a float without leaving the float kind. Integer types return
    /// `None`; `f32` rejects finite values beyond its range.
    fn from_float(value: f64) -> Option<Self>;

    fn to_scalar(self) -> Scalar;
}

macro_rules! integer_numeric {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Numeric for $ty {
                const MIN: Self = <$ty>::MIN;
                const MAX: Self = <$ty>::MAX;
                const IS_FLOAT: bool = false;

                fn from_integer(value: i128) -> Option<Self> {
                    <$ty>::try_from(value).ok()
                }

                fn from_float(_value: f64) -> Option<Self> {
                    None
                }

                fn to_scalar(self) -> Scalar {
                    Scalar::Integer(i128::from(self))
                }
            }
        )*
    };
}

integer_numeric!(i8, i32, i64, u8, u32, u64);

impl Numeric for f32 {
    const MIN: Self = f32::MIN;
    const MAX: Self = f32::MAX;
    const IS_FLOAT: bool = true;

    fn from_integer(value: i128) -> Option<Self> {
        Some(value as f32)
    }

    fn from_float(value: f64) -> Option<Self> {
        if value.is_finite() && (value < f64::from(f32::MIN) || value > f64::from(f32::MAX)) {
            return None;
        }
        Some(value as f32)
    }

    fn to_scalar(self) -> Scalar {
        Scalar::Float(f64::from(self))
    }
}

impl Numeric for f64 {
    const MIN: Self = f64::MIN;
    const MAX: Self = f64::MAX;
    const IS_FLOAT: bool = true;

    fn from_integer(value: i128) -> Option<Self> {
        Some(value as f64)
    }

    fn from_float(value: f64) -> Option<Self> {
        Some(value)
    }

    fn to_scalar(self) -> Scalar {
        Scalar::Float(self)
    }
}
