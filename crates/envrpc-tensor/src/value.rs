use std::fmt;

use envrpc_proto::{Any, DataType};
use ndarray::{Array1, ArrayD, IxDyn};

use crate::element::{Element, Numeric};
use crate::error::{Result, TensorError};

/// A native tensor: one `ndarray` array per element type.
///
/// Scalars are zero-dimensional arrays. Shapes are always concrete here;
/// variable dimensions only exist on the wire and in specs.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorValue {
    Float(ArrayD<f32>),
    Double(ArrayD<f64>),
    Int8(ArrayD<i8>),
    Int32(ArrayD<i32>),
    Int64(ArrayD<i64>),
    Uint8(ArrayD<u8>),
    Uint32(ArrayD<u32>),
    Uint64(ArrayD<u64>),
    Bool(ArrayD<bool>),
    String(ArrayD<String>),
    Proto(ArrayD<Any>),
}

/// Evaluate `$body` with `$array` bound to the inner array, whatever its
/// element type.
macro_rules! with_array {
    ($value:expr, $array:ident => $body:expr) => {
        match $value {
            $crate::value::TensorValue::Float($array) => $body,
            $crate::value::TensorValue::Double($array) => $body,
            $crate::value::TensorValue::Int8($array) => $body,
            $crate::value::TensorValue::Int32($array) => $body,
            $crate::value::TensorValue::Int64($array) => $body,
            $crate::value::TensorValue::Uint8($array) => $body,
            $crate::value::TensorValue::Uint32($array) => $body,
            $crate::value::TensorValue::Uint64($array) => $body,
            $crate::value::TensorValue::Bool($array) => $body,
            $crate::value::TensorValue::String($array) => $body,
            $crate::value::TensorValue::Proto($array) => $body,
        }
    };
}

pub(crate) use with_array;

impl TensorValue {
    /// A zero-dimensional value.
    pub fn scalar<T: Element>(value: T) -> Self {
        T::wrap(ArrayD::from_elem(IxDyn(&[]), value))
    }

    /// Build from flat row-major elements.
    pub fn from_shape_vec<T: Element>(shape: &[usize], flat: Vec<T>) -> Result<Self> {
        let count = flat.len();
        ArrayD::from_shape_vec(IxDyn(shape), flat)
            .map(T::wrap)
            .map_err(|_| reshape_error(count, shape))
    }

    /// An empty array of `dtype` with the given (zero-sized) shape.
    pub fn empty(dtype: DataType, shape: &[usize]) -> Result<Self> {
        match dtype {
            DataType::Float => Self::from_shape_vec::<f32>(shape, Vec::new()),
            DataType::Double => Self::from_shape_vec::<f64>(shape, Vec::new()),
            DataType::Int8 => Self::from_shape_vec::<i8>(shape, Vec::new()),
            DataType::Int32 => Self::from_shape_vec::<i32>(shape, Vec::new()),
            DataType::Int64 => Self::from_shape_vec::<i64>(shape, Vec::new()),
            DataType::Uint8 => Self::from_shape_vec::<u8>(shape, Vec::new()),
            DataType::Uint32 => Self::from_shape_vec::<u32>(shape, Vec::new()),
            DataType::Uint64 => Self::from_shape_vec::<u64>(shape, Vec::new()),
            DataType::Bool => Self::from_shape_vec::<bool>(shape, Vec::new()),
            DataType::String => Self::from_shape_vec::<String>(shape, Vec::new()),
            DataType::Proto => Self::from_shape_vec::<Any>(shape, Vec::new()),
            DataType::InvalidDataType => Err(TensorError::UnsupportedDtype(dtype)),
        }
    }

    pub fn dtype(&self) -> DataType {
        match self {
            TensorValue::Float(_) => DataType::Float,
            TensorValue::Double(_) => DataType::Double,
            TensorValue::Int8(_) => DataType::Int8,
            TensorValue::Int32(_) => DataType::Int32,
            TensorValue::Int64(_) => DataType::Int64,
            TensorValue::Uint8(_) => DataType::Uint8,
            TensorValue::Uint32(_) => DataType::Uint32,
            TensorValue::Uint64(_) => DataType::Uint64,
            TensorValue::Bool(_) => DataType::Bool,
            TensorValue::String(_) => DataType::String,
            TensorValue::Proto(_) => DataType::Proto,
        }
    }

    pub fn shape(&self) -> &[usize] {
        with_array!(self, array => array.shape())
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        with_array!(self, array => array.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_scalar(&self) -> bool {
        self.shape().is_empty()
    }

    /// Borrow the inner array if it holds `T` elements.
    pub fn as_array<T: Element>(&self) -> Option<&ArrayD<T>> {
        T::array_of(self)
    }

    /// Convert to `to` under the safe-or-same-kind rule.
    ///
    /// Integer to integer conversions are checked value by value; integers
    /// and bools widen to floats; `f64` to `f32` rejects finite values out
    /// of range. Float to integer, anything to bool, and conversions from or
    /// to strings and protos are rejected, unless the value is empty, in
    /// which case any cast succeeds.
    pub fn cast(&self, to: DataType) -> Result<TensorValue> {
        let from = self.dtype();
        if from == to {
            return Ok(self.clone());
        }
        if self.is_empty() {
            return Self::empty(to, self.shape());
        }
        match to {
            DataType::Float => self.cast_numeric::<f32>(),
            DataType::Double => self.cast_numeric::<f64>(),
            DataType::Int8 => self.cast_numeric::<i8>(),
            DataType::Int32 => self.cast_numeric::<i32>(),
            DataType::Int64 => self.cast_numeric::<i64>(),
            DataType::Uint8 => self.cast_numeric::<u8>(),
            DataType::Uint32 => self.cast_numeric::<u32>(),
            DataType::Uint64 => self.cast_numeric::<u64>(),
            DataType::Bool | DataType::String | DataType::Proto => {
                Err(TensorError::IncompatibleCast { from, to })
            }
            DataType::InvalidDataType => Err(TensorError::UnsupportedDtype(to)),
        }
    }

    fn cast_numeric<T: Numeric>(&self) -> Result<TensorValue> {
        let to = T::DTYPE;
        let array = match self {
            TensorValue::Float(a) if T::IS_FLOAT => {
                try_map(a, to, |&v| T::from_float(f64::from(v)))?
            }
            TensorValue::Double(a) if T::IS_FLOAT => try_map(a, to, |&v| T::from_float(v))?,
            TensorValue::Int8(a) => try_map(a, to, |&v| T::from_integer(i128::from(v)))?,
            TensorValue::Int32(a) => try_map(a, to, |&v| T::from_integer(i128::from(v)))?,
            TensorValue::Int64(a) => try_map(a, to, |&v| T::from_integer(i128::from(v)))?,
            TensorValue::Uint8(a) => try_map(a, to, |&v| T::from_integer(i128::from(v)))?,
            TensorValue::Uint32(a) => try_map(a, to, |&v| T::from_integer(i128::from(v)))?,
            TensorValue::Uint64(a) => try_map(a, to, |&v| T::from_integer(i128::from(v)))?,
            TensorValue::Bool(a) => try_map(a, to, |&v| T::from_integer(i128::from(v)))?,
            _ => {
                return Err(TensorError::IncompatibleCast {
                    from: self.dtype(),
                    to,
                })
            }
        };
        Ok(T::wrap(array))
    }
}

fn try_map<S, T>(array: &ArrayD<S>, to: DataType, f: impl Fn(&S) -> Option<T>) -> Result<ArrayD<T>>
where
    S: fmt::Display,
{
    let mut out = Vec::with_capacity(array.len());
    for value in array.iter() {
        let converted = f(value).ok_or_else(|| TensorError::ValueOutOfRange {
            value: value.to_string(),
            to,
        })?;
        out.push(converted);
    }
    let count = out.len();
    ArrayD::from_shape_vec(array.raw_dim(), out)
        .map_err(|_| reshape_error(count, array.shape()))
}

pub(crate) fn reshape_error(count: usize, shape: &[usize]) -> TensorError {
    TensorError::Reshape {
        count,
        shape: shape
            .iter()
            .map(|&d| i32::try_from(d).unwrap_or(i32::MAX))
            .collect(),
    }
}

macro_rules! value_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for TensorValue {
                fn from(value: $ty) -> Self {
                    TensorValue::scalar(value)
                }
            }

            impl From<Vec<$ty>> for TensorValue {
                fn from(values: Vec<$ty>) -> Self {
                    <$ty as Element>::wrap(Array1::from(values).into_dyn())
                }
            }

            impl From<ArrayD<$ty>> for TensorValue {
                fn from(array: ArrayD<$ty>) -> Self {
                    <$ty as Element>::wrap(array)
                }
            }
        )*
    };
}

value_from!(f32, f64, i8, i32, i64, u8, u32, u64, bool, String, Any);

impl From<&str> for TensorValue {
    fn from(value: &str) -> Self {
        TensorValue::scalar(value.to_string())
    }
}
