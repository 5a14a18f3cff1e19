use std::fmt;

/// Element type of a tensor or tensor spec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum DataType {
    InvalidDataType = 0,
    Uint8 = 1,
    Uint32 = 2,
    Uint64 = 3,
    Int8 = 4,
    Int32 = 5,
    Int64 = 6,
    Float = 7,
    Double = 8,
    Bool = 9,
    String = 10,
    Proto = 11,
}

impl DataType {
    /// Every valid (non-`INVALID`) data type.
    pub const ALL: [DataType; 11] = [
        DataType::Uint8,
        DataType::Uint32,
        DataType::Uint64,
        DataType::Int8,
        DataType::Int32,
        DataType::Int64,
        DataType::Float,
        DataType::Double,
        DataType::Bool,
        DataType::String,
        DataType::Proto,
    ];

    /// Lowercase name, as used in error messages and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::InvalidDataType => "invalid_data_type",
            DataType::Uint8 => "uint8",
            DataType::Uint32 => "uint32",
            DataType::Uint64 => "uint64",
            DataType::Int8 => "int8",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::Bool => "bool",
            DataType::String => "string",
            DataType::Proto => "proto",
        }
    }

    /// Parse a lowercase name produced by [`DataType::as_str`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|dtype| dtype.as_str() == name)
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            DataType::Uint8
                | DataType::Uint32
                | DataType::Uint64
                | DataType::Int8
                | DataType::Int32
                | DataType::Int64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, DataType::Float | DataType::Double)
    }

    /// Integer and floating-point types; the only types that carry bounds.
    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct FloatArray {
    #[prost(float, repeated, tag = "1")]
    pub array: Vec<f32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DoubleArray {
    #[prost(double, repeated, tag = "1")]
    pub array: Vec<f64>,
}

/// Signed bytes, packed as one contiguous buffer.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Int8Array {
    #[prost(bytes = "vec", tag = "1")]
    pub array: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Int32Array {
    #[prost(int32, repeated, tag = "1")]
    pub array: Vec<i32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Int64Array {
    #[prost(int64, repeated, tag = "1")]
    pub array: Vec<i64>,
}

/// Unsigned bytes, packed as one contiguous buffer.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Uint8Array {
    #[prost(bytes = "vec", tag = "1")]
    pub array: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Uint32Array {
    #[prost(uint32, repeated, tag = "1")]
    pub array: Vec<u32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Uint64Array {
    #[prost(uint64, repeated, tag = "1")]
    pub array: Vec<u64>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BoolArray {
    #[prost(bool, repeated, tag = "1")]
    pub array: Vec<bool>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StringArray {
    #[prost(string, repeated, tag = "1")]
    pub array: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ProtoArray {
    #[prost(message, repeated, tag = "1")]
    pub array: Vec<prost_types::Any>,
}

/// Flat, row-major element storage shared by [`Tensor`] and
/// [`tensor_spec::Value`].
#[derive(Clone, PartialEq, prost::Oneof)]
pub enum Payload {
    #[prost(message, tag = "1")]
    Floats(FloatArray),
    #[prost(message, tag = "2")]
    Doubles(DoubleArray),
    #[prost(message, tag = "3")]
    Int8s(Int8Array),
    #[prost(message, tag = "4")]
    Int32s(Int32Array),
    #[prost(message, tag = "5")]
    Int64s(Int64Array),
    #[prost(message, tag = "6")]
    Uint8s(Uint8Array),
    #[prost(message, tag = "7")]
    Uint32s(Uint32Array),
    #[prost(message, tag = "8")]
    Uint64s(Uint64Array),
    #[prost(message, tag = "9")]
    Bools(BoolArray),
    #[prost(message, tag = "10")]
    Strings(StringArray),
    #[prost(message, tag = "11")]
    Protos(ProtoArray),
}

impl Payload {
    /// The element type this payload variant carries.
    pub fn data_type(&self) -> DataType {
        match self {
            Payload::Floats(_) => DataType::Float,
            Payload::Doubles(_) => DataType::Double,
            Payload::Int8s(_) => DataType::Int8,
            Payload::Int32s(_) => DataType::Int32,
            Payload::Int64s(_) => DataType::Int64,
            Payload::Uint8s(_) => DataType::Uint8,
            Payload::Uint32s(_) => DataType::Uint32,
            Payload::Uint64s(_) => DataType::Uint64,
            Payload::Bools(_) => DataType::Bool,
            Payload::Strings(_) => DataType::String,
            Payload::Protos(_) => DataType::Proto,
        }
    }

    /// Oneof field name of this variant.
    pub fn field_name(&self) -> &'static str {
        match self {
            Payload::Floats(_) => "floats",
            Payload::Doubles(_) => "doubles",
            Payload::Int8s(_) => "int8s",
            Payload::Int32s(_) => "int32s",
            Payload::Int64s(_) => "int64s",
            Payload::Uint8s(_) => "uint8s",
            Payload::Uint32s(_) => "uint32s",
            Payload::Uint64s(_) => "uint64s",
            Payload::Bools(_) => "bools",
            Payload::Strings(_) => "strings",
            Payload::Protos(_) => "protos",
        }
    }

    /// Number of flat elements.
    pub fn len(&self) -> usize {
        match self {
            Payload::Floats(a) => a.array.len(),
            Payload::Doubles(a) => a.array.len(),
            Payload::Int8s(a) => a.array.len(),
            Payload::Int32s(a) => a.array.len(),
            Payload::Int64s(a) => a.array.len(),
            Payload::Uint8s(a) => a.array.len(),
            Payload::Uint32s(a) => a.array.len(),
            Payload::Uint64s(a) => a.array.len(),
            Payload::Bools(a) => a.array.len(),
            Payload::Strings(a) => a.array.len(),
            Payload::Protos(a) => a.array.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A shaped, typed array or scalar in wire form.
///
/// An empty `shape` is a scalar. A single `-1` dimension is inferred from
/// the element count. A payload holding exactly one element is broadcast to
/// fill the whole shape.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Tensor {
    #[prost(oneof = "Payload", tags = "1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11")]
    pub payload: Option<Payload>,
    #[prost(int32, repeated, tag = "15")]
    pub shape: Vec<i32>,
}

impl Tensor {
    /// Data type of the populated payload, if any.
    pub fn data_type(&self) -> Option<DataType> {
        self.payload.as_ref().map(Payload::data_type)
    }
}

/// Declared contract for a named quantity: dtype, shape and optional
/// inclusive bounds.
#[derive(Clone, PartialEq, prost::Message)]
pub struct TensorSpec {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(int32, repeated, tag = "2")]
    pub shape: Vec<i32>,
    #[prost(enumeration = "DataType", tag = "3")]
    pub dtype: i32,
    #[prost(message, optional, tag = "9")]
    pub min: Option<tensor_spec::Value>,
    #[prost(message, optional, tag = "10")]
    pub max: Option<tensor_spec::Value>,
}

pub mod tensor_spec {
    /// Scalar or spec-shaped bound data.
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Value {
        #[prost(oneof = "super::Payload", tags = "1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11")]
        pub payload: Option<super::Payload>,
    }
}
