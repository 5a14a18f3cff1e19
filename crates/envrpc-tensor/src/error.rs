use envrpc_proto::DataType;

/// Errors raised while packing, unpacking or validating tensors.
///
/// Every variant is raised locally and carries the names, dtypes and shapes
/// needed to explain the failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TensorError {
    /// The data type cannot be used here (e.g. `INVALID_DATA_TYPE`).
    #[error("unsupported data type {0}")]
    UnsupportedDtype(DataType),

    /// A wire tensor or bound arrived without any payload field set.
    #[error("tensor has no payload")]
    MissingPayload,

    /// The cast would change the kind of the values (e.g. float to integer).
    #[error("cannot safely cast {from} values to {to}")]
    IncompatibleCast { from: DataType, to: DataType },

    /// A value does not fit in the target type.
    #[error("value {value} is out of range for {to}")]
    ValueOutOfRange { value: String, to: DataType },

    /// Nested input whose sub-arrays differ in length.
    #[error("jagged input: sub-arrays at depth {depth} differ in length or nesting")]
    Jagged { depth: usize },

    /// Input that has no tensor representation.
    #[error("unsupported tensor input: {0}")]
    UnsupportedInput(String),

    /// A scalar (empty shape) tensor did not hold exactly one element.
    #[error("scalar tensors must have exactly 1 element but had {count} elements")]
    ScalarElementCount { count: usize },

    /// A shape with more than one `-1` dimension.
    #[error("shape {shape:?} has more than one variable-length dimension")]
    MultipleVariableDims { shape: Vec<i32> },

    /// Element count incompatible with the requested shape.
    #[error("cannot reshape {count} elements into shape {shape:?}")]
    Reshape { count: usize, shape: Vec<i32> },

    /// A native dimension that does not fit the wire's int32 shape.
    #[error("dimension {dim} does not fit in an int32 shape")]
    DimensionOverflow { dim: usize },

    /// Bounds requested for a non-numeric spec.
    #[error("TensorSpec \"{name}\" has non-numeric type {dtype}")]
    NonNumericBounds { name: String, dtype: DataType },

    /// The populated bound payload does not match the spec dtype.
    #[error("TensorSpec \"{name}\" has dtype {dtype} but {which} type {bound}")]
    BoundTypeMismatch {
        name: String,
        dtype: DataType,
        which: &'static str,
        bound: DataType,
    },

    /// A multi-element bound whose size or shape differs from the spec's.
    #[error("TensorSpec \"{name}\" {which} bound with {count} elements cannot broadcast to shape {shape:?}")]
    BoundShape {
        name: String,
        which: &'static str,
        count: usize,
        shape: Vec<i32>,
    },

    /// An elementwise bound on a spec with a variable-length dimension.
    #[error("TensorSpec \"{name}\" has a variable-length shape and can only have scalar ranges, but its {which} bound has {count} elements")]
    VariableShapeBounds {
        name: String,
        which: &'static str,
        count: usize,
    },

    /// Some element of `min` exceeds the matching element of `max`.
    #[error("TensorSpec \"{name}\" has min {min} larger than max {max}")]
    MinGreaterThanMax {
        name: String,
        min: String,
        max: String,
    },

    /// A spec shape with more than one `-1` dimension.
    #[error("\"{name}\" shape {shape:?} has > 1 variable length dimension")]
    SpecVariableDims { name: String, shape: Vec<i32> },

    /// Two specs in one set share a name.
    #[error("there are duplicate names in the tensor specs: \"{name}\"")]
    DuplicateName { name: String },

    /// No spec with this name.
    #[error("no tensor spec named \"{name}\"")]
    UnknownName { name: String },

    /// No spec with this UID.
    #[error("no tensor spec with uid {uid}")]
    UnknownUid { uid: u64 },

    /// A tensor whose shape does not match its spec.
    #[error("tensor \"{name}\" has shape {actual:?} but spec has shape {expected:?}")]
    ShapeMismatch {
        name: String,
        actual: Vec<i32>,
        expected: Vec<i32>,
    },

    /// A received tensor whose dtype does not match its spec.
    #[error("tensor \"{name}\" has dtype {actual} but spec has dtype {expected}")]
    DtypeMismatch {
        name: String,
        actual: DataType,
        expected: DataType,
    },

    /// Packing a named value failed.
    #[error("cannot pack \"{name}\": {source}")]
    Pack {
        name: String,
        source: Box<TensorError>,
    },

    /// Unpacking a named tensor failed.
    #[error("cannot unpack \"{name}\": {source}")]
    Unpack {
        name: String,
        source: Box<TensorError>,
    },
}

impl TensorError {
    /// Whether this is a lookup of a name or UID the spec set does not have.
    pub fn is_unknown_key(&self) -> bool {
        match self {
            TensorError::UnknownName { .. } | TensorError::UnknownUid { .. } => true,
            TensorError::Pack { source, .. } | TensorError::Unpack { source, .. } => {
                source.is_unknown_key()
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TensorError>;
