use envrpc_proto::{DataType, TensorSpec};

use crate::error::{Result, TensorError};

/// Number of variable (negative) dimensions in a shape.
pub fn variable_dims(shape: &[i32]) -> usize {
    shape.iter().filter(|&&d| d < 0).count()
}

/// Build a spec without bounds, rejecting more than one variable dimension.
pub fn tensor_spec(name: impl Into<String>, dtype: DataType, shape: Vec<i32>) -> Result<TensorSpec> {
    let mut spec = TensorSpec {
        name: name.into(),
        shape,
        ..TensorSpec::default()
    };
    spec.set_dtype(dtype);
    validate_spec(&spec)?;
    Ok(spec)
}

/// Check a spec received from a peer: a valid dtype and at most one
/// variable dimension.
pub fn validate_spec(spec: &TensorSpec) -> Result<()> {
    if variable_dims(&spec.shape) > 1 {
        return Err(TensorError::SpecVariableDims {
            name: spec.name.clone(),
            shape: spec.shape.clone(),
        });
    }
    if spec.dtype() == DataType::InvalidDataType {
        return Err(TensorError::UnsupportedDtype(DataType::InvalidDataType));
    }
    Ok(())
}

/// Element-wise shape match where a negative spec dimension accepts any
/// length.
pub fn shape_matches(actual: &[i32], expected: &[i32]) -> bool {
    actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected)
            .all(|(&a, &e)| e < 0 || a == e)
}
