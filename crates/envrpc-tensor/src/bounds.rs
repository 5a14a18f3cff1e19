use envrpc_proto::{tensor_spec, DataType, TensorSpec};
use ndarray::{ArrayD, IxDyn};

use crate::codec::{checked_len, pack};
use crate::element::Numeric;
use crate::error::{Result, TensorError};
use crate::spec::variable_dims;
use crate::value::TensorValue;

/// Inclusive value range of a numeric spec.
///
/// Both values have the spec's dtype. A spec with a variable dimension only
/// has scalar bounds; otherwise scalar bounds are broadcast to the spec's
/// shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub min: TensorValue,
    pub max: TensorValue,
}

/// Read the bounds of `spec`, defaulting each missing side to the dtype's
/// representable extreme.
pub fn bounds(spec: &TensorSpec) -> Result<Bounds> {
    let dtype = spec.dtype();
    if !dtype.is_numeric() {
        return Err(TensorError::NonNumericBounds {
            name: spec.name.clone(),
            dtype,
        });
    }
    check_bound_type(spec, "min", spec.min.as_ref())?;
    check_bound_type(spec, "max", spec.max.as_ref())?;

    match dtype {
        DataType::Float => bounds_as::<f32>(spec),
        DataType::Double => bounds_as::<f64>(spec),
        DataType::Int8 => bounds_as::<i8>(spec),
        DataType::Int32 => bounds_as::<i32>(spec),
        DataType::Int64 => bounds_as::<i64>(spec),
        DataType::Uint8 => bounds_as::<u8>(spec),
        DataType::Uint32 => bounds_as::<u32>(spec),
        DataType::Uint64 => bounds_as::<u64>(spec),
        _ => Err(TensorError::NonNumericBounds {
            name: spec.name.clone(),
            dtype,
        }),
    }
}

/// Write `min` / `max` into the spec, clearing a side given as `None`.
///
/// Each value is safely cast to the spec dtype and must be a single element
/// or have as many elements as the spec's shape. The spec is only modified
/// if the resulting bounds are valid.
pub fn set_bounds(
    spec: &mut TensorSpec,
    min: Option<&TensorValue>,
    max: Option<&TensorValue>,
) -> Result<()> {
    let dtype = spec.dtype();
    if !dtype.is_numeric() {
        return Err(TensorError::NonNumericBounds {
            name: spec.name.clone(),
            dtype,
        });
    }

    let mut updated = spec.clone();
    updated.min = min.map(|value| bound_value(spec, "min", value)).transpose()?;
    updated.max = max.map(|value| bound_value(spec, "max", value)).transpose()?;
    bounds(&updated)?;

    *spec = updated;
    Ok(())
}

fn bound_value(
    spec: &TensorSpec,
    which: &'static str,
    value: &TensorValue,
) -> Result<tensor_spec::Value> {
    let count = value.len();
    if count != 1 {
        if variable_dims(&spec.shape) > 0 {
            return Err(TensorError::VariableShapeBounds {
                name: spec.name.clone(),
                which,
                count,
            });
        }
        let spec_len = spec
            .shape
            .iter()
            .map(|&d| usize::try_from(d).ok())
            .collect::<Option<Vec<_>>>()
            .and_then(|dims| checked_len::<u8>(&dims));
        if spec_len != Some(count) {
            return Err(TensorError::BoundShape {
                name: spec.name.clone(),
                which,
                count,
                shape: spec.shape.clone(),
            });
        }
    }

    let tensor = pack(value, Some(spec.dtype()), false)?;
    Ok(tensor_spec::Value {
        payload: tensor.payload,
    })
}

fn check_bound_type(
    spec: &TensorSpec,
    which: &'static str,
    value: Option<&tensor_spec::Value>,
) -> Result<()> {
    let dtype = spec.dtype();
    match value.and_then(|v| v.payload.as_ref()) {
        Some(payload) if payload.data_type() != dtype => Err(TensorError::BoundTypeMismatch {
            name: spec.name.clone(),
            dtype,
            which,
            bound: payload.data_type(),
        }),
        _ => Ok(()),
    }
}

enum Side<T> {
    Scalar(T),
    Elementwise(ArrayD<T>),
}

fn bounds_as<T: Numeric>(spec: &TensorSpec) -> Result<Bounds> {
    let min = read_bound(spec, "min", spec.min.as_ref(), T::MIN)?;
    let max = read_bound(spec, "max", spec.max.as_ref(), T::MAX)?;

    let dims: Vec<usize> = if variable_dims(&spec.shape) > 0 {
        Vec::new()
    } else {
        spec.shape.iter().map(|&d| d as usize).collect()
    };
    let widen = |which: &'static str, side: Side<T>| -> Result<ArrayD<T>> {
        match side {
            Side::Scalar(value) => {
                checked_len::<T>(&dims).ok_or_else(|| TensorError::BoundShape {
                    name: spec.name.clone(),
                    which,
                    count: 1,
                    shape: spec.shape.clone(),
                })?;
                Ok(ArrayD::from_elem(IxDyn(&dims), value))
            }
            Side::Elementwise(array) => Ok(array),
        }
    };
    let (min, max) = (widen("min", min)?, widen("max", max)?);

    if let Some((lo, hi)) = min.iter().zip(max.iter()).find(|(lo, hi)| lo > hi) {
        return Err(TensorError::MinGreaterThanMax {
            name: spec.name.clone(),
            min: lo.to_string(),
            max: hi.to_string(),
        });
    }

    Ok(Bounds {
        min: T::wrap(min),
        max: T::wrap(max),
    })
}

fn read_bound<T: Numeric>(
    spec: &TensorSpec,
    which: &'static str,
    value: Option<&tensor_spec::Value>,
    default: T,
) -> Result<Side<T>> {
    let flat = match value.and_then(|v| v.payload.as_ref()) {
        Some(payload) if !payload.is_empty() => {
            T::from_payload(payload).ok_or_else(|| TensorError::BoundTypeMismatch {
                name: spec.name.clone(),
                dtype: T::DTYPE,
                which,
                bound: payload.data_type(),
            })?
        }
        _ => return Ok(Side::Scalar(default)),
    };

    let count = flat.len();
    if let [single] = flat.as_slice() {
        return Ok(Side::Scalar(*single));
    }
    if variable_dims(&spec.shape) > 0 {
        return Err(TensorError::VariableShapeBounds {
            name: spec.name.clone(),
            which,
            count,
        });
    }
    if spec.shape.is_empty() {
        return Err(TensorError::ScalarElementCount { count });
    }

    let dims: Vec<usize> = spec.shape.iter().map(|&d| d as usize).collect();
    ArrayD::from_shape_vec(IxDyn(&dims), flat)
        .map(Side::Elementwise)
        .map_err(|_| TensorError::BoundShape {
            name: spec.name.clone(),
            which,
            count,
            shape: spec.shape.clone(),
        })
}
