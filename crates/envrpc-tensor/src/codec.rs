use std::borrow::Cow;

use envrpc_proto::{Any, DataType, Payload, Tensor};
use ndarray::{ArrayD, IxDyn};
use tracing::trace;

use crate::element::Element;
use crate::error::{Result, TensorError};
use crate::value::{with_array, TensorValue};

/// Convert a native value into a wire tensor.
///
/// With `dtype` set, the value is first cast to it (see
/// [`TensorValue::cast`]); otherwise the value's own dtype is used. With
/// `try_compress`, a multi-element value whose elements are all equal is
/// sent as a single element plus the full shape.
pub fn pack(value: &TensorValue, dtype: Option<DataType>, try_compress: bool) -> Result<Tensor> {
    let value = match dtype {
        Some(dtype) if dtype != value.dtype() => Cow::Owned(value.cast(dtype)?),
        _ => Cow::Borrowed(value),
    };
    with_array!(&*value, array => pack_array(array, try_compress))
}

fn pack_array<T: Element>(array: &ArrayD<T>, try_compress: bool) -> Result<Tensor> {
    let shape = array
        .shape()
        .iter()
        .map(|&dim| i32::try_from(dim).map_err(|_| TensorError::DimensionOverflow { dim }))
        .collect::<Result<Vec<_>>>()?;

    let mut flat: Vec<T> = array.iter().cloned().collect();
    if try_compress && flat.len() > 1 && flat.iter().all(|v| *v == flat[0]) {
        trace!(elements = flat.len(), "compressing uniform tensor");
        flat.truncate(1);
    }

    Ok(Tensor {
        payload: Some(T::into_payload(flat)),
        shape,
    })
}

/// Convert a wire tensor into a native value.
///
/// An empty shape requires exactly one element. A single element with a
/// non-empty shape is broadcast to that shape (a variable dimension becomes
/// 1). Otherwise a `-1` dimension is inferred by exact division and the
/// element count must fill the shape.
pub fn unpack(tensor: &Tensor) -> Result<TensorValue> {
    let payload = tensor.payload.as_ref().ok_or(TensorError::MissingPayload)?;
    match payload.data_type() {
        DataType::Float => unpack_as::<f32>(payload, &tensor.shape),
        DataType::Double => unpack_as::<f64>(payload, &tensor.shape),
        DataType::Int8 => unpack_as::<i8>(payload, &tensor.shape),
        DataType::Int32 => unpack_as::<i32>(payload, &tensor.shape),
        DataType::Int64 => unpack_as::<i64>(payload, &tensor.shape),
        DataType::Uint8 => unpack_as::<u8>(payload, &tensor.shape),
        DataType::Uint32 => unpack_as::<u32>(payload, &tensor.shape),
        DataType::Uint64 => unpack_as::<u64>(payload, &tensor.shape),
        DataType::Bool => unpack_as::<bool>(payload, &tensor.shape),
        DataType::String => unpack_as::<String>(payload, &tensor.shape),
        DataType::Proto => unpack_as::<Any>(payload, &tensor.shape),
        dtype @ DataType::InvalidDataType => Err(TensorError::UnsupportedDtype(dtype)),
    }
}

fn unpack_as<T: Element>(payload: &Payload, shape: &[i32]) -> Result<TensorValue> {
    let flat = T::from_payload(payload).ok_or(TensorError::UnsupportedDtype(T::DTYPE))?;
    reshape(flat, shape).map(T::wrap)
}

pub(crate) fn reshape<T: Clone>(flat: Vec<T>, shape: &[i32]) -> Result<ArrayD<T>> {
    if shape.is_empty() {
        return match flat.as_slice() {
            [value] => Ok(ArrayD::from_elem(IxDyn(&[]), value.clone())),
            _ => Err(TensorError::ScalarElementCount { count: flat.len() }),
        };
    }

    if let [value] = flat.as_slice() {
        let dims: Vec<usize> = shape.iter().map(|&d| d.max(1) as usize).collect();
        if checked_len::<T>(&dims).is_none() {
            return Err(TensorError::Reshape {
                count: 1,
                shape: shape.to_vec(),
            });
        }
        return Ok(ArrayD::from_elem(IxDyn(&dims), value.clone()));
    }

    let count = flat.len();
    let dims = resolve_shape(shape, count)?;
    ArrayD::from_shape_vec(IxDyn(&dims), flat).map_err(|_| TensorError::Reshape {
        count,
        shape: shape.to_vec(),
    })
}

/// Element count of an array with `dims`, or `None` when its storage would
/// not be addressable.
pub(crate) fn checked_len<T>(dims: &[usize]) -> Option<usize> {
    let count = dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))?;
    let bytes = count.checked_mul(std::mem::size_of::<T>().max(1))?;
    (bytes <= isize::MAX as usize).then_some(count)
}

/// Resolve a wire shape against an element count.
///
/// At most one dimension may be negative; it is inferred as `count` divided
/// by the product of the others, which must divide exactly. Without a
/// negative dimension the product must equal `count`.
pub fn resolve_shape(shape: &[i32], count: usize) -> Result<Vec<usize>> {
    let reshape_error = || TensorError::Reshape {
        count,
        shape: shape.to_vec(),
    };

    let variable = shape.iter().filter(|&&d| d < 0).count();
    if variable > 1 {
        return Err(TensorError::MultipleVariableDims {
            shape: shape.to_vec(),
        });
    }

    let known = shape
        .iter()
        .filter(|&&d| d >= 0)
        .try_fold(1usize, |acc, &d| acc.checked_mul(d as usize))
        .ok_or_else(reshape_error)?;

    let inferred = if variable == 0 {
        if known != count {
            return Err(reshape_error());
        }
        0
    } else {
        if known == 0 || count % known != 0 {
            return Err(reshape_error());
        }
        count / known
    };

    Ok(shape
        .iter()
        .map(|&d| if d < 0 { inferred } else { d as usize })
        .collect())
}

/// Data type of the populated payload.
pub fn tensor_dtype(tensor: &Tensor) -> Result<DataType> {
    tensor.data_type().ok_or(TensorError::MissingPayload)
}

#[cfg(test)]
mod tests {
    use envrpc_proto::tensor::{Int8Array, StringArray, Uint8Array};
    use ndarray::array;

    use super::*;

    fn roundtrip(value: TensorValue) {
        let tensor = pack(&value, None, false).unwrap();
        assert_eq!(tensor_dtype(&tensor).unwrap(), value.dtype());
        assert_eq!(unpack(&tensor).unwrap(), value);
    }

    #[test]
    fn roundtrip_every_dtype() {
        roundtrip(TensorValue::from(vec![1.5f32, -0.0, f32::MAX]));
        roundtrip(TensorValue::from(array![[1.0f64, 2.5], [f64::MIN_POSITIVE, -3.0]].into_dyn()));
        roundtrip(TensorValue::from(vec![i8::MIN, -1, 0, i8::MAX]));
        roundtrip(TensorValue::from(vec![i32::MIN, 7]));
        roundtrip(TensorValue::from(i64::MAX));
        roundtrip(TensorValue::from(vec![0u8, 255]));
        roundtrip(TensorValue::from(u32::MAX));
        roundtrip(TensorValue::from(vec![u64::MAX, 0]));
        roundtrip(TensorValue::from(vec![true, false, true]));
        roundtrip(TensorValue::from(vec!["héllo".to_string(), String::new()]));
        roundtrip(TensorValue::from(Any {
            type_url: "type.googleapis.com/envrpc.v1.Tensor".to_string(),
            value: vec![1, 2, 3],
        }));
    }

    #[test]
    fn floats_roundtrip_bit_exact() {
        let value = TensorValue::from(vec![f32::NAN, f32::INFINITY, 1.0e-45]);
        let unpacked = unpack(&pack(&value, None, false).unwrap()).unwrap();
        let bits: Vec<u32> = unpacked
            .as_array::<f32>()
            .unwrap()
            .iter()
            .map(|v| v.to_bits())
            .collect();
        let expected: Vec<u32> = [f32::NAN, f32::INFINITY, 1.0e-45]
            .iter()
            .map(|v| v.to_bits())
            .collect();
        assert_eq!(bits, expected);
    }

    #[test]
    fn scalar_packs_with_empty_shape() {
        let tensor = pack(&TensorValue::from(4i64), Some(DataType::Uint8), false).unwrap();
        assert!(tensor.shape.is_empty());
        assert_eq!(
            tensor.payload,
            Some(Payload::Uint8s(Uint8Array { array: vec![4] }))
        );
    }

    #[test]
    fn byte_dtypes_pack_as_contiguous_buffer() {
        let value = TensorValue::from(array![[-1i8, 2], [3, -4]].into_dyn());
        let tensor = pack(&value, None, false).unwrap();
        assert_eq!(tensor.shape, vec![2, 2]);
        assert_eq!(
            tensor.payload,
            Some(Payload::Int8s(Int8Array {
                array: vec![0xFF, 2, 3, 0xFC]
            }))
        );
    }

    #[test]
    fn pack_with_incompatible_dtype_fails() {
        let err = pack(&TensorValue::from(1.5f64), Some(DataType::Int32), false).unwrap_err();
        assert!(matches!(err, TensorError::IncompatibleCast { .. }));
    }

    #[test]
    fn compression_keeps_shape() {
        let value = TensorValue::from(array![[5u32, 5], [5, 5]].into_dyn());
        let tensor = pack(&value, None, true).unwrap();
        assert_eq!(tensor.shape, vec![2, 2]);
        assert_eq!(tensor.payload.as_ref().map(Payload::len), Some(1));
        assert_eq!(unpack(&tensor).unwrap(), value);

        let mixed = TensorValue::from(vec![1u32, 2]);
        let tensor = pack(&mixed, None, true).unwrap();
        assert_eq!(tensor.payload.as_ref().map(Payload::len), Some(2));
    }

    #[test]
    fn single_element_broadcasts() {
        let tensor = pack(&TensorValue::from(5i32), None, false).unwrap();
        let tensor = Tensor {
            shape: vec![4],
            ..tensor
        };
        assert_eq!(
            unpack(&tensor).unwrap(),
            TensorValue::from(vec![5i32, 5, 5, 5])
        );
    }

    #[test]
    fn broadcast_resolves_variable_dim_to_one() {
        let tensor = Tensor {
            payload: Some(Payload::Strings(StringArray {
                array: vec!["x".to_string()],
            })),
            shape: vec![2, -1],
        };
        let value = unpack(&tensor).unwrap();
        assert_eq!(value.shape(), &[2, 1]);
    }

    #[test]
    fn broadcast_to_unaddressable_shape_is_rejected() {
        let tensor = Tensor {
            payload: Some(Payload::Uint8s(Uint8Array { array: vec![1] })),
            shape: vec![i32::MAX; 3],
        };
        let err = unpack(&tensor).unwrap_err();
        assert_eq!(
            err,
            TensorError::Reshape {
                count: 1,
                shape: vec![i32::MAX; 3]
            }
        );
    }

    #[test]
    fn scalar_requires_exactly_one_element() {
        let tensor = Tensor {
            payload: Some(Payload::Uint8s(Uint8Array { array: vec![1, 2] })),
            shape: Vec::new(),
        };
        let err = unpack(&tensor).unwrap_err();
        assert_eq!(err, TensorError::ScalarElementCount { count: 2 });
        assert!(err
            .to_string()
            .contains("scalar tensors must have exactly 1 element"));

        let empty = Tensor {
            payload: Some(Payload::Uint8s(Uint8Array { array: Vec::new() })),
            shape: Vec::new(),
        };
        assert!(matches!(
            unpack(&empty).unwrap_err(),
            TensorError::ScalarElementCount { count: 0 }
        ));
    }

    #[test]
    fn variable_dimension_inferred() {
        let tensor = Tensor {
            payload: Some(i64::into_payload((0..6).collect())),
            shape: vec![2, -1],
        };
        let value = unpack(&tensor).unwrap();
        assert_eq!(value, TensorValue::from(array![[0i64, 1, 2], [3, 4, 5]].into_dyn()));
    }

    #[test]
    fn variable_dimension_must_divide_exactly() {
        let tensor = Tensor {
            payload: Some(i64::into_payload((0..5).collect())),
            shape: vec![2, -1],
        };
        let err = unpack(&tensor).unwrap_err();
        assert_eq!(
            err,
            TensorError::Reshape {
                count: 5,
                shape: vec![2, -1]
            }
        );
    }

    #[test]
    fn zero_length_inference_is_valid() {
        let tensor = Tensor {
            payload: Some(f64::into_payload(Vec::new())),
            shape: vec![-1],
        };
        assert_eq!(unpack(&tensor).unwrap().shape(), &[0]);
        assert_eq!(resolve_shape(&[3, -1], 0).unwrap(), vec![3, 0]);
    }

    #[test]
    fn zero_product_cannot_infer() {
        let err = resolve_shape(&[0, -1], 4).unwrap_err();
        assert!(matches!(err, TensorError::Reshape { count: 4, .. }));
    }

    #[test]
    fn element_count_must_match_fixed_shape() {
        let tensor = Tensor {
            payload: Some(u32::into_payload(vec![1, 2, 3])),
            shape: vec![2, 2],
        };
        assert!(matches!(
            unpack(&tensor).unwrap_err(),
            TensorError::Reshape { count: 3, .. }
        ));
    }

    #[test]
    fn multiple_variable_dims_rejected() {
        let err = resolve_shape(&[-1, -1], 4).unwrap_err();
        assert_eq!(
            err,
            TensorError::MultipleVariableDims {
                shape: vec![-1, -1]
            }
        );
    }

    #[test]
    fn missing_payload_is_an_error() {
        let tensor = Tensor {
            payload: None,
            shape: vec![1],
        };
        assert_eq!(unpack(&tensor).unwrap_err(), TensorError::MissingPayload);
        assert_eq!(tensor_dtype(&tensor).unwrap_err(), TensorError::MissingPayload);
    }
}
