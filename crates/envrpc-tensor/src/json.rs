//! JSON literals as tensor values, used by the CLI for settings, actions
//! and observation output.

use envrpc_proto::{Any, DataType};
use ndarray::{ArrayViewD, Axis};
use serde_json::{json, Number, Value};

use crate::error::{Result, TensorError};
use crate::value::{with_array, TensorValue};

impl TensorValue {
    /// Build a value from a JSON scalar or (nested) array.
    ///
    /// The dtype is inferred: all booleans give `BOOL`, all integers give
    /// `INT64` (`UINT64` if some exceed `i64`), any non-integer number gives
    /// `DOUBLE`, all strings give `STRING`. Nested arrays must be
    /// rectangular; an empty array is an empty `DOUBLE` array.
    pub fn from_json(value: &Value) -> Result<Self> {
        let mut shape = Vec::new();
        let mut cursor = value;
        while let Value::Array(items) = cursor {
            shape.push(items.len());
            match items.first() {
                Some(first) => cursor = first,
                None => break,
            }
        }

        let mut leaves = Vec::new();
        collect_leaves(value, &shape, 0, &mut leaves)?;
        infer_leaves(&shape, &leaves)
    }

    /// Render as JSON: scalars as JSON scalars, arrays as nested arrays.
    ///
    /// Non-finite floats become `null`; protos become
    /// `{"type_url": ..., "size": ...}`.
    pub fn to_json(&self) -> Value {
        with_array!(self, array => nest(array.view()))
    }
}

fn collect_leaves<'a>(
    value: &'a Value,
    shape: &[usize],
    depth: usize,
    leaves: &mut Vec<&'a Value>,
) -> Result<()> {
    match (value, shape.get(depth)) {
        (Value::Array(items), Some(&len)) if items.len() == len => {
            for item in items {
                collect_leaves(item, shape, depth + 1, leaves)?;
            }
            Ok(())
        }
        (Value::Array(_), _) => Err(TensorError::Jagged { depth }),
        (_, Some(_)) => Err(TensorError::Jagged { depth }),
        (leaf, None) => {
            leaves.push(leaf);
            Ok(())
        }
    }
}

fn infer_leaves(shape: &[usize], leaves: &[&Value]) -> Result<TensorValue> {
    if leaves.is_empty() {
        return TensorValue::empty(DataType::Double, shape);
    }

    if leaves.iter().all(|v| v.is_boolean()) {
        let flat = leaves.iter().filter_map(|v| v.as_bool()).collect();
        return TensorValue::from_shape_vec(shape, flat);
    }
    if leaves.iter().all(|v| v.is_string()) {
        let flat = leaves
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        return TensorValue::from_shape_vec(shape, flat);
    }
    if leaves.iter().all(|v| v.is_number()) {
        if leaves.iter().all(|v| v.is_i64()) {
            let flat = leaves.iter().filter_map(|v| v.as_i64()).collect();
            return TensorValue::from_shape_vec::<i64>(shape, flat);
        }
        if leaves.iter().all(|v| v.is_u64()) {
            let flat = leaves.iter().filter_map(|v| v.as_u64()).collect();
            return TensorValue::from_shape_vec::<u64>(shape, flat);
        }
        let flat = leaves.iter().filter_map(|v| v.as_f64()).collect();
        return TensorValue::from_shape_vec::<f64>(shape, flat);
    }

    match leaves.iter().find(|v| v.is_null() || v.is_object()) {
        Some(Value::Null) => Err(TensorError::UnsupportedInput(
            "null is not a tensor element".to_string(),
        )),
        Some(_) => Err(TensorError::UnsupportedInput(
            "objects are not tensor elements".to_string(),
        )),
        None => Err(TensorError::UnsupportedInput(
            "elements mix booleans, numbers and strings".to_string(),
        )),
    }
}

trait JsonElement {
    fn to_json(&self) -> Value;
}

macro_rules! integer_json {
    ($($ty:ty),*) => {
        $(
            impl JsonElement for $ty {
                fn to_json(&self) -> Value {
                    Value::from(*self)
                }
            }
        )*
    };
}

integer_json!(i8, i32, i64, u8, u32, u64, bool);

impl JsonElement for f32 {
    fn to_json(&self) -> Value {
        // Go through the shortest decimal form so 0.1f32 prints as 0.1.
        let widened = self.to_string().parse::<f64>().unwrap_or(f64::from(*self));
        Number::from_f64(widened).map_or(Value::Null, Value::Number)
    }
}

impl JsonElement for f64 {
    fn to_json(&self) -> Value {
        Number::from_f64(*self).map_or(Value::Null, Value::Number)
    }
}

impl JsonElement for String {
    fn to_json(&self) -> Value {
        Value::String(self.clone())
    }
}

impl JsonElement for Any {
    fn to_json(&self) -> Value {
        json!({ "type_url": self.type_url, "size": self.value.len() })
    }
}

fn nest<T: JsonElement>(view: ArrayViewD<'_, T>) -> Value {
    if view.ndim() == 0 {
        return view.first().map_or(Value::Null, JsonElement::to_json);
    }
    Value::Array(view.axis_iter(Axis(0)).map(nest).collect())
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn infers_dtype_from_elements() {
        let value = TensorValue::from_json(&json!(3)).unwrap();
        assert_eq!(value, TensorValue::from(3i64));

        let value = TensorValue::from_json(&json!([1, 2.5])).unwrap();
        assert_eq!(value, TensorValue::from(vec![1.0f64, 2.5]));

        let value = TensorValue::from_json(&json!([true, false])).unwrap();
        assert_eq!(value, TensorValue::from(vec![true, false]));

        let value = TensorValue::from_json(&json!("hello")).unwrap();
        assert_eq!(value, TensorValue::from("hello"));

        let value = TensorValue::from_json(&json!([u64::MAX])).unwrap();
        assert_eq!(value.dtype(), DataType::Uint64);
    }

    #[test]
    fn nested_arrays_give_shape() {
        let value = TensorValue::from_json(&json!([[1, 2, 3], [4, 5, 6]])).unwrap();
        assert_eq!(value, TensorValue::from(array![[1i64, 2, 3], [4, 5, 6]].into_dyn()));
    }

    #[test]
    fn jagged_input_rejected() {
        let err = TensorValue::from_json(&json!([[1, 2], [3]])).unwrap_err();
        assert_eq!(err, TensorError::Jagged { depth: 1 });

        let err = TensorValue::from_json(&json!([[1], 2])).unwrap_err();
        assert_eq!(err, TensorError::Jagged { depth: 1 });

        let err = TensorValue::from_json(&json!([1, [2]])).unwrap_err();
        assert_eq!(err, TensorError::Jagged { depth: 1 });

        let err = TensorValue::from_json(&json!([[], [1]])).unwrap_err();
        assert!(matches!(err, TensorError::Jagged { .. }));
    }

    #[test]
    fn mixed_and_unsupported_elements_rejected() {
        let err = TensorValue::from_json(&json!([1, "a"])).unwrap_err();
        assert!(matches!(err, TensorError::UnsupportedInput(_)));

        let err = TensorValue::from_json(&json!({"a": 1})).unwrap_err();
        assert!(err.to_string().contains("objects"));

        let err = TensorValue::from_json(&json!([null])).unwrap_err();
        assert!(err.to_string().contains("null"));
    }

    #[test]
    fn empty_array_is_empty_double() {
        let value = TensorValue::from_json(&json!([])).unwrap();
        assert_eq!(value.dtype(), DataType::Double);
        assert_eq!(value.shape(), &[0]);

        let value = TensorValue::from_json(&json!([[], []])).unwrap();
        assert_eq!(value.shape(), &[2, 0]);
    }

    #[test]
    fn renders_nested_json() {
        let value = TensorValue::from(array![[1u8, 2], [3, 4]].into_dyn());
        assert_eq!(value.to_json(), json!([[1, 2], [3, 4]]));
        assert_eq!(TensorValue::from(0.1f32).to_json(), json!(0.1));
        assert_eq!(TensorValue::from(f64::NAN).to_json(), Value::Null);
        assert_eq!(TensorValue::from("x").to_json(), json!("x"));
    }

    #[test]
    fn renders_proto_summary() {
        let value = TensorValue::from(Any {
            type_url: "type.googleapis.com/a.B".to_string(),
            value: vec![0; 4],
        });
        assert_eq!(
            value.to_json(),
            json!({"type_url": "type.googleapis.com/a.B", "size": 4})
        );
    }
}
