use envrpc_proto::{ActionObservationSpecs, JoinWorldRequest, LeaveWorldRequest, TensorSpec};
use envrpc_tensor::{bounds, SpecManager, TensorError};
use serde::Serialize;
use serde_json::Value;

use crate::cmd::{open_connection, settings_tensors, JoinArgs};
use crate::exit::{connection_error, tensor_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{inline_json, new_table, print_json, print_message, OutputFormat};

#[derive(Serialize)]
struct SpecRow {
    kind: &'static str,
    uid: u64,
    name: String,
    dtype: &'static str,
    shape: Vec<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<Value>,
}

#[derive(Serialize)]
struct JoinOutput<'a> {
    world_name: &'a str,
    specs: &'a [SpecRow],
}

pub fn run(args: JoinArgs, format: OutputFormat) -> CliResult<i32> {
    let settings = settings_tensors(&args.settings)?;

    let connection = open_connection(&args.connect)?;
    let response = connection
        .send(JoinWorldRequest {
            world_name: args.world.clone(),
            settings,
        })
        .map_err(|err| connection_error("join failed", err))?;

    let specs = response.specs.clone().unwrap_or_default();
    let (actions, observations) = spec_managers(&specs)?;
    let mut rows = spec_rows("action", &actions)?;
    rows.extend(spec_rows("observation", &observations)?);

    connection
        .send(LeaveWorldRequest {})
        .map_err(|err| connection_error("leave failed", err))?;

    match format {
        OutputFormat::Json => print_json(&JoinOutput {
            world_name: &args.world,
            specs: &rows,
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["KIND", "UID", "NAME", "DTYPE", "SHAPE", "MIN", "MAX"]);
            for row in &rows {
                table.add_row(vec![
                    row.kind.to_string(),
                    row.uid.to_string(),
                    row.name.clone(),
                    row.dtype.to_string(),
                    format!("{:?}", row.shape),
                    row.min.as_ref().map(inline_json).unwrap_or_default(),
                    row.max.as_ref().map(inline_json).unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in &rows {
                let mut line = format!(
                    "{} uid={} name={} dtype={} shape={:?}",
                    row.kind, row.uid, row.name, row.dtype, row.shape
                );
                if let (Some(min), Some(max)) = (&row.min, &row.max) {
                    line.push_str(&format!(" min={} max={}", inline_json(min), inline_json(max)));
                }
                println!("{line}");
            }
        }
        OutputFormat::Raw => print_message(&response),
    }

    Ok(SUCCESS)
}

/// Build the action and observation spec managers for advertised specs.
pub fn spec_managers(specs: &ActionObservationSpecs) -> CliResult<(SpecManager, SpecManager)> {
    let invalid = |err: TensorError| {
        CliError::new(DATA_INVALID, format!("server advertised invalid specs: {err}"))
    };
    let actions = SpecManager::new(specs.actions.clone()).map_err(invalid)?;
    let observations = SpecManager::new(specs.observations.clone()).map_err(invalid)?;
    Ok((actions, observations))
}

fn spec_rows(kind: &'static str, manager: &SpecManager) -> CliResult<Vec<SpecRow>> {
    manager
        .specs_by_uid()
        .iter()
        .map(|(&uid, spec)| {
            let (min, max) = bound_columns(spec)?;
            Ok(SpecRow {
                kind,
                uid,
                name: spec.name.clone(),
                dtype: spec.dtype().as_str(),
                shape: spec.shape.clone(),
                min,
                max,
            })
        })
        .collect()
}

/// Bounds are only shown for specs that declare at least one side; the
/// other side then shows its dtype default.
fn bound_columns(spec: &TensorSpec) -> CliResult<(Option<Value>, Option<Value>)> {
    if spec.min.is_none() && spec.max.is_none() {
        return Ok((None, None));
    }
    let bounds = bounds(spec).map_err(|err| tensor_error("invalid spec bounds", err))?;
    Ok((Some(bounds.min.to_json()), Some(bounds.max.to_json())))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use envrpc_proto::DataType;
    use envrpc_tensor::{set_bounds, tensor_spec, TensorValue};

    use super::*;

    fn paddle_spec() -> TensorSpec {
        let mut spec =
            tensor_spec("paddle", DataType::Int32, vec![2]).expect("spec should be valid");
        set_bounds(&mut spec, Some(&TensorValue::from(-1i32)), None)
            .expect("bounds should apply");
        spec
    }

    #[test]
    fn rows_are_ordered_by_uid_with_bounds() {
        let fire = tensor_spec("fire", DataType::Bool, Vec::new()).expect("spec should be valid");
        let specs = ActionObservationSpecs {
            actions: HashMap::from([
                (9, fire),
                (2, paddle_spec()),
            ]),
            observations: HashMap::new(),
        };
        let (actions, _) = spec_managers(&specs).expect("specs should be valid");
        let rows = spec_rows("action", &actions).expect("rows should build");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].uid, 2);
        assert_eq!(rows[0].min, Some(serde_json::json!([-1, -1])));
        assert_eq!(rows[0].max, Some(serde_json::json!([i32::MAX, i32::MAX])));
        assert_eq!(rows[1].name, "fire");
        assert!(rows[1].min.is_none());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let score = tensor_spec("score", DataType::Int64, Vec::new()).expect("spec should be valid");
        let specs = ActionObservationSpecs {
            actions: HashMap::new(),
            observations: HashMap::from([(1, score.clone()), (2, score)]),
        };
        let err = spec_managers(&specs).expect_err("duplicate names should fail");
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.contains("score"));
    }
}
