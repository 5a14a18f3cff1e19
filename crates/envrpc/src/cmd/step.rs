use std::collections::BTreeMap;

use envrpc_connection::Connection;
use envrpc_proto::{
    ActionObservationSpecs, JoinWorldRequest, LeaveWorldRequest, StepRequest, StepResponse,
};
use envrpc_tensor::{SpecManager, TensorValue};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cmd::join::spec_managers;
use crate::cmd::{open_connection, parse_assignments, settings_tensors, StepArgs};
use crate::exit::{connection_error, tensor_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{inline_json, new_table, print_json, print_message, OutputFormat};

#[derive(Serialize)]
struct StepOutput<'a> {
    world_name: &'a str,
    state: &'static str,
    observations: BTreeMap<&'a str, Value>,
}

struct Stepped {
    response: StepResponse,
    observations: BTreeMap<String, TensorValue>,
}

pub fn run(args: StepArgs, format: OutputFormat) -> CliResult<i32> {
    let settings = settings_tensors(&args.settings)?;
    let actions = parse_assignments("action", &args.actions)?;

    let connection = open_connection(&args.connect)?;
    let joined = connection
        .send(JoinWorldRequest {
            world_name: args.world.clone(),
            settings,
        })
        .map_err(|err| connection_error("join failed", err))?;

    let specs = joined.specs.unwrap_or_default();
    let stepped = step_once(&connection, &specs, &actions, &args.observe);
    // Leave even when the step failed; the step error takes precedence.
    let left = connection
        .send(LeaveWorldRequest {})
        .map_err(|err| connection_error("leave failed", err));
    let stepped = stepped?;
    left?;

    let state = stepped.response.state().as_str();
    match format {
        OutputFormat::Json => print_json(&StepOutput {
            world_name: &args.world,
            state,
            observations: stepped
                .observations
                .iter()
                .map(|(name, value)| (name.as_str(), value.to_json()))
                .collect(),
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["OBSERVATION", "DTYPE", "SHAPE", "VALUE"]);
            for (name, value) in &stepped.observations {
                table.add_row(vec![
                    name.clone(),
                    value.dtype().to_string(),
                    format!("{:?}", value.shape()),
                    inline_json(&value.to_json()),
                ]);
            }
            println!("{table}");
            println!("state: {state}");
        }
        OutputFormat::Pretty => {
            println!("state={state}");
            for (name, value) in &stepped.observations {
                println!("{name}={}", inline_json(&value.to_json()));
            }
        }
        OutputFormat::Raw => print_message(&stepped.response),
    }

    Ok(SUCCESS)
}

fn step_once(
    connection: &Connection,
    specs: &ActionObservationSpecs,
    actions: &[(String, TensorValue)],
    observe: &[String],
) -> CliResult<Stepped> {
    let (action_specs, observation_specs) = spec_managers(specs)?;
    let request = step_request(&action_specs, &observation_specs, actions, observe)?;
    debug!(
        actions = request.actions.len(),
        observations = request.requested_observations.len(),
        "stepping"
    );

    let response = connection
        .send(request)
        .map_err(|err| connection_error("step failed", err))?;
    let observations = observation_specs
        .unpack(&response.observations)
        .map_err(|err| {
            CliError::new(DATA_INVALID, format!("server sent invalid observations: {err}"))
        })?
        .into_iter()
        .collect();

    Ok(Stepped {
        response,
        observations,
    })
}

/// Pack named actions against the action specs and resolve the requested
/// observation names; no names means every advertised observation.
fn step_request(
    action_specs: &SpecManager,
    observation_specs: &SpecManager,
    actions: &[(String, TensorValue)],
    observe: &[String],
) -> CliResult<StepRequest> {
    let packed = action_specs
        .pack(actions.iter().map(|(name, value)| (name, value)))
        .map_err(|err| tensor_error("invalid action", err))?;

    let requested_observations = if observe.is_empty() {
        observation_specs.uids().collect()
    } else {
        observe
            .iter()
            .map(|name| observation_specs.name_to_uid(name))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| tensor_error("invalid observation", err))?
    };

    Ok(StepRequest {
        actions: packed,
        requested_observations,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use envrpc_proto::{DataType, Payload};
    use envrpc_tensor::tensor_spec;

    use super::*;
    use crate::exit::USAGE;

    fn managers() -> (SpecManager, SpecManager) {
        let paddle = tensor_spec("paddle", DataType::Int32, vec![2]).expect("spec should be valid");
        let score = tensor_spec("score", DataType::Int64, Vec::new()).expect("spec should be valid");
        let frame =
            tensor_spec("frame", DataType::Uint8, vec![-1, 3]).expect("spec should be valid");
        let specs = ActionObservationSpecs {
            actions: HashMap::from([(1, paddle)]),
            observations: HashMap::from([(10, score), (11, frame)]),
        };
        spec_managers(&specs).expect("specs should be valid")
    }

    #[test]
    fn actions_are_cast_to_spec_dtype() {
        let (actions, observations) = managers();
        let values = vec![("paddle".to_string(), TensorValue::from(vec![3i64, -4]))];

        let request =
            step_request(&actions, &observations, &values, &[]).expect("request should build");

        let tensor = &request.actions[&1];
        assert_eq!(tensor.shape, vec![2]);
        assert!(matches!(
            &tensor.payload,
            Some(Payload::Int32s(array)) if array.array == vec![3, -4]
        ));
        assert_eq!(request.requested_observations, vec![10, 11]);
    }

    #[test]
    fn named_observations_resolve_to_uids() {
        let (actions, observations) = managers();
        let request = step_request(&actions, &observations, &[], &["frame".to_string()])
            .expect("request should build");
        assert_eq!(request.requested_observations, vec![11]);
        assert!(request.actions.is_empty());
    }

    #[test]
    fn unknown_names_are_usage_errors() {
        let (actions, observations) = managers();
        let values = vec![("throttle".to_string(), TensorValue::from(1i64))];
        let err = step_request(&actions, &observations, &values, &[])
            .expect_err("unknown action should fail");
        assert_eq!(err.code, USAGE);

        let err = step_request(&actions, &observations, &[], &["lives".to_string()])
            .expect_err("unknown observation should fail");
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn mis_shaped_action_is_data_invalid() {
        let (actions, observations) = managers();
        let values = vec![("paddle".to_string(), TensorValue::from(vec![1i64, 2, 3]))];
        let err = step_request(&actions, &observations, &values, &[])
            .expect_err("wrong shape should fail");
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.contains("paddle"));
    }
}
