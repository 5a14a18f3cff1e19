use std::collections::HashMap;
use std::time::Duration;

use clap::{Args, Subcommand};
use envrpc_connection::{connect_with_config, ConnectConfig, Connection};
use envrpc_proto::Tensor;
use envrpc_tensor::TensorValue;
use envrpc_transport::Endpoint;

use crate::exit::{connection_error, tensor_error, transport_error, CliError, CliResult};
use crate::output::OutputFormat;

pub mod create;
pub mod destroy;
pub mod join;
pub mod step;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a world and print its name.
    Create(CreateArgs),
    /// Join a world and print its action and observation specs.
    Join(JoinArgs),
    /// Join a world, take one step, print the observations and leave.
    Step(StepArgs),
    /// Destroy a world.
    Destroy(DestroyArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Create(args) => create::run(args, format),
        Command::Join(args) => join::run(args, format),
        Command::Step(args) => step::run(args, format),
        Command::Destroy(args) => destroy::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Server endpoint: unix:<path>, a socket path, tcp://host:port or host:port.
    pub endpoint: String,
    /// How long to wait for the server to accept connections (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// World setting as NAME=JSON (repeatable).
    #[arg(long = "setting", value_name = "NAME=JSON")]
    pub settings: Vec<String>,
}

#[derive(Args, Debug)]
pub struct JoinArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// World to join.
    #[arg(long)]
    pub world: String,
    /// Join setting as NAME=JSON (repeatable).
    #[arg(long = "setting", value_name = "NAME=JSON")]
    pub settings: Vec<String>,
}

#[derive(Args, Debug)]
pub struct StepArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// World to step.
    #[arg(long)]
    pub world: String,
    /// Join setting as NAME=JSON (repeatable).
    #[arg(long = "setting", value_name = "NAME=JSON")]
    pub settings: Vec<String>,
    /// Action value as NAME=JSON (repeatable), NAME being an action spec name.
    #[arg(long = "action", value_name = "NAME=JSON")]
    pub actions: Vec<String>,
    /// Observation to request (repeatable). Default: every observation.
    #[arg(long, value_name = "NAME")]
    pub observe: Vec<String>,
}

#[derive(Args, Debug)]
pub struct DestroyArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// World to destroy.
    #[arg(long)]
    pub world: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse the endpoint and timeout, then connect, waiting for the server to
/// come up.
pub fn open_connection(args: &ConnectArgs) -> CliResult<Connection> {
    let endpoint: Endpoint = args
        .endpoint
        .parse()
        .map_err(|err| transport_error("invalid endpoint", err))?;
    let config = ConnectConfig {
        ready_timeout: Some(parse_timeout(&args.timeout)?),
        ..ConnectConfig::default()
    };
    connect_with_config(&endpoint, &config).map_err(|err| connection_error("connect failed", err))
}

pub fn parse_timeout(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("timeout must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid timeout value: {input}")))?;
    if value == 0 {
        return Err(CliError::usage("timeout must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

/// Parse repeated `NAME=JSON` arguments into named tensor values.
///
/// Names must be unique; values go through JSON dtype inference.
pub fn parse_assignments(flag: &str, raw: &[String]) -> CliResult<Vec<(String, TensorValue)>> {
    let mut parsed: Vec<(String, TensorValue)> = Vec::with_capacity(raw.len());
    for item in raw {
        let Some((name, literal)) = item.split_once('=') else {
            return Err(CliError::usage(format!(
                "--{flag} expects NAME=JSON, got {item:?}"
            )));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(CliError::usage(format!("--{flag} name must not be empty")));
        }
        if parsed.iter().any(|(existing, _)| existing == name) {
            return Err(CliError::usage(format!("--{flag} {name:?} given more than once")));
        }
        let json: serde_json::Value = serde_json::from_str(literal).map_err(|err| {
            CliError::usage(format!("--{flag} {name:?} is not valid JSON: {err}"))
        })?;
        let value = TensorValue::from_json(&json)
            .map_err(|err| tensor_error(&format!("--{flag} {name:?}"), err))?;
        parsed.push((name.to_string(), value));
    }
    Ok(parsed)
}

/// Settings travel keyed by name without a spec, so each keeps the dtype
/// inferred from its JSON literal.
pub fn settings_tensors(raw: &[String]) -> CliResult<HashMap<String, Tensor>> {
    parse_assignments("setting", raw)?
        .into_iter()
        .map(|(name, value)| {
            let tensor = envrpc_tensor::pack(&value, None, false)
                .map_err(|err| tensor_error(&format!("setting {name:?}"), err))?;
            Ok((name, tensor))
        })
        .collect()
}
