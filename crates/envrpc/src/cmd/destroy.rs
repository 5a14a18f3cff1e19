use envrpc_proto::DestroyWorldRequest;
use serde::Serialize;
use tracing::info;

use crate::cmd::{open_connection, DestroyArgs};
use crate::exit::{connection_error, CliResult, SUCCESS};
use crate::output::{new_table, print_json, print_message, OutputFormat};

#[derive(Serialize)]
struct DestroyOutput<'a> {
    world_name: &'a str,
    destroyed: bool,
}

pub fn run(args: DestroyArgs, format: OutputFormat) -> CliResult<i32> {
    let connection = open_connection(&args.connect)?;
    let response = connection
        .send(DestroyWorldRequest {
            world_name: args.world.clone(),
        })
        .map_err(|err| connection_error("destroy failed", err))?;
    info!(world = %args.world, "destroyed world");

    match format {
        OutputFormat::Json => print_json(&DestroyOutput {
            world_name: &args.world,
            destroyed: true,
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["WORLD", "DESTROYED"]);
            table.add_row(vec![args.world.clone(), "yes".to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("destroyed world={}", args.world),
        OutputFormat::Raw => print_message(&response),
    }

    Ok(SUCCESS)
}
