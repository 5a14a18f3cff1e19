use envrpc_proto::CreateWorldRequest;
use serde::Serialize;
use tracing::info;

use crate::cmd::{open_connection, settings_tensors, CreateArgs};
use crate::exit::{connection_error, CliResult, SUCCESS};
use crate::output::{new_table, print_json, print_message, OutputFormat};

#[derive(Serialize)]
struct CreateOutput<'a> {
    world_name: &'a str,
    settings: usize,
}

pub fn run(args: CreateArgs, format: OutputFormat) -> CliResult<i32> {
    let settings = settings_tensors(&args.settings)?;
    let setting_count = settings.len();

    let connection = open_connection(&args.connect)?;
    let response = connection
        .send(CreateWorldRequest { settings })
        .map_err(|err| connection_error("create failed", err))?;
    info!(world = %response.world_name, "created world");

    match format {
        OutputFormat::Json => print_json(&CreateOutput {
            world_name: &response.world_name,
            settings: setting_count,
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["WORLD", "SETTINGS"]);
            table.add_row(vec![response.world_name.clone(), setting_count.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("world_name={}", response.world_name),
        OutputFormat::Raw => print_message(&response),
    }

    Ok(SUCCESS)
}
