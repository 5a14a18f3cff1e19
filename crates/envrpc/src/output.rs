use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    /// One JSON document per command.
    Json,
    Table,
    /// `key=value` lines.
    Pretty,
    /// The protobuf encoding of the server's response.
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Encode a response message and write it to stdout unframed.
pub fn print_message<M: prost::Message>(message: &M) {
    print_raw(&message.encode_to_vec());
}

/// Compact single-line rendering of a JSON value for table cells and
/// `key=value` output.
pub fn inline_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn inline_json_unquotes_strings() {
        assert_eq!(inline_json(&json!("foo")), "foo");
        assert_eq!(inline_json(&json!([[1, 2], [3, 4]])), "[[1,2],[3,4]]");
        assert_eq!(inline_json(&json!(null)), "null");
    }

    #[test]
    fn table_renders_header_and_rows() {
        let mut table = new_table(vec!["NAME", "VALUE"]);
        table.add_row(vec!["score".to_string(), "3".to_string()]);
        let rendered = table.to_string();
        assert!(rendered.contains("NAME"));
        assert!(rendered.contains("score"));
    }
}
