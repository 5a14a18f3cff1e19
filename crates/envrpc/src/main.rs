mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "envrpc", version, about = "Environment RPC client")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(cli.command, format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_step_subcommand() {
        let cli = Cli::try_parse_from([
            "envrpc",
            "step",
            "unix:/tmp/env.sock",
            "--world",
            "foo",
            "--action",
            "paddle=[1, 2]",
            "--action",
            "fire=true",
            "--observe",
            "score",
        ])
        .expect("step args should parse");

        let Command::Step(args) = cli.command else {
            panic!("expected step command");
        };
        assert_eq!(args.world, "foo");
        assert_eq!(args.actions.len(), 2);
        assert_eq!(args.observe, vec!["score".to_string()]);
        assert_eq!(args.connect.timeout, "5s");
    }

    #[test]
    fn step_requires_world() {
        let err = Cli::try_parse_from(["envrpc", "step", "/tmp/env.sock"])
            .expect_err("missing --world should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_create_with_settings_and_global_format() {
        let cli = Cli::try_parse_from([
            "envrpc",
            "create",
            "127.0.0.1:9000",
            "--setting",
            "seed=7",
            "--format",
            "json",
            "--timeout",
            "250ms",
        ])
        .expect("create args should parse");

        assert!(matches!(cli.format, Some(OutputFormat::Json)));
        let Command::Create(args) = cli.command else {
            panic!("expected create command");
        };
        assert_eq!(args.settings, vec!["seed=7".to_string()]);
        assert_eq!(args.connect.timeout, "250ms");
    }

    #[test]
    fn parses_version_subcommand() {
        let cli = Cli::try_parse_from(["envrpc", "version", "--extended"])
            .expect("version args should parse");
        assert!(matches!(cli.command, Command::Version(args) if args.extended));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let err = Cli::try_parse_from(["envrpc", "--log-level", "loud", "version"])
            .expect_err("unknown log level should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
