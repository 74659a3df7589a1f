mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::{Command, RouterArgs};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "quartz", version, about = "Quartz router control CLI")]
struct Cli {
    #[command(flatten)]
    router: RouterArgs,

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
    let result = cmd::run(cli.command, &cli.router, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::cmd::SalvoAction;

    #[test]
    fn parses_route_subcommand() {
        let cli = Cli::try_parse_from([
            "quartz", "--host", "10.0.0.9", "--port", "4000", "route", "AV", "12", "3",
        ])
        .expect("route args should parse");

        assert_eq!(cli.router.host.as_deref(), Some("10.0.0.9"));
        assert_eq!(cli.router.port, Some(4000));
        match cli.command {
            Command::Route(args) => {
                assert_eq!(args.levels.to_string(), "VA");
                assert_eq!((args.destination, args.source), (12, 3));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "quartz",
            "lock",
            "5",
            "--host",
            "router",
            "--port",
            "23",
            "--restricted",
            "--wait",
            "500ms",
        ])
        .expect("global flags should parse after the subcommand");

        assert!(cli.router.restricted);
        assert_eq!(cli.router.wait, Some(Duration::from_millis(500)));
        assert!(matches!(cli.command, Command::Lock(_)));
    }

    #[test]
    fn parses_timed_salvo_fire() {
        let cli = Cli::try_parse_from(["quartz", "salvo", "fire", "7", "--at", "10:00:00:00"])
            .expect("salvo fire should parse");
        match cli.command {
            Command::Salvo(args) => {
                assert!(matches!(args.action, SalvoAction::Fire { id: 7, at: Some(_) }))
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_multi_character_level() {
        let err = Cli::try_parse_from(["quartz", "get-route", "AB", "1"])
            .expect_err("two characters is not a level");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_read_name_with_button_flag() {
        let cli = Cli::try_parse_from(["quartz", "read-name", "level", "V", "--button"])
            .expect("read-name should parse");
        assert!(matches!(cli.command, Command::ReadName(ref args) if args.button));
    }
}
