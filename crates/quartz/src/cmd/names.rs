use quartz_frame::Command as RouterCommand;

use crate::cmd::session::{execute, QUERY_WAIT};
use crate::cmd::{parse_level, NameTarget, ReadNameArgs, RouterArgs, WriteNameArgs};
use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub fn run_read(args: ReadNameArgs, router: &RouterArgs, format: OutputFormat) -> CliResult<i32> {
    let command = read_command(&args)?;
    execute(router, command, Some(QUERY_WAIT), format)
}

pub fn run_write(args: WriteNameArgs, router: &RouterArgs, format: OutputFormat) -> CliResult<i32> {
    let command = write_command(&args)?;
    execute(router, command, None, format)
}

fn read_command(args: &ReadNameArgs) -> CliResult<RouterCommand> {
    Ok(match (args.target, args.button) {
        (NameTarget::Destination, false) => {
            RouterCommand::ReadDestinationName(number(&args.id)?)
        }
        (NameTarget::Destination, true) => {
            RouterCommand::ReadDestinationButtonName(number(&args.id)?)
        }
        (NameTarget::Source, false) => RouterCommand::ReadSourceName(number(&args.id)?),
        (NameTarget::Source, true) => RouterCommand::ReadSourceButtonName(number(&args.id)?),
        (NameTarget::Level, false) => RouterCommand::ReadLevelName(level(&args.id)?),
        (NameTarget::Level, true) => RouterCommand::ReadLevelButtonName(level(&args.id)?),
    })
}

fn write_command(args: &WriteNameArgs) -> CliResult<RouterCommand> {
    let name = args.name.clone();
    Ok(match (args.target, args.button) {
        (NameTarget::Destination, false) => RouterCommand::WriteDestinationName {
            destination: number(&args.id)?,
            name,
        },
        (NameTarget::Destination, true) => RouterCommand::WriteDestinationButtonName {
            destination: number(&args.id)?,
            name,
        },
        (NameTarget::Source, false) => RouterCommand::WriteSourceName {
            source: number(&args.id)?,
            name,
        },
        (NameTarget::Source, true) => RouterCommand::WriteSourceButtonName {
            source: number(&args.id)?,
            name,
        },
        (NameTarget::Level, false) => RouterCommand::WriteLevelName {
            level: level(&args.id)?,
            name,
        },
        (NameTarget::Level, true) => RouterCommand::WriteLevelButtonName {
            level: level(&args.id)?,
            name,
        },
    })
}

fn number(id: &str) -> CliResult<u32> {
    id.parse()
        .map_err(|_| CliError::new(USAGE, format!("expected a number, got {id:?}")))
}

fn level(id: &str) -> CliResult<quartz_frame::Level> {
    parse_level(id).map_err(|err| CliError::new(USAGE, err))
}
