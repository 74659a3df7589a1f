use quartz_frame::Command as RouterCommand;

use crate::cmd::session::{execute, QUERY_WAIT};
use crate::cmd::{DestinationArgs, RouterArgs};
use crate::exit::CliResult;
use crate::output::OutputFormat;

pub fn run_lock(args: DestinationArgs, router: &RouterArgs, format: OutputFormat) -> CliResult<i32> {
    execute(
        router,
        RouterCommand::LockDestination(args.destination),
        None,
        format,
    )
}

pub fn run_unlock(
    args: DestinationArgs,
    router: &RouterArgs,
    format: OutputFormat,
) -> CliResult<i32> {
    execute(
        router,
        RouterCommand::UnlockDestination(args.destination),
        None,
        format,
    )
}

pub fn run_status(
    args: DestinationArgs,
    router: &RouterArgs,
    format: OutputFormat,
) -> CliResult<i32> {
    execute(
        router,
        RouterCommand::QueryDestinationLock(args.destination),
        Some(QUERY_WAIT),
        format,
    )
}
