use quartz_frame::Command as RouterCommand;

use crate::cmd::session::{execute, QUERY_WAIT};
use crate::cmd::{GetRouteArgs, RouteArgs, RouterArgs};
use crate::exit::CliResult;
use crate::output::OutputFormat;

pub fn run_route(args: RouteArgs, router: &RouterArgs, format: OutputFormat) -> CliResult<i32> {
    let command = RouterCommand::SetCrosspoint {
        levels: args.levels,
        destination: args.destination,
        source: args.source,
    };
    execute(router, command, None, format)
}

pub fn run_get_route(
    args: GetRouteArgs,
    router: &RouterArgs,
    format: OutputFormat,
) -> CliResult<i32> {
    let command = RouterCommand::GetRoute {
        level: args.level,
        destination: args.destination,
    };
    execute(router, command, Some(QUERY_WAIT), format)
}
