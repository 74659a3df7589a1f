use quartz_frame::Command as RouterCommand;

use crate::cmd::session::{execute, QUERY_WAIT};
use crate::cmd::{RouterArgs, SalvoAction, SalvoArgs};
use crate::exit::CliResult;
use crate::output::OutputFormat;

pub fn run(args: SalvoArgs, router: &RouterArgs, format: OutputFormat) -> CliResult<i32> {
    let wait = match args.action {
        SalvoAction::Count { .. } => Some(QUERY_WAIT),
        _ => None,
    };
    execute(router, to_command(args.action), wait, format)
}

fn to_command(action: SalvoAction) -> RouterCommand {
    match action {
        SalvoAction::FireSystem { id } => RouterCommand::FireSystemSalvo(id),
        SalvoAction::Select { id } => RouterCommand::SalvoSelect(id),
        SalvoAction::Empty { id } => RouterCommand::SalvoEmpty(id),
        SalvoAction::Add {
            levels,
            destination,
            source,
        } => RouterCommand::SalvoAddCrosspoint {
            levels,
            destination,
            source,
        },
        SalvoAction::Fire { id, at: None } => RouterCommand::SalvoFireNow(id),
        SalvoAction::Fire { id, at: Some(time) } => RouterCommand::SalvoFireAt { salvo: id, time },
        SalvoAction::Delete { id } => RouterCommand::SalvoDelete(id),
        SalvoAction::Count { id } => RouterCommand::SalvoListCount(id),
    }
}

#[cfg(test)]
mod tests {
    use quartz_frame::{LevelSet, Timecode};

    use super::*;

    #[test]
    fn fire_with_and_without_time() {
        assert_eq!(
            to_command(SalvoAction::Fire { id: 3, at: None }).to_wire(),
            ".QF3\r"
        );
        let timed = to_command(SalvoAction::Fire {
            id: 3,
            at: Some(Timecode::new(23, 59, 59, 29)),
        });
        assert_eq!(timed.to_wire(), ".QF3T1:23:59:59:29\r");
    }

    #[test]
    fn add_uses_canonical_levels() {
        let command = to_command(SalvoAction::Add {
            levels: LevelSet::from("BV"),
            destination: 10,
            source: 20,
        });
        assert_eq!(command.to_wire(), ".QSVB10,20\r");
    }
}
