use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use quartz_client::ClientConfig;
use quartz_frame::{Level, LevelSet, Timecode, MAX_TIMECODE_FIELD};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod lock;
pub mod monitor;
pub mod names;
pub mod route;
pub mod salvo;
pub mod session;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Route a source to a destination on one or more levels.
    Route(RouteArgs),
    /// Ask which source feeds a destination on one level.
    GetRoute(GetRouteArgs),
    /// Lock a destination.
    Lock(DestinationArgs),
    /// Unlock a destination.
    Unlock(DestinationArgs),
    /// Query whether a destination is locked.
    LockStatus(DestinationArgs),
    /// Read a destination, source or level name.
    ReadName(ReadNameArgs),
    /// Write a destination, source or level name.
    WriteName(WriteNameArgs),
    /// Build, fire and manage salvos.
    Salvo(SalvoArgs),
    /// Send a keep-alive ping.
    Ping,
    /// Print everything the router sends.
    Monitor(MonitorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, router: &RouterArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Route(args) => route::run_route(args, router, format),
        Command::GetRoute(args) => route::run_get_route(args, router, format),
        Command::Lock(args) => lock::run_lock(args, router, format),
        Command::Unlock(args) => lock::run_unlock(args, router, format),
        Command::LockStatus(args) => lock::run_status(args, router, format),
        Command::ReadName(args) => names::run_read(args, router, format),
        Command::WriteName(args) => names::run_write(args, router, format),
        Command::Salvo(args) => salvo::run(args, router, format),
        Command::Ping => session::execute(
            router,
            quartz_frame::Command::Ping,
            Some(session::QUERY_WAIT),
            format,
        ),
        Command::Monitor(args) => monitor::run(args, router, format),
        Command::Version(args) => version::run(args),
    }
}

/// Router connection options shared by every subcommand.
#[derive(Args, Debug, Default)]
pub struct RouterArgs {
    /// Router host name or IP address.
    #[arg(long, env = "QUARTZ_HOST", global = true)]
    pub host: Option<String>,

    /// Router control port.
    #[arg(long, env = "QUARTZ_PORT", global = true)]
    pub port: Option<u16>,

    /// Treat the router as a restricted device (no naming or salvo commands).
    #[arg(long, global = true)]
    pub restricted: bool,

    /// Connection timeout (e.g. 5s, 500ms).
    #[arg(long, value_name = "DURATION", default_value = "5s", value_parser = parse_duration, global = true)]
    pub connect_timeout: Duration,

    /// Collect and print responses for this long after sending (e.g. 2s, 500ms).
    #[arg(long, value_name = "DURATION", value_parser = parse_duration, global = true)]
    pub wait: Option<Duration>,
}

impl RouterArgs {
    pub fn client_config(&self) -> CliResult<ClientConfig> {
        let host = self
            .host
            .as_deref()
            .ok_or_else(|| CliError::new(USAGE, "--host (or QUARTZ_HOST) is required"))?;
        let port = self
            .port
            .ok_or_else(|| CliError::new(USAGE, "--port (or QUARTZ_PORT) is required"))?;

        Ok(ClientConfig::new(host, port)
            .with_restricted(self.restricted)
            .with_connect_timeout(Some(self.connect_timeout))
            .with_write_timeout(Some(self.connect_timeout)))
    }
}

#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Levels to switch, e.g. V or VAB.
    #[arg(value_parser = parse_levels)]
    pub levels: LevelSet,
    /// Destination number.
    pub destination: u32,
    /// Source number.
    pub source: u32,
}

#[derive(Args, Debug)]
pub struct GetRouteArgs {
    /// Level to query.
    #[arg(value_parser = parse_level)]
    pub level: Level,
    /// Destination number.
    pub destination: u32,
}

#[derive(Args, Debug)]
pub struct DestinationArgs {
    /// Destination number.
    pub destination: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum NameTarget {
    Destination,
    Source,
    Level,
}

#[derive(Args, Debug)]
pub struct ReadNameArgs {
    /// What to read the name of.
    pub target: NameTarget,
    /// Destination or source number, or level character.
    pub id: String,
    /// Read the button name instead of the name.
    #[arg(long)]
    pub button: bool,
}

#[derive(Args, Debug)]
pub struct WriteNameArgs {
    /// What to name.
    pub target: NameTarget,
    /// Destination or source number, or level character.
    pub id: String,
    /// New name (8 characters, 10 for button names).
    pub name: String,
    /// Write the button name instead of the name.
    #[arg(long)]
    pub button: bool,
}

#[derive(Args, Debug)]
pub struct SalvoArgs {
    #[command(subcommand)]
    pub action: SalvoAction,
}

#[derive(Subcommand, Debug)]
pub enum SalvoAction {
    /// Fire a stored system salvo (id up to 999).
    FireSystem { id: u32 },
    /// Select the salvo to edit.
    Select { id: u32 },
    /// Remove every crosspoint from a salvo.
    Empty { id: u32 },
    /// Add a crosspoint to the selected salvo.
    Add {
        #[arg(value_parser = parse_levels)]
        levels: LevelSet,
        destination: u32,
        source: u32,
    },
    /// Fire a salvo now or at a timecode.
    Fire {
        id: u32,
        /// Fire time as HH:MM:SS:FF.
        #[arg(long, value_parser = parse_timecode)]
        at: Option<Timecode>,
    },
    /// Delete a salvo.
    Delete { id: u32 },
    /// Ask how many crosspoints a salvo holds.
    Count { id: u32 },
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Exit after printing N responses.
    #[arg(long)]
    pub count: Option<usize>,
    /// Send a ping first so the router has something to answer.
    #[arg(long)]
    pub ping: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

pub fn parse_level(input: &str) -> Result<Level, String> {
    let mut chars = input.chars();
    match (chars.next(), chars.next()) {
        (Some(code), None) => Ok(Level::new(code)),
        _ => Err(format!("a level is exactly one character, got {input:?}")),
    }
}

pub fn parse_levels(input: &str) -> Result<LevelSet, String> {
    if input.is_empty() {
        return Err("at least one level is required".to_string());
    }
    Ok(LevelSet::from(input))
}

pub fn parse_timecode(input: &str) -> Result<Timecode, String> {
    let fields: Vec<&str> = input.split(':').collect();
    let [hours, minutes, seconds, frames] = fields.as_slice() else {
        return Err(format!("expected HH:MM:SS:FF, got {input:?}"));
    };

    let field = |name: &str, text: &str| -> Result<u8, String> {
        match text.parse::<u8>() {
            Ok(value) if value <= MAX_TIMECODE_FIELD => Ok(value),
            _ => Err(format!("invalid {name} {text:?} in timecode")),
        }
    };

    Ok(Timecode::new(
        field("hours", *hours)?,
        field("minutes", *minutes)?,
        field("seconds", *seconds)?,
        field("frames", *frames)?,
    ))
}
