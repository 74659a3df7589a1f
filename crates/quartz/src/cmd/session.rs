use std::time::{Duration, Instant};

use quartz_client::{ClientConfig, ClientError, QuartzClient};
use quartz_frame::{Command, Response};
use tracing::info;

use crate::cmd::RouterArgs;
use crate::exit::{client_error, command_error, CliResult, SUCCESS};
use crate::output::{print_responses, OutputFormat};

/// How long queries wait for answers when `--wait` is not given.
pub const QUERY_WAIT: Duration = Duration::from_secs(1);

/// Connect, send one command, optionally collect responses, disconnect.
///
/// `default_wait` applies when `--wait` is absent; `None` returns as soon as
/// the command is written.
pub fn execute(
    router: &RouterArgs,
    command: Command,
    default_wait: Option<Duration>,
    format: OutputFormat,
) -> CliResult<i32> {
    let config = router.client_config()?;
    // Rejected commands never open a connection.
    command
        .validate(config.mode)
        .map_err(|err| command_error("invalid command", err))?;

    let mut client = open(config)?;
    client
        .send(&command)
        .map_err(|err| client_error("send failed", err))?;
    info!(command = command.name(), "command sent");

    let responses = match router.wait.or(default_wait) {
        Some(window) => collect(&mut client, window)?,
        None => Vec::new(),
    };

    client
        .disconnect()
        .map_err(|err| client_error("disconnect failed", err))?;
    print_responses(&responses, format);
    Ok(SUCCESS)
}

pub fn open(config: ClientConfig) -> CliResult<QuartzClient> {
    let mut client = QuartzClient::with_config(config);
    client
        .connect()
        .map_err(|err| client_error("connect failed", err))?;
    Ok(client)
}

/// Everything received within `window`, in arrival order.
///
/// Stops early if the router closes the connection.
pub fn collect(client: &mut QuartzClient, window: Duration) -> CliResult<Vec<Response>> {
    let deadline = Instant::now() + window;
    let mut responses = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(responses);
        }
        match client.recv_timeout(remaining) {
            Ok(response) => responses.push(response),
            Err(ClientError::Timeout(_) | ClientError::Disconnected) => return Ok(responses),
            Err(err) => return Err(client_error("receive failed", err)),
        }
    }
}
