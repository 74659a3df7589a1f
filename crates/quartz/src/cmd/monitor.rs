use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use quartz_client::ClientError;
use tracing::info;

use crate::cmd::session::open;
use crate::cmd::{MonitorArgs, RouterArgs};
use crate::exit::{client_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS};
use crate::output::{print_response, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub fn run(args: MonitorArgs, router: &RouterArgs, format: OutputFormat) -> CliResult<i32> {
    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut client = open(router.client_config()?)?;
    if args.ping {
        client
            .send_ping()
            .map_err(|err| client_error("ping failed", err))?;
    }

    let mut printed = 0usize;
    let code = loop {
        if !running.load(Ordering::SeqCst) {
            break SUCCESS;
        }

        let response = match client.recv_timeout(POLL_INTERVAL) {
            Ok(response) => response,
            Err(ClientError::Timeout(_)) => continue,
            Err(ClientError::Disconnected) => {
                eprintln!("error: router closed the connection");
                break FAILURE;
            }
            Err(err) => return Err(client_error("receive failed", err)),
        };

        print_response(&response, format);
        printed = printed.saturating_add(1);

        if args.count.is_some_and(|count| printed >= count) {
            break SUCCESS;
        }
    };

    let stats = client.stats();
    info!(
        printed,
        frames_received = stats.frames_received,
        frames_dropped = stats.frames_dropped,
        "monitor finished"
    );
    client
        .disconnect()
        .map_err(|err| client_error("disconnect failed", err))?;
    Ok(code)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
