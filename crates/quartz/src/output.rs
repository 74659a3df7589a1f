use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use quartz_frame::Response;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
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

#[derive(Serialize)]
struct ResponseOutput<'a> {
    #[serde(flatten)]
    response: &'a Response,
    timestamp: String,
}

/// Print a batch of responses. Table output puts them all in one table.
pub fn print_responses(responses: &[Response], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if responses.is_empty() {
                return;
            }
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "DETAILS", "RAW"]);
            for response in responses {
                table.add_row(vec![
                    response.kind().to_string(),
                    details(response),
                    raw_line(response).to_string(),
                ]);
            }
            println!("{table}");
        }
        _ => {
            for response in responses {
                print_response(response, format);
            }
        }
    }
}

pub fn print_response(response: &Response, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ResponseOutput {
                response,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => print_responses(std::slice::from_ref(response), format),
        OutputFormat::Pretty => {
            let details = details(response);
            if details.is_empty() {
                println!("{}", response.kind());
            } else {
                println!("{} {details}", response.kind());
            }
        }
        OutputFormat::Raw => {
            let mut out = std::io::stdout();
            let _ = writeln!(out, "{}", raw_line(response));
            let _ = out.flush();
        }
    }
}

/// Field summary for human-readable formats.
pub fn details(response: &Response) -> String {
    match response {
        Response::Acknowledge { .. } | Response::Error { .. } | Response::PowerOn { .. } => {
            String::new()
        }
        Response::Update {
            levels,
            destination,
            source,
            ..
        } => format!("levels={levels} destination={destination} source={source}"),
        Response::ReadDestination {
            destination, name, ..
        } => format!("destination={destination} name={name:?}"),
        Response::ReadSource { source, name, .. } => format!("source={source} name={name:?}"),
        Response::ReadLevel { level, name, .. } => format!("level={level} name={name:?}"),
        Response::LockStatus {
            destination,
            locked,
            ..
        } => format!("destination={destination} locked={locked}"),
    }
}

fn raw_line(response: &Response) -> &str {
    response.raw().trim_end_matches('\r')
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
