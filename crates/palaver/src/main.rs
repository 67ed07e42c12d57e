//! A terminal chat client built on the `palaver` library.

#[macro_use]
extern crate tracing;

use std::env;
use std::time::Duration;

use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use palaver::core::transcript::{Sender, Turn};
use palaver::core::{
    ClientConfig, ClientConfigBuilder, ErrorKind, ReconnectPolicy, Update,
};
use palaver::{SessionBuilder, markup};
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::interval;

const BAR_CHAR: &str = "▎";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_RESPONSE_TIMEOUT_SECS: u64 = 60;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = match config_from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };

    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    let session = SessionBuilder::with_config(config)
        .with_connect_timeout(CONNECT_TIMEOUT)
        .on_update(move |update| {
            update_tx.send(update.clone()).ok();
        })
        .build();
    println!(
        "{}",
        format!("Talking to {}", session.controller().endpoint()).dimmed()
    );

    let (line_tx, mut line_rx) = mpsc::unbounded_channel();
    tokio::spawn(read_lines(line_tx));

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let mut spinner: Option<ProgressBar> = None;
    let mut ticker = interval(Duration::from_millis(100));

    loop {
        select! {
            update = update_rx.recv() => {
                let Some(update) = update else {
                    break;
                };
                match update {
                    Update::TurnAppended { turn, .. } => {
                        print_turn(spinner.as_ref(), &turn);
                    }
                    Update::PendingChanged(true) => {
                        let progress_bar = ProgressBar::new_spinner();
                        progress_bar.set_style(progress_style.clone());
                        progress_bar
                            .set_message("Waiting for the assistant...");
                        spinner = Some(progress_bar);
                    }
                    Update::PendingChanged(false) => {
                        if let Some(progress_bar) = spinner.take() {
                            progress_bar.finish_and_clear();
                        }
                    }
                    Update::StatusChanged(status) => {
                        debug!(%status, "connection status changed");
                    }
                    Update::ScrollTo(_) | Update::DraftCleared => {}
                }
            }
            line = line_rx.recv() => {
                let Some(line) = line else {
                    break;
                };
                let result = match Input::parse(&line) {
                    Input::Quit => break,
                    Input::Status => {
                        let status = session.status().await;
                        println!("{}", format!("Status: {status}").dimmed());
                        continue;
                    }
                    Input::Retry => session.retry().await,
                    Input::Message(text) => session.send_message(text).await,
                };
                match result {
                    Ok(()) => {}
                    Err(err) if err.kind() == ErrorKind::EmptySubmission => {}
                    // Already narrated in the transcript.
                    Err(err) => debug!("message not sent: {err}"),
                }
            }
            _ = ticker.tick(), if spinner.is_some() => {
                if let Some(progress_bar) = &spinner {
                    progress_bar.inc(1);
                }
            }
        }
    }

    if let Some(progress_bar) = spinner.take() {
        progress_bar.finish_and_clear();
    }
    session.shutdown().await;
}

/// A line typed by the user.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    Status,
    /// Resend the text that was last rejected.
    Retry,
    Message(&'a str),
}

impl<'a> Input<'a> {
    fn parse(line: &'a str) -> Self {
        match line.trim() {
            "/quit" => Self::Quit,
            "/status" => Self::Status,
            "/retry" => Self::Retry,
            // Messages go out exactly as typed.
            _ => Self::Message(line),
        }
    }
}

fn config_from_env() -> Result<ClientConfig, String> {
    let mut builder = ClientConfigBuilder::new();
    if let Ok(host) = env::var("PALAVER_HOST") {
        builder = builder.with_host(host);
    }
    if let Ok(secure) = env::var("PALAVER_SECURE") {
        builder = builder.with_secure(parse_flag("PALAVER_SECURE", &secure)?);
    }

    let timeout_secs = match env::var("PALAVER_RESPONSE_TIMEOUT_SECS") {
        Ok(secs) => secs.trim().parse::<u64>().map_err(|_| {
            format!("PALAVER_RESPONSE_TIMEOUT_SECS is not a number: {secs}")
        })?,
        Err(_) => DEFAULT_RESPONSE_TIMEOUT_SECS,
    };
    // Zero turns the deadline off.
    if timeout_secs > 0 {
        builder =
            builder.with_response_timeout(Duration::from_secs(timeout_secs));
    }

    if let Ok(reconnect) = env::var("PALAVER_RECONNECT") {
        if parse_flag("PALAVER_RECONNECT", &reconnect)? {
            builder = builder.with_reconnect(ReconnectPolicy::default());
        }
    }
    Ok(builder.build())
}

fn parse_flag(name: &str, value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(format!("{name} must be a boolean, got: {value}")),
    }
}

fn print_turn(spinner: Option<&ProgressBar>, turn: &Turn) {
    let time = turn.timestamp().with_timezone(&Local).format("%H:%M");
    let line = match turn.sender() {
        // The terminal already shows what the user typed.
        Sender::User => return,
        Sender::Assistant => format!(
            "{}{} {}",
            BAR_CHAR.bright_cyan(),
            time.dimmed(),
            markup::render(turn.text())
        ),
        Sender::System => format!(
            "{}{} {}",
            BAR_CHAR.bright_yellow(),
            time.dimmed(),
            turn.text().italic()
        ),
    };

    match spinner {
        Some(spinner) => spinner.suspend(|| println!("{line}")),
        None => println!("{line}"),
    }
}

async fn read_lines(line_tx: mpsc::UnboundedSender<String>) {
    let mut lines = io::BufReader::new(io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line_tx.send(line).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(err) => {
                error!("error reading input: {}", err);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(Input::parse("/quit"), Input::Quit);
        assert_eq!(Input::parse("  /status "), Input::Status);
        assert_eq!(Input::parse("/retry"), Input::Retry);
        assert_eq!(
            Input::parse("  indented\t"),
            Input::Message("  indented\t")
        );
        assert_eq!(Input::parse("/quit now"), Input::Message("/quit now"));
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("X", "1"), Ok(true));
        assert_eq!(parse_flag("X", " Yes "), Ok(true));
        assert_eq!(parse_flag("X", "off"), Ok(false));
        assert!(parse_flag("X", "maybe").is_err());
    }
}
