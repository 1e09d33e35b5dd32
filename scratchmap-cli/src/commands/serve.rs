//! Serve command - handle messages read from stdin.
//!
//! Each line is `<recipient>: <text>`, or bare text sent by `console`.
//! Every message runs on its own task; generations still queue on the
//! request gate, so overlapping requests never mix their overlays.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, warn};

use scratchmap::handler::{HandlerError, HandlerOutcome};

use super::generate::CONSOLE_RECIPIENT;
use crate::endpoint::{ConsoleEndpoint, Delivery};
use crate::error::CliError;
use crate::runner::{CliRunner, RunnerOptions};

type TaskResult = Result<Result<HandlerOutcome, HandlerError>, JoinError>;

/// Run the serve command.
pub async fn run(options: RunnerOptions, deliver_dir: PathBuf) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("serve");

    tokio::fs::create_dir_all(&deliver_dir)
        .await
        .map_err(|error| CliError::Deliver {
            path: deliver_dir.clone(),
            error,
        })?;

    let handler = Arc::new(
        runner
            .create_handler(ConsoleEndpoint::new(Delivery::Directory(deliver_dir)))
            .await?,
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = JoinSet::new();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    eprintln!("Reading messages from stdin ('<recipient>: <text>'), Ctrl-C to stop");

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted, waiting for running requests");
                break;
            }
            Some(joined) = tasks.join_next() => {
                if outcome(joined) == HandlerOutcome::Shutdown {
                    error!("Stopping after failed generation");
                    tasks.abort_all();
                    return Err(CliError::Shutdown);
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.map_err(CliError::Input)? else {
                    info!("End of input, waiting for running requests");
                    break;
                };
                let Some((recipient, text)) = parse_line(&line) else {
                    continue;
                };
                let handler = Arc::clone(&handler);
                tasks.spawn(async move { handler.handle_message(&recipient, &text).await });
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        if outcome(joined) == HandlerOutcome::Shutdown {
            error!("Stopping after failed generation");
            tasks.abort_all();
            return Err(CliError::Shutdown);
        }
    }

    info!(delivered = handler.endpoint().delivered(), "Serve finished");
    Ok(())
}

/// Splits an input line into recipient and message text.
///
/// Returns `None` for blank lines.
fn parse_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match line.split_once(": ") {
        Some((recipient, text)) if is_recipient(recipient) => {
            Some((recipient.to_string(), text.to_string()))
        }
        _ => Some((CONSOLE_RECIPIENT.to_string(), line.to_string())),
    }
}

fn is_recipient(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('/') && !name.contains(char::is_whitespace)
}

/// Delivery failures and panics only end their own request.
fn outcome(joined: TaskResult) -> HandlerOutcome {
    match joined {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            warn!(error = %e, "Reply delivery failed");
            HandlerOutcome::Continue
        }
        Err(e) => {
            error!(error = %e, "Request task failed");
            HandlerOutcome::Continue
        }
    }
}
