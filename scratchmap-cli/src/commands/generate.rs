//! Generate command - one scratch map from a country list.

use std::path::PathBuf;

use crate::endpoint::{ConsoleEndpoint, Delivery};
use crate::error::CliError;
use crate::runner::{CliRunner, RunnerOptions};

/// Recipient name used for requests typed on the command line.
pub const CONSOLE_RECIPIENT: &str = "console";

/// Run the generate command.
///
/// Goes through the same request path as `serve`, so the country list is
/// validated and answered exactly as a message would be.
pub async fn run(options: RunnerOptions, countries: &str, output: PathBuf) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("generate");

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|error| CliError::Deliver {
                path: parent.to_path_buf(),
                error,
            })?;
    }

    let handler = runner
        .create_handler(ConsoleEndpoint::new(Delivery::File(output)))
        .await?;
    handler.handle_message(CONSOLE_RECIPIENT, countries).await?;

    if handler.endpoint().delivered() == 0 {
        return Err(CliError::NotGenerated);
    }
    Ok(())
}
