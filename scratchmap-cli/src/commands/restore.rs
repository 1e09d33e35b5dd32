//! Restore-style command - put the backup style back in place.

use crate::error::CliError;
use crate::runner::{CliRunner, RunnerOptions};

pub async fn run(options: RunnerOptions) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("restore-style");
    let store = runner.style_store();

    store.restore_from_backup().await?;

    println!(
        "Restored {} from {}",
        store.path().display(),
        store.backup_path().display()
    );
    Ok(())
}
