//! Countries command - list what can be highlighted.

use crate::error::CliError;
use crate::runner::{CliRunner, RunnerOptions};

pub fn run(options: RunnerOptions) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("countries");
    let registry = runner.load_registry()?;

    for (_, country) in registry.iter() {
        if country.aliases.is_empty() {
            println!("{} {}", country.emoji, country.name);
        } else {
            println!(
                "{} {} (also: {})",
                country.emoji,
                country.name,
                country.aliases.join(", ")
            );
        }
    }
    println!();
    println!("{} countries", registry.len());
    Ok(())
}
