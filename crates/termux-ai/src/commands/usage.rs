use anyhow::Result;

use crate::cli::UsageCommands;
use crate::config::ConfigStore;
use crate::usage::{print_stats, UsageLog};

pub fn execute(config: &ConfigStore, action: UsageCommands) -> Result<()> {
    let log = UsageLog::in_dir(&config.dir());
    tracing::debug!(path = ?log.path(), "Usage log");
    match action {
        UsageCommands::Show => match log.stats()? {
            Some(stats) => print_stats(&stats),
            None => println!("No usage data found."),
        },
        UsageCommands::Clear => {
            if log.clear()? {
                println!("Usage statistics cleared.");
            } else {
                println!("No usage data to clear.");
            }
        }
    }
    Ok(())
}
