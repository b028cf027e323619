//! CLI command-name contract for logging and routing.

use crate::cli::parse::Commands;

/// Command name string for log fields (e.g. "generate", "list").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Generate { .. } => "generate",
        Commands::List { .. } => "list",
        Commands::Url { .. } => "url",
        Commands::Clear { .. } => "clear",
    }
}
