//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{
    format_accessed_artifact, format_batch_report_json, format_batch_report_text,
    format_deletion_report, format_spec_list_json, format_spec_list_text, SpecListEntry,
};
pub use route::{CommandOutput, RunContext};
