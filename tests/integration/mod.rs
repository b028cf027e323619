//! Integration tests for the cachekit generation engine

mod batch_selection;
mod cli_commands;
mod config_integration;
mod generation_idempotence;
mod lifecycle_cleanup;
