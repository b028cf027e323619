//! Workspace config files: config/config.toml, then config/{CACHEKIT_ENV}.toml

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::Path;

const ENV_VAR: &str = "CACHEKIT_ENV";
const DEFAULT_ENV: &str = "development";

/// Layer the base workspace file and the environment-specific file, when present.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let config_dir = workspace_root.join("config");
    let env_name = std::env::var(ENV_VAR).unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let layered = [
        config_dir.join("config.toml"),
        config_dir.join(format!("{}.toml", env_name)),
    ];
    Ok(layered
        .into_iter()
        .filter(|path| path.is_file())
        .fold(builder, |builder, path| {
            builder.add_source(File::from(path).required(false))
        }))
}
