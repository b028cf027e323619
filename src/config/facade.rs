//! Config loading facade: single entry point for loading configuration.

use super::merge;
use super::sources;
use super::CacheKitConfig;
use config::ConfigError;
use std::path::{Path, PathBuf};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence, lowest to highest: built-in defaults, the global file, the
    /// workspace `config/config.toml`, `config/{CACHEKIT_ENV}.toml`, then
    /// `CACHEKIT__SECTION__KEY` environment variables.
    pub fn load(workspace_root: &Path) -> Result<CacheKitConfig, ConfigError> {
        let builder = merge::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = sources::environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Load configuration from one explicit file, still under defaults and
    /// environment overrides.
    pub fn load_from_file(path: &Path) -> Result<CacheKitConfig, ConfigError> {
        let builder = merge::builder_with_defaults()?
            .add_source(config::File::from(path.to_path_buf()).required(true));
        let builder = sources::environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Built-in defaults only
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> CacheKitConfig {
        CacheKitConfig::default()
    }

    pub fn global_config_path() -> Option<PathBuf> {
        sources::global_file::global_config_path()
    }
}
