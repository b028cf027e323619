//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::artifact::SourceRecord;
use crate::batch::{BatchEvent, BatchRunner};
use crate::config::{CacheKitConfig, ConfigLoader};
use crate::error::ApiError;
use crate::lifecycle::{ArtifactLifecycleBinding, RecordType};
use crate::registry::{DirectoryCatalog, SpecRegistry};
use crate::storage::{ArtifactStore, FileSystemStorage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::cli::command_name;
use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{
    format_accessed_artifact, format_batch_event, format_batch_report_json,
    format_batch_summary, format_deletion_report, format_spec_list_json, format_spec_list_text,
    SpecListEntry,
};

/// Record type name the CLI binds configured specs to
pub const SOURCE_RECORD_TYPE: &str = "source";

/// Extensions the source directory catalog accepts
const SOURCE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Rendered command result with the process exit code it implies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub exit_code: i32,
}

impl CommandOutput {
    fn ok(text: String) -> Self {
        Self { text, exit_code: 0 }
    }
}

/// Runtime context for CLI execution: workspace, config, and the engine's services.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workspace_root: PathBuf,
    config: CacheKitConfig,
    storage: Arc<FileSystemStorage>,
    registry: Arc<SpecRegistry>,
    runner: BatchRunner,
    binding: ArtifactLifecycleBinding,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Self::from_config(workspace_root, config)
    }

    /// Create run context from an already loaded configuration.
    pub fn from_config(workspace_root: PathBuf, config: CacheKitConfig) -> Result<Self, ApiError> {
        config.ensure_valid()?;

        let storage = config.storage.open(&workspace_root)?;
        let factory = config.storage.factory(Arc::clone(&storage));
        let catalog = Arc::new(
            DirectoryCatalog::new(storage.root(), config.storage.source_dir.clone())
                .exclude(config.storage.cache_dir.clone())
                .with_extensions(SOURCE_EXTENSIONS),
        );

        let mut builder = SpecRegistry::builder();
        for (id, spec) in &config.specs {
            builder.register(spec.to_descriptor(id)?)?;
        }
        builder.register_catalog_for_all(catalog);
        let registry = Arc::new(builder.build(factory.clone()));

        let orchestrator = Arc::new(config.orchestrator(&workspace_root)?);
        let runner = BatchRunner::new(Arc::clone(&registry), Arc::clone(&orchestrator));

        let record_type = registry
            .ids()
            .fold(RecordType::new(SOURCE_RECORD_TYPE), |record_type, id| {
                record_type.with_spec(id, id)
            });
        let binding = ArtifactLifecycleBinding::new(
            record_type,
            Arc::clone(&registry),
            factory,
            orchestrator,
            config.lifecycle.policy(),
        )?;

        debug!(
            workspace = %workspace_root.display(),
            generators = registry.len(),
            "Run context initialized"
        );

        Ok(Self {
            workspace_root,
            config,
            storage,
            registry,
            runner,
            binding,
        })
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn config(&self) -> &CacheKitConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<SpecRegistry> {
        &self.registry
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<CommandOutput, ApiError> {
        let started = Instant::now();
        let result = match command {
            Commands::Generate { patterns, format } => self.handle_generate(patterns, *format),
            Commands::List { patterns, format } => self.handle_list(patterns, *format),
            Commands::Url {
                accessor,
                source,
                format,
            } => self.handle_url(accessor, source, *format),
            Commands::Clear { source } => Ok(self.handle_clear(source)),
        };
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn handle_generate(&self, patterns: &[String], format: OutputFormat) -> Result<CommandOutput, ApiError> {
        if format == OutputFormat::Json {
            let report = self.runner.run(patterns)?;
            return Ok(CommandOutput {
                text: format_batch_report_json(&report)?,
                exit_code: report.exit_code(),
            });
        }

        let mut lines = Vec::new();
        let report = self
            .runner
            .run_with_progress(patterns, |event: &BatchEvent<'_>| {
                lines.push(format_batch_event(event))
            })?;
        lines.push(format_batch_summary(&report.summary));
        Ok(CommandOutput {
            text: lines.join("\n"),
            exit_code: report.exit_code(),
        })
    }

    fn handle_list(&self, patterns: &[String], format: OutputFormat) -> Result<CommandOutput, ApiError> {
        let entries: Vec<SpecListEntry> = self
            .runner
            .select_ids(patterns)?
            .into_iter()
            .map(|id| SpecListEntry {
                pre_cache: self
                    .registry
                    .descriptor(&id)
                    .map(|d| d.pre_cache())
                    .unwrap_or(false),
                id,
            })
            .collect();

        let text = if format == OutputFormat::Json {
            format_spec_list_json(&entries)?
        } else {
            format_spec_list_text(&entries)
        };
        Ok(CommandOutput::ok(text))
    }

    fn handle_url(&self, accessor: &str, source: &str, format: OutputFormat) -> Result<CommandOutput, ApiError> {
        if !self.storage.exists(source)? {
            return Err(ApiError::SourceNotFound(source.to_string()));
        }
        let record = SourceRecord::new(source, source);
        let accessed = self.binding.access(&record, accessor)?;
        let exit_code = match &accessed.outcome {
            Some(outcome) if outcome.is_generation_error() => 1,
            _ => 0,
        };
        Ok(CommandOutput {
            text: format_accessed_artifact(&accessed, format)?,
            exit_code,
        })
    }

    fn handle_clear(&self, source: &str) -> CommandOutput {
        let record = SourceRecord::new(source, source);
        let report = self.binding.clear_cache(&record);
        CommandOutput {
            text: format_deletion_report(source, &report),
            exit_code: if report.delete_errors.is_empty() { 0 } else { 1 },
        }
    }
}
