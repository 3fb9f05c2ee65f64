//! Pipeline configuration file.
//!
//! A pipeline TOML names the boundary file, the facility sources, an
//! optional lon/lat filter, clustering parameters and the output
//! directory. The Busan configuration is embedded at compile time via
//! [`include_str!`] and used when no `--config` is given.

use std::path::{Path, PathBuf};

use pet_map_analytics_models::ClusteringConfig;
use pet_map_geography_models::{BoundarySource, BoundingBox};
use pet_map_ingest_models::SourceDefinition;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../configs/busan.toml");

/// Errors raised while reading a pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config {}: {source}", .path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The TOML is malformed or does not match the expected shape.
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration names no facility sources.
    #[error("Config lists no [[sources]]")]
    NoSources,
}

/// Everything a pipeline run needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory reports are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// District boundary file.
    pub boundaries: BoundarySource,
    /// Points outside this box are skipped during ingestion.
    #[serde(default)]
    pub bounds: Option<BoundingBox>,
    /// Facility input files, read in order.
    pub sources: Vec<SourceDefinition>,
    /// Clustering parameters.
    #[serde(default)]
    pub clustering: ClusteringConfig,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

/// Parses a pipeline configuration from TOML text.
///
/// # Errors
///
/// Returns [`ConfigError`] if the TOML is invalid or lists no sources.
pub fn parse_config(toml_str: &str) -> Result<PipelineConfig, ConfigError> {
    let config: PipelineConfig = toml::from_str(toml_str)?;
    if config.sources.is_empty() {
        return Err(ConfigError::NoSources);
    }
    Ok(config)
}

/// Loads the configuration at `path`, or the embedded default when `None`.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig, ConfigError> {
    let Some(path) = path else {
        log::debug!("Using embedded default config");
        return parse_config(DEFAULT_CONFIG);
    };

    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Loaded config from {}", path.display());
    parse_config(&text)
}
