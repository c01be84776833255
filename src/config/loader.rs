//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::ClusterConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values that take precedence over the config file.
///
/// Filled from CLI flags and their environment fallbacks (`PORT`, `WORKERS`).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_port: Option<u16>,
    pub workers: Option<usize>,
}

impl Overrides {
    fn apply(&self, config: &mut ClusterConfig) {
        if let Some(port) = self.base_port {
            config.listener.base_port = port;
        }
        if let Some(workers) = self.workers {
            config.workers.count = Some(workers);
        }
    }
}

/// Load, override and validate the cluster configuration.
///
/// Without a path the built-in defaults are used as the base.
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<ClusterConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&content)?
        }
        None => ClusterConfig::default(),
    };

    overrides.apply(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
