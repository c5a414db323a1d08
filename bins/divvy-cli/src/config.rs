//! CLI configuration.
//!
//! Layered from lowest to highest precedence: built-in defaults, an optional
//! TOML file, `DIVVY_*` environment variables, then command-line flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Name of the config file looked up inside the data directory.
pub const CONFIG_FILE_NAME: &str = "divvy.toml";

/// Name of the persisted collection state inside the data directory.
pub const STATE_FILE_NAME: &str = "collection.bin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Root directory for the persisted collection.
    pub data_dir: PathBuf,
    /// Log level filter string (e.g. "info", "divvy_dividend=debug").
    pub log_level: String,
    /// Log output format, "text" or "json".
    pub log_format: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("divvy");

        Self {
            data_dir,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

/// Values given on the command line. `None` leaves lower layers in effect.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
}

impl CliConfig {
    /// Build the layered configuration.
    ///
    /// An explicit `config_file` must exist. Otherwise `divvy.toml` inside the
    /// data directory is read if present.
    pub fn load(overrides: &Overrides) -> Result<Self> {
        Self::load_with_env(overrides, Environment::with_prefix("DIVVY"))
    }

    fn load_with_env(overrides: &Overrides, env: Environment) -> Result<Self> {
        let defaults = Self::default();
        let (file, required) = match &overrides.config_file {
            Some(path) => (path.clone(), true),
            None => (
                overrides
                    .data_dir
                    .as_deref()
                    .unwrap_or(&defaults.data_dir)
                    .join(CONFIG_FILE_NAME),
                false,
            ),
        };

        let mut builder = Config::builder()
            .set_default("data_dir", path_str(&defaults.data_dir))?
            .set_default("log_level", defaults.log_level)?
            .set_default("log_format", defaults.log_format)?
            .add_source(File::from(file.as_path()).format(FileFormat::Toml).required(required))
            .add_source(env);

        if let Some(data_dir) = &overrides.data_dir {
            builder = builder.set_override("data_dir", path_str(data_dir))?;
        }
        if let Some(level) = &overrides.log_level {
            builder = builder.set_override("log_level", level.as_str())?;
        }
        if let Some(format) = &overrides.log_format {
            builder = builder.set_override("log_format", format.as_str())?;
        }

        let cfg: Self = builder
            .build()
            .with_context(|| format!("failed to read configuration from {}", file.display()))?
            .try_deserialize()
            .context("invalid configuration")?;

        if cfg.log_format != "text" && cfg.log_format != "json" {
            anyhow::bail!("log_format must be \"text\" or \"json\", got {:?}", cfg.log_format);
        }
        Ok(cfg)
    }

    /// Path to the persisted collection state.
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(STATE_FILE_NAME)
    }
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
