use anyhow::{Context, Result};
use enforcer::EnforcerStrategy;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Looked up in the working directory when no file is given explicitly.
pub const DEFAULT_CONFIG_FILE: &str = "twinguard.yaml";

/// Overrides the configured enforcer strategy.
pub const STRATEGY_ENV: &str = "TWINGUARD_STRATEGY";

/// Effective CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub strategy: EnforcerStrategy,
    /// Used by commands invoked without `--permission`.
    pub default_permissions: Vec<String>,
    pub logging: LoggingSettings,
    /// The file these settings were read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Daily rolling log files are written here when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            strategy: EnforcerStrategy::default(),
            default_permissions: vec![enforcer::READ.to_string()],
            logging: LoggingSettings::default(),
            source: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            directory: None,
        }
    }
}

impl Settings {
    /// Loads settings from `explicit`, else from `./twinguard.yaml` if present,
    /// else defaults, then applies environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let base = env::current_dir().context("Failed to get current directory")?;
        Self::load_with_base(explicit, &base)
    }

    /// Like [`Settings::load`] with the default file looked up in `base_dir`.
    pub fn load_with_base(explicit: Option<&Path>, base_dir: &Path) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let default = base_dir.join(DEFAULT_CONFIG_FILE);
                default.exists().then_some(default)
            }
        };

        let mut settings = match &path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Ok(strategy) = env::var(STRATEGY_ENV) {
            settings.strategy = strategy
                .parse()
                .with_context(|| format!("Invalid {} value", STRATEGY_ENV))?;
        }
        Ok(settings)
    }

    /// Reads a settings file. A relative log directory is resolved against
    /// the file's own directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        let mut settings: Settings = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse configuration file {}", path.display()))?;

        if let (Some(directory), Some(parent)) = (&settings.logging.directory, path.parent()) {
            if directory.is_relative() {
                settings.logging.directory = Some(parent.join(directory));
            }
        }
        settings.source = Some(path.to_path_buf());
        Ok(settings)
    }
}
