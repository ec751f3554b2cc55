//! Logger configuration and construction

use crate::format::default_time_format;
use crate::level::LogMode;
use crate::logger::Logger;
use crate::reporter::{ConsoleReporter, FileReporter, FileReporterOptions, Reporter};
use crate::{Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Main logger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Initial verbosity mode
    pub mode: LogMode,

    /// Console output settings
    pub console: ConsoleConfig,

    /// Rotating file output settings
    pub file: FileConfig,
}

/// Console reporter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub enabled: bool,
}

/// File reporter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub enabled: bool,

    /// Directory for log files
    pub log_dir: PathBuf,

    /// Base file name used for every level and scope
    pub file_name: String,

    /// Maximum log file size before rotation (in MB)
    pub max_size_mb: f64,

    /// Number of numbered backups kept
    pub max_backups: u32,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            mode: LogMode::Info,
            console: ConsoleConfig::default(),
            file: FileConfig::default(),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_dir: PathBuf::from("./logs"),
            file_name: "app".to_string(),
            max_size_mb: 1.0,
            max_backups: 50,
        }
    }
}

impl LoggerConfig {
    /// Load configuration from file, falling back to defaults plus
    /// environment overrides when the file does not exist
    pub async fn load(config_path: Option<&Path>) -> Result<Self> {
        let config_file = match config_path {
            Some(path) => path.to_path_buf(),
            None => Self::default_config_path()?,
        };

        if config_file.exists() {
            let content = tokio::fs::read_to_string(&config_file).await?;
            let config: LoggerConfig = toml::from_str(&content).map_err(|e| Error::Config {
                message: format!("Failed to parse logger config: {}", e),
            })?;
            Ok(config)
        } else {
            let mut config = Self::default();
            config.load_env_overrides();
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self, config_path: Option<&Path>) -> Result<()> {
        let config_file = match config_path {
            Some(path) => path.to_path_buf(),
            None => Self::default_config_path()?,
        };

        if let Some(parent) = config_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| Error::Config {
            message: format!("Failed to serialize logger config: {}", e),
        })?;

        tokio::fs::write(&config_file, content).await?;
        Ok(())
    }

    /// Apply `SCOPELOG_*` environment variables; unparsable values are ignored
    pub fn load_env_overrides(&mut self) {
        if let Ok(mode) = std::env::var("SCOPELOG_MODE") {
            self.mode = mode.parse().unwrap_or(self.mode);
        }

        if let Ok(enabled) = std::env::var("SCOPELOG_CONSOLE") {
            self.console.enabled = enabled.parse().unwrap_or(self.console.enabled);
        }

        if let Ok(enabled) = std::env::var("SCOPELOG_FILE") {
            self.file.enabled = enabled.parse().unwrap_or(self.file.enabled);
        }

        if let Ok(dir) = std::env::var("SCOPELOG_LOG_DIR") {
            self.file.log_dir = PathBuf::from(dir);
        }

        if let Ok(size) = std::env::var("SCOPELOG_MAX_SIZE_MB") {
            self.file.max_size_mb = size.parse().unwrap_or(self.file.max_size_mb);
        }

        if let Ok(backups) = std::env::var("SCOPELOG_MAX_BACKUPS") {
            self.file.max_backups = backups.parse().unwrap_or(self.file.max_backups);
        }
    }

    /// Get default configuration file path
    pub fn default_config_path() -> Result<PathBuf> {
        let project_dirs =
            ProjectDirs::from("dev", "scopelog", "scopelog").ok_or_else(|| Error::Config {
                message: "Could not determine config directory".to_string(),
            })?;

        Ok(project_dirs.config_dir().join("scopelog.toml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.file.enabled {
            if !self.file.max_size_mb.is_finite() || self.file.max_size_mb <= 0.0 {
                return Err(Error::Config {
                    message: format!(
                        "max_size_mb must be a positive number, got {}",
                        self.file.max_size_mb
                    ),
                });
            }

            if self.file.file_name.trim().is_empty() {
                return Err(Error::Config {
                    message: "file_name must not be empty".to_string(),
                });
            }

            if self.file.file_name.contains(['/', '\\']) {
                return Err(Error::Config {
                    message: format!(
                        "file_name '{}' must not contain path separators",
                        self.file.file_name
                    ),
                });
            }
        }

        Ok(())
    }

    /// Build a logger with the configured console and file reporters
    pub fn build(&self) -> Result<Logger> {
        self.validate()?;

        let mut reporters: Vec<Arc<dyn Reporter>> = Vec::new();

        if self.console.enabled {
            reporters.push(Arc::new(ConsoleReporter::new(default_time_format())));
        }

        if self.file.enabled {
            let file_name = self.file.file_name.clone();
            let options = FileReporterOptions::default()
                .with_log_dir(&self.file.log_dir)
                .with_max_size_mb(self.file.max_size_mb)
                .with_max_backups(self.file.max_backups)
                .with_file_name(move |_, _| file_name.clone());
            reporters.push(Arc::new(FileReporter::new(options)?));
        }

        tracing::debug!(
            scopelog.event = "logger_built",
            mode = %self.mode,
            reporters = reporters.len(),
            "Logger built from configuration"
        );

        Ok(Logger::new(self.mode, reporters))
    }
}
