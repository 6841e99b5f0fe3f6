//! TOML configuration: a config directory manager plus the application
//! config sections. CLI arguments take precedence over config values.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file or subdirectory
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    /// Ensure the config directory exists
    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Generate default configuration template as a string
    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub file_loading: FileLoadingConfig,
    pub display: DisplayConfig,
    pub chart: ChartConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileLoadingConfig {
    /// Format name ("json" or "csv") used when the extension is unhelpful
    pub format: Option<String>,
    /// Compression name ("gzip", "zstd", "bzip2", "xz")
    pub compression: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Table view shows at most this many records
    pub max_table_rows: usize,
    pub row_numbers: bool,
    pub row_start_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Chart kind used when --chart-kind is not given ("bar", "line", "pie")
    pub default_kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            file_loading: FileLoadingConfig::default(),
            display: DisplayConfig::default(),
            chart: ChartConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_table_rows: 100,
            row_numbers: false,
            row_start_index: 1,
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            default_kind: "bar".to_string(),
        }
    }
}

impl AppConfig {
    /// Load user configuration from the app's config directory, falling back
    /// to defaults when no config file exists.
    pub fn load(app_name: &str) -> Result<Self> {
        let manager = ConfigManager::new(app_name)?;
        Self::load_from(&manager)
    }

    /// Load configuration from a specific ConfigManager (used by tests).
    pub fn load_from(manager: &ConfigManager) -> Result<Self> {
        let config_path = manager.config_path("config.toml");

        if !config_path.exists() {
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }
}

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# viztab configuration
version = "0.1"

[file_loading]
# Force the file format instead of detecting it from the extension.
# format = "csv"
# Force the compression format ("gzip", "zstd", "bzip2", "xz").
# compression = "gzip"

[display]
# The table view shows at most this many records.
max_table_rows = 100
# Show a row-number column.
row_numbers = false
# First row number shown when row_numbers is enabled.
row_start_index = 1

[chart]
# Chart kind used when --chart-kind is not given: "bar", "line", or "pie".
default_kind = "bar"

[debug]
enabled = false
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses_to_defaults() {
        let manager = ConfigManager::with_dir(PathBuf::from("/nonexistent"));
        let parsed: AppConfig = toml::from_str(&manager.generate_default_config()).unwrap();
        let defaults = AppConfig::default();
        assert_eq!(parsed.version, defaults.version);
        assert_eq!(parsed.display.max_table_rows, defaults.display.max_table_rows);
        assert_eq!(parsed.chart.default_kind, defaults.chart.default_kind);
        assert_eq!(parsed.debug.enabled, defaults.debug.enabled);
    }
}
