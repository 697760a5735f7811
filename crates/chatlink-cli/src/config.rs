//! chatlink CLI Configuration Management
//!
//! Configuration is read from a TOML file (`--config`) layered over defaults:
//! every section and field may be omitted. The `core` section carries the
//! client tunables from `chatlink-core`; the rest is CLI-specific.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use chatlink_core::ChatlinkConfig;

// ----------------------------------------------------------------------------
// CLI Application Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the chatlink CLI application
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Client core configuration
    pub core: ChatlinkConfig,

    /// Local state persistence
    pub state: StateConfig,

    /// Output behaviour
    pub cli: CliConfig,
}

/// Where and how the local backend state is kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Directory holding the state file; defaults to the platform data dir
    pub state_dir: Option<PathBuf>,

    /// Name of the state file inside `state_dir`
    pub state_file: String,
}

/// CLI-specific configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Enable verbose logging output
    pub verbose: bool,

    /// Maximum number of messages printed by `history`
    pub max_printed_messages: usize,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            state_dir: None,
            state_file: "state.json".to_string(),
        }
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            max_printed_messages: 50,
        }
    }
}

// ----------------------------------------------------------------------------
// Configuration Loading Logic
// ----------------------------------------------------------------------------

impl AppConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::Loading(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&contents)
            .map_err(|e| ConfigError::Loading(format!("Failed to load from {}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            toml::from_str(contents).map_err(|e| ConfigError::Loading(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::FileSystem(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialization(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path.as_ref(), toml_string)
            .map_err(|e| ConfigError::FileSystem(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.core
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        if self.state.state_file.trim().is_empty() {
            return Err(ConfigError::Validation(
                "state.state_file must not be empty".to_string(),
            ));
        }
        if self.cli.max_printed_messages == 0 {
            return Err(ConfigError::Validation(
                "cli.max_printed_messages must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Directory holding local state
    pub fn state_dir(&self) -> PathBuf {
        self.state
            .state_dir
            .clone()
            .unwrap_or_else(Self::default_state_dir)
    }

    /// Full path of the state file
    pub fn state_path(&self) -> PathBuf {
        self.state_dir().join(&self.state.state_file)
    }

    /// Platform data directory, or `.chatlink` in the working directory
    fn default_state_dir() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("chatlink"))
            .unwrap_or_else(|| PathBuf::from(".chatlink"))
    }

    /// Create example configuration file content
    pub fn example_config() -> String {
        let example_config = AppConfig {
            state: StateConfig {
                state_dir: Some(PathBuf::from("/tmp/chatlink")),
                state_file: "state.json".to_string(),
            },
            ..Default::default()
        };

        toml::to_string_pretty(&example_config)
            .unwrap_or_else(|_| "# Failed to generate example config".to_string())
    }
}

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {0}")]
    Loading(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = AppConfig::default();
        assert!(!config.cli.verbose);
        assert_eq!(config.state.state_file, "state.json");
        assert_eq!(config.core.messages.max_length, 2000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [core.messages]
            max_length = 500

            [state]
            state_dir = "/var/lib/chatlink"
            "#,
        )
        .unwrap();
        assert_eq!(config.core.messages.max_length, 500);
        assert_eq!(config.core.messages.history_limit, 500);
        assert_eq!(config.core.verification.window_secs, 300);
        assert_eq!(
            config.state_path(),
            PathBuf::from("/var/lib/chatlink/state.json")
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.state.state_file = " ".to_string();
        assert!(config.validate().is_err());

        let err = AppConfig::from_toml("[core.messages]\nmax_length = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        assert!(AppConfig::from_toml("not toml at all [").is_err());
    }

    #[test]
    fn test_example_config_generation() {
        let example = AppConfig::example_config();
        assert!(example.contains("[core.messages]"));
        assert!(example.contains("[state]"));
        assert!(example.contains("[cli]"));

        let parsed = AppConfig::from_toml(&example).unwrap();
        assert_eq!(parsed.state.state_dir, Some(PathBuf::from("/tmp/chatlink")));
    }
}
