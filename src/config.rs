/// Configuration system for charblame
///
/// Supports loading from multiple sources with priority:
/// Environment variables > Config file > Defaults
use crate::error::{BlameError, ConfigError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Blame computation settings
    #[serde(default)]
    pub blame: BlameConfig,

    /// External programs used to annotate files
    #[serde(default)]
    pub commands: CommandConfig,
}

/// Blame computation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlameConfig {
    /// Maximum number of files annotated concurrently
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Pass `-w` to `git blame` so whitespace-only changes keep their original author
    #[serde(default = "default_ignore_whitespace")]
    pub ignore_whitespace: bool,

    /// Path substrings always skipped by repository-wide blame
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

/// External program names or paths
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandConfig {
    #[serde(default = "default_git_program")]
    pub git_program: String,

    #[serde(default = "default_hg_program")]
    pub hg_program: String,

    /// Interpreter for the repository-wide mercurial annotator (needs python-hglib)
    #[serde(default = "default_python_program")]
    pub python_program: String,
}

fn default_max_concurrency() -> usize {
    8
}

fn default_ignore_whitespace() -> bool {
    true
}

fn default_git_program() -> String {
    "git".to_string()
}

fn default_hg_program() -> String {
    "hg".to_string()
}

fn default_python_program() -> String {
    "python".to_string()
}

impl Default for BlameConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            ignore_whitespace: default_ignore_whitespace(),
            ignore_patterns: Vec::new(),
        }
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            git_program: default_git_program(),
            hg_program: default_hg_program(),
            python_program: default_python_program(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, BlameError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location or create default
    pub fn load_or_default() -> Result<Self, BlameError> {
        let config_path = crate::paths::PlatformPaths::default_config_path();

        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            Self::from_file(&config_path)
        } else {
            tracing::debug!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), BlameError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::SaveFailed(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), BlameError> {
        if self.blame.max_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                key: "blame.max_concurrency".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        for (key, program) in [
            ("commands.git_program", &self.commands.git_program),
            ("commands.hg_program", &self.commands.hg_program),
            ("commands.python_program", &self.commands.python_program),
        ] {
            if program.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    reason: "must not be empty".to_string(),
                }
                .into());
            }
        }

        if self.blame.ignore_patterns.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: "blame.ignore_patterns".to_string(),
                reason: "an empty pattern would ignore every file".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("CHARBLAME_MAX_CONCURRENCY")
            && let Ok(n) = value.parse()
        {
            self.blame.max_concurrency = n;
        }

        if let Ok(value) = std::env::var("CHARBLAME_IGNORE_WHITESPACE")
            && let Ok(flag) = value.parse()
        {
            self.blame.ignore_whitespace = flag;
        }

        if let Ok(program) = std::env::var("CHARBLAME_GIT") {
            self.commands.git_program = program;
        }

        if let Ok(program) = std::env::var("CHARBLAME_HG") {
            self.commands.hg_program = program;
        }

        if let Ok(program) = std::env::var("CHARBLAME_PYTHON") {
            self.commands.python_program = program;
        }
    }

    /// Create a new Config with defaults and environment overrides
    pub fn new() -> Result<Self, BlameError> {
        let mut config = Self::load_or_default()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}
