/// Platform-specific config locations and repository path helpers
///
/// Follows the XDG Base Directory specification on Unix-like systems.
use crate::error::{Result, ValidationError};
use std::path::{Path, PathBuf};

/// Application directory name under the platform config root
const APP_DIR: &str = "charblame";

/// Platform-agnostic path utilities
pub struct PlatformPaths;

impl PlatformPaths {
    /// Get the appropriate config directory for the current platform
    ///
    /// - Windows: %APPDATA%
    /// - macOS: ~/Library/Application Support
    /// - Linux/Unix: $XDG_CONFIG_HOME or ~/.config
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            std::env::var("APPDATA")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
        } else if cfg!(target_os = "macos") {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join("Library/Application Support"))
                .unwrap_or_else(|_| PathBuf::from("."))
        } else {
            std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|home| PathBuf::from(home).join(".config")))
                .unwrap_or_else(|_| PathBuf::from("."))
        }
    }

    /// Get the charblame config directory
    pub fn project_config_dir() -> PathBuf {
        Self::config_dir().join(APP_DIR)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::project_config_dir().join("config.toml")
    }
}

/// True if `path` is an existing directory
pub fn is_dir(path: &Path) -> bool {
    path.metadata().map(|m| m.is_dir()).unwrap_or(false)
}

/// Check that a repository root exists and is a directory
pub fn validate_repo_path(repo: &Path) -> Result<()> {
    if !repo.exists() {
        return Err(ValidationError::RepoNotFound(repo.display().to_string()).into());
    }
    if !repo.is_dir() {
        return Err(ValidationError::NotADirectory(repo.display().to_string()).into());
    }
    Ok(())
}

/// Size in bytes of `path` relative to `repo`, if it exists on disk
pub fn file_size(repo: &Path, path: &str) -> Option<u64> {
    repo.join(path).metadata().ok().map(|m| m.len())
}
