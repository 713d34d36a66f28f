//! Configuration system for the palm-bridge frontend

use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Config {
    pub input: InputConfig,
    pub poll: PollConfig,
    pub audio: AudioConfig,
    pub paths: PathConfig,
    pub clipboard: ClipboardConfig,
}

/// Touch smoothing settings
///
/// The emulated OS was written with mouse-grade input in mind; raw touch
/// streams are far too dense and jittery, so moves closer than
/// `smooth_pixels` and faster than `smooth_period_ms` are suppressed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub smooth_pixels: u32,
    pub smooth_period_ms: u64,
    pub use_hw_keys: bool,
}

/// Idle polling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Milliseconds between idle ticks
    pub interval_ms: u64,
}

/// Audio settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub backend: AudioBackend,
    pub enable: bool,
    pub volume: f32,
}

/// Audio backend type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum AudioBackend {
    #[default]
    Auto,
    Null,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Directory holding ROMs, skins, and session files
    pub base_dir: PathBuf,
    /// Current session file name, relative to `base_dir`
    pub session_file: String,
    /// Marker file persisted when the engine crashes
    pub crash_flag: PathBuf,
}

/// Clipboard translation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct ClipboardConfig {
    pub codepage: Codepage,
}

/// Legacy single-byte codepage used by the emulated OS
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum Codepage {
    /// CP1252, the emulated OS default for Western locales
    #[default]
    Windows1252,
    /// ISO-8859-1 fallback when CP1252 is not wanted
    Latin1,
}

// Default implementations

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            smooth_pixels: 4,
            smooth_period_ms: 250,
            use_hw_keys: false,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_ms: 50 }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            backend: AudioBackend::default(),
            enable: true,
            volume: 1.0,
        }
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        let base = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("palm-bridge");

        Self {
            crash_flag: base.join("crashed"),
            base_dir: base,
            session_file: "autosave.psf".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if path.exists() {
            Self::load_from(&path)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| BridgeError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| BridgeError::Config(e.to_string()))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("palm-bridge")
            .join("config.toml")
    }

    /// Full path of the current session file
    pub fn session_path(&self) -> PathBuf {
        self.paths.base_dir.join(&self.paths.session_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.input.smooth_pixels, 4);
        assert_eq!(config.input.smooth_period_ms, 250);
        assert_eq!(config.poll.interval_ms, 50);
        assert!(config.audio.enable);
        assert_eq!(config.paths.session_file, "autosave.psf");
        assert_eq!(config.clipboard.codepage, Codepage::Windows1252);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.input.smooth_pixels, config.input.smooth_pixels);
        assert_eq!(parsed.paths.session_file, config.paths.session_file);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[poll]\ninterval_ms = 100\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.poll.interval_ms, 100);
        // Unspecified sections fall back to defaults
        assert_eq!(config.input.smooth_pixels, 4);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "poll = \"not a table\"").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Config::load_from(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, BridgeError::Io(_)));
    }

    #[test]
    fn test_session_path() {
        let mut config = Config::default();
        config.paths.base_dir = PathBuf::from("/data/palm");
        config.paths.session_file = "work.psf".to_string();
        assert_eq!(config.session_path(), PathBuf::from("/data/palm/work.psf"));
    }
}
