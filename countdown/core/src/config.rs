//! Celebration Configuration
//!
//! Timing constants, surface metrics and asset locations. Sources are layered:
//! built-in defaults, then an optional TOML file, then `NEWYEAR_*` environment
//! variables. Surfaces may apply command-line flags on top.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::loader::ModuleId;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config {path}: {source}")]
    Parse {
        /// File that failed to parse
        path: PathBuf,
        /// TOML error with location
        #[source]
        source: toml::de::Error,
    },
}

/// Modules the celebration engine is assembled from, in load order
pub const DEFAULT_MODULES: [&str; 4] = [
    "fireworks/screen.toml",
    "fireworks/stage.toml",
    "fireworks/math.toml",
    "fireworks/shells.toml",
];

/// Full configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CelebrationConfig {
    /// Countdown recompute period
    pub tick_ms: u64,

    /// Delay between the terminal message and the switch to fireworks
    pub completion_grace_ms: u64,

    /// Background scene rotation period
    pub background_period_ms: u64,

    /// Number of background scenes
    pub background_scenes: usize,

    /// Delay between audio playback attempts
    pub audio_retry_ms: u64,

    /// Ambient audio volume (0.0 - 1.0)
    pub audio_volume: f32,

    /// Frame interval of the surface loop
    pub frame_interval_ms: u64,

    /// Surface pixels per terminal column
    pub cell_width: u16,

    /// Surface pixels per terminal row
    pub cell_height: u16,

    /// Celebration engine modules, in load order
    pub modules: Vec<ModuleId>,

    /// Directory modules are fetched from (None = built-in copies)
    pub assets_dir: Option<PathBuf>,

    /// Ambient audio track
    pub audio_path: Option<PathBuf>,
}

impl Default for CelebrationConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            completion_grace_ms: 800,
            background_period_ms: 2000,
            background_scenes: 4,
            audio_retry_ms: 200,
            audio_volume: 0.5,
            frame_interval_ms: 16,
            cell_width: 8,
            cell_height: 16,
            modules: DEFAULT_MODULES.iter().map(|m| ModuleId::new(*m)).collect(),
            assets_dir: None,
            audio_path: None,
        }
    }
}

impl CelebrationConfig {
    /// Default config file location: `<config_dir>/newyear/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("newyear").join("config.toml"))
    }

    /// Parse a config file; missing keys take their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the layered configuration
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        Ok(base.with_env())
    }

    /// Apply `NEWYEAR_*` environment overrides
    ///
    /// Environment variables:
    /// - `NEWYEAR_TICK_MS`: countdown tick period
    /// - `NEWYEAR_GRACE_MS`: completion grace delay
    /// - `NEWYEAR_BACKGROUND_MS`: background rotation period
    /// - `NEWYEAR_AUDIO_RETRY_MS`: audio retry period
    /// - `NEWYEAR_VOLUME`: ambient audio volume
    /// - `NEWYEAR_FRAME_MS`: frame interval
    /// - `NEWYEAR_ASSETS`: module directory
    /// - `NEWYEAR_AUDIO`: ambient audio track
    pub fn with_env(self) -> Self {
        self.with_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
            value.and_then(|v| v.trim().parse().ok())
        }

        if let Some(v) = parsed(var("NEWYEAR_TICK_MS")) {
            self.tick_ms = v;
        }
        if let Some(v) = parsed(var("NEWYEAR_GRACE_MS")) {
            self.completion_grace_ms = v;
        }
        if let Some(v) = parsed(var("NEWYEAR_BACKGROUND_MS")) {
            self.background_period_ms = v;
        }
        if let Some(v) = parsed(var("NEWYEAR_AUDIO_RETRY_MS")) {
            self.audio_retry_ms = v;
        }
        if let Some(v) = parsed::<f32>(var("NEWYEAR_VOLUME")) {
            self.audio_volume = v.clamp(0.0, 1.0);
        }
        if let Some(v) = parsed(var("NEWYEAR_FRAME_MS")) {
            self.frame_interval_ms = v;
        }
        if let Some(dir) = var("NEWYEAR_ASSETS") {
            self.assets_dir = Some(PathBuf::from(dir));
        }
        if let Some(path) = var("NEWYEAR_AUDIO") {
            self.audio_path = Some(PathBuf::from(path));
        }
        self
    }
}

/// Launch options parsed from a query-style string (`fireworks=1&...`)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LaunchQuery {
    /// Start directly in fireworks mode
    pub force_fireworks: bool,
}

impl LaunchQuery {
    /// Parse `key=value` pairs separated by `&`; a leading `?` is ignored
    ///
    /// Only `fireworks=1` enables the override.
    pub fn parse(query: &str) -> Self {
        let force_fireworks = query
            .trim_start_matches('?')
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .any(|(key, value)| key == "fireworks" && value == "1");
        Self { force_fireworks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_presentation_timing() {
        let config = CelebrationConfig::default();
        assert_eq!(config.tick_ms, 1000);
        assert_eq!(config.completion_grace_ms, 800);
        assert_eq!(config.background_period_ms, 2000);
        assert_eq!(config.audio_retry_ms, 200);
        assert_eq!(config.modules.len(), 4);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("NEWYEAR_TICK_MS", "250"),
            ("NEWYEAR_VOLUME", "3.0"),
            ("NEWYEAR_ASSETS", "/tmp/assets"),
            ("NEWYEAR_GRACE_MS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let config = CelebrationConfig::default().with_vars(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.tick_ms, 250);
        assert_eq!(config.audio_volume, 1.0);
        assert_eq!(config.assets_dir, Some(PathBuf::from("/tmp/assets")));
        assert_eq!(config.completion_grace_ms, 800);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "tick_ms = 500\nmodules = [\"a.toml\", \"b.toml\"]\n").unwrap();

        let config = CelebrationConfig::from_file(&path).unwrap();
        assert_eq!(config.tick_ms, 500);
        assert_eq!(config.modules, vec![ModuleId::new("a.toml"), ModuleId::new("b.toml")]);
        assert_eq!(config.completion_grace_ms, 800);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = CelebrationConfig::load(Some(Path::new("/nonexistent/newyear.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_launch_query() {
        assert!(LaunchQuery::parse("fireworks=1").force_fireworks);
        assert!(LaunchQuery::parse("?a=b&fireworks=1").force_fireworks);
        assert!(!LaunchQuery::parse("fireworks=true").force_fireworks);
        assert!(!LaunchQuery::parse("").force_fireworks);
    }
}
