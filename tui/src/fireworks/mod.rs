//! Fireworks Stage
//!
//! The celebration engine, assembled from four modules executed in order
//! against a shared [`StageContext`]:
//!
//! - `screen`: sky gradient and skyline
//! - `stage`: launch timing and gravity (needs `screen`)
//! - `math`: burst geometry (needs `stage`)
//! - `shells`: shell catalogue (needs all of the above)
//!
//! A module that names a dependency the context has not seen yet fails to
//! execute. Once every part is present, [`StageContext::settings`] yields the
//! configuration the [`FireworksStage`] runs with.

mod source;
mod stage;

use std::collections::BTreeSet;

use serde::Deserialize;
use thiserror::Error;

pub use source::AssetSource;
pub use stage::{FireworksStage, Shell, Spark};

/// Sky and ground
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ScreenSettings {
    pub ground_fraction: f32,
    pub sky: Vec<String>,
    pub ground: String,
}

/// Launch cadence and physics
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StageSettings {
    pub launch_interval_ms: u64,
    pub max_shells: usize,
    pub gravity: f32,
    pub apex_min: f32,
    pub apex_max: f32,
}

/// Burst geometry
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BurstMath {
    pub spark_speed_min: f32,
    pub spark_speed_max: f32,
    pub spark_life_frames: u32,
    pub drag: f32,
}

/// One entry of the shell catalogue
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ShellType {
    pub name: String,
    pub color: String,
    pub sparks: usize,
}

/// Everything the stage needs to run
#[derive(Clone, Debug, PartialEq)]
pub struct FireworksSettings {
    pub screen: ScreenSettings,
    pub stage: StageSettings,
    pub math: BurstMath,
    pub shells: Vec<ShellType>,
}

/// A module failed to execute against the context
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecuteError {
    #[error("invalid module: {0}")]
    Parse(String),

    #[error("requires `{0}`, which has not been loaded")]
    MissingDependency(String),

    #[error("provides `{0}` but has no [{0}] section")]
    MissingSection(String),

    #[error("unknown part `{0}`")]
    UnknownPart(String),
}

#[derive(Debug, Deserialize)]
struct ModuleFile {
    provides: String,
    #[serde(default)]
    requires: Vec<String>,
    screen: Option<ScreenSettings>,
    stage: Option<StageSettings>,
    math: Option<BurstMath>,
    #[serde(default)]
    shells: Vec<ShellType>,
}

/// What executed modules have established so far
#[derive(Debug, Default)]
pub struct StageContext {
    provided: BTreeSet<String>,
    screen: Option<ScreenSettings>,
    stage: Option<StageSettings>,
    math: Option<BurstMath>,
    shells: Vec<ShellType>,
}

impl StageContext {
    /// Empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute one module's text against the context
    pub fn execute(&mut self, text: &str) -> Result<(), ExecuteError> {
        let module: ModuleFile =
            toml::from_str(text).map_err(|e| ExecuteError::Parse(e.message().to_string()))?;

        if let Some(missing) = module.requires.iter().find(|r| !self.provided.contains(*r)) {
            return Err(ExecuteError::MissingDependency(missing.clone()));
        }

        let part = module.provides.clone();
        let missing_section = || ExecuteError::MissingSection(part.clone());
        match part.as_str() {
            "screen" => self.screen = Some(module.screen.ok_or_else(missing_section)?),
            "stage" => self.stage = Some(module.stage.ok_or_else(missing_section)?),
            "math" => self.math = Some(module.math.ok_or_else(missing_section)?),
            "shells" => {
                if module.shells.is_empty() {
                    return Err(missing_section());
                }
                self.shells = module.shells;
            }
            other => return Err(ExecuteError::UnknownPart(other.to_string())),
        }

        tracing::debug!(part = %part, "Fireworks module executed");
        self.provided.insert(part);
        Ok(())
    }

    /// Whether a part has been established
    pub fn provides(&self, part: &str) -> bool {
        self.provided.contains(part)
    }

    /// Complete settings, once every part is present
    pub fn settings(&self) -> Option<FireworksSettings> {
        if self.shells.is_empty() {
            return None;
        }
        Some(FireworksSettings {
            screen: self.screen.clone()?,
            stage: self.stage.clone()?,
            math: self.math.clone()?,
            shells: self.shells.clone(),
        })
    }
}
