use std::fs;
use std::path::{Path, PathBuf};

use pong_core::constants::{DEFAULT_SPEED, MAX_SPEED, MIN_SPEED};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Config files larger than this are rejected before parsing
const MAX_CONFIG_SIZE: u64 = 1024 * 1024;

/// Where one sprite comes from when it overrides the built-in default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpriteSource {
    /// An image file on disk
    Path(PathBuf),
    /// Raw bytes handed over by a front end (e.g. a browser upload);
    /// staged to a temporary file before decoding
    Upload { name: String, bytes: Vec<u8> },
}

/// Sprite overrides plus the directory holding the fallback files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteConfig {
    pub asset_dir: PathBuf,
    pub background: Option<SpriteSource>,
    /// Falls back to `background` when unset
    pub game_over_background: Option<SpriteSource>,
    pub ball: Option<SpriteSource>,
    pub paddle_left: Option<SpriteSource>,
    pub paddle_right: Option<SpriteSource>,
    /// Directory for staged uploads; the system temp dir when unset
    pub staging_dir: Option<PathBuf>,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("assets"),
            background: None,
            game_over_background: None,
            ball: None,
            paddle_left: None,
            paddle_right: None,
            staging_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Ball speed on both axes, in pixels per frame
    pub speed: i32,
    pub sprites: SpriteConfig,
    /// Scale the fixed pixel offsets to the camera's frame size
    pub scale_layout: bool,
    /// Stop the session after this many frames
    pub max_frames: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            sprites: SpriteConfig::default(),
            scale_layout: false,
            max_frames: None,
        }
    }
}

impl GameConfig {
    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|e| {
            Error::Config(format!("cannot access '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_SIZE {
            return Err(Error::Config(format!(
                "config file too large: {} bytes (max {} bytes)",
                metadata.len(),
                MAX_CONFIG_SIZE
            )));
        }

        let raw = fs::read_to_string(path)?;
        let config: GameConfig = serde_json::from_str(&raw)?;
        config.validate()?;

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_speed(self.speed)?;
        if self.max_frames == Some(0) {
            return Err(Error::Config("max_frames must be at least 1".into()));
        }
        Ok(())
    }
}

pub fn validate_speed(speed: i32) -> Result<()> {
    if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
        return Err(Error::Config(format!(
            "speed {} out of range: must be between {} and {}",
            speed, MIN_SPEED, MAX_SPEED
        )));
    }
    Ok(())
}
