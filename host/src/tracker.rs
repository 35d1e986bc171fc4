use std::fs;
use std::path::Path;

use image::RgbImage;
use pong_core::Hand;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Script files larger than this are rejected before parsing
const MAX_SCRIPT_SIZE: u64 = 10 * 1024 * 1024;

/// Hand detection, seen from the game: a frame in, labelled boxes out.
pub trait HandTracker {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<Hand>>;
}

/// Sees nothing, ever. The ball just bounces until it leaves the field.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHands;

impl HandTracker for NoHands {
    fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<Hand>> {
        Ok(Vec::new())
    }
}

/// Per-frame hand positions, in the tracker's own JSON shape:
///
/// ```json
/// { "frames": [[{"bbox": [200, 260, 80, 80], "type": "Left"}], []], "repeat_last": true }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandScript {
    pub frames: Vec<Vec<Hand>>,
    /// Keep returning the last entry once the script runs out
    #[serde(default)]
    pub repeat_last: bool,
}

/// Replays a [`HandScript`] one entry per detected frame.
#[derive(Debug, Clone)]
pub struct ScriptedTracker {
    script: HandScript,
    cursor: usize,
}

impl ScriptedTracker {
    pub fn new(script: HandScript) -> Self {
        Self { script, cursor: 0 }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|e| {
            Error::Tracker(format!("cannot access '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_SCRIPT_SIZE {
            return Err(Error::Tracker(format!(
                "hand script too large: {} bytes (max {} bytes)",
                metadata.len(),
                MAX_SCRIPT_SIZE
            )));
        }

        let raw = fs::read_to_string(path)?;
        let script: HandScript = serde_json::from_str(&raw).map_err(|e| {
            Error::Tracker(format!("invalid hand script '{}': {}", path.display(), e))
        })?;

        tracing::info!(
            "Loaded hand script {} ({} frames, repeat_last={})",
            path.display(),
            script.frames.len(),
            script.repeat_last
        );
        Ok(Self::new(script))
    }

    /// Number of frames detected so far
    pub fn position(&self) -> usize {
        self.cursor
    }
}

impl HandTracker for ScriptedTracker {
    fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<Hand>> {
        let frames = &self.script.frames;
        let hands = match frames.get(self.cursor) {
            Some(hands) => hands.clone(),
            None if self.script.repeat_last => frames.last().cloned().unwrap_or_default(),
            None => Vec::new(),
        };
        self.cursor += 1;
        Ok(hands)
    }
}
