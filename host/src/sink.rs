use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};

use crate::error::{Error, Result};

/// Where composited frames go: a window, a stream, a directory.
pub trait FrameSink {
    fn present(&mut self, index: u64, frame: &RgbImage) -> Result<()>;
}

/// Writes every frame as `frame_000000.png` into a directory.
#[derive(Debug)]
pub struct PngSequence {
    dir: PathBuf,
    written: u64,
}

impl PngSequence {
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            Error::Sink(format!("cannot create '{}': {}", dir.display(), e))
        })?;
        Ok(Self { dir, written: 0 })
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{:06}.png", index))
    }
}

impl FrameSink for PngSequence {
    fn present(&mut self, index: u64, frame: &RgbImage) -> Result<()> {
        let path = self.frame_path(index);
        frame
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| Error::Sink(format!("{}: {}", path.display(), e)))?;
        self.written += 1;
        Ok(())
    }
}

/// Headless sink: counts frames and drops them.
#[derive(Debug, Default)]
pub struct DiscardFrames {
    pub presented: u64,
}

impl FrameSink for DiscardFrames {
    fn present(&mut self, _index: u64, _frame: &RgbImage) -> Result<()> {
        self.presented += 1;
        Ok(())
    }
}
