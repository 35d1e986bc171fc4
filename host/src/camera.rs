use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{ImageReader, RgbImage};

use crate::error::{Error, Result};

/// Resolution the camera is opened at
pub const TARGET_WIDTH: u32 = 1280;
pub const TARGET_HEIGHT: u32 = 720;

const FRAME_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// A camera: a blocking, sequential supply of raw color frames.
///
/// `Ok(None)` means a finite source ran out. Errors are fatal to the
/// session. Releasing the device is done on drop.
pub trait FrameSource {
    fn name(&self) -> &str;
    fn read_frame(&mut self) -> Result<Option<RgbImage>>;
}

/// Plays a directory of still images back as a camera, in file-name order.
pub struct ImageSequence {
    name: String,
    files: Vec<PathBuf>,
    next: usize,
    resolution: (u32, u32),
}

impl ImageSequence {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_resolution(dir, TARGET_WIDTH, TARGET_HEIGHT)
    }

    /// Opens the directory; frames of another size are resized to `width` x `height`.
    pub fn open_with_resolution(dir: impl AsRef<Path>, width: u32, height: u32) -> Result<Self> {
        let dir = dir.as_ref();
        let name = dir.display().to_string();
        let unavailable = |reason: String| Error::CameraUnavailable {
            source_name: name.clone(),
            reason,
        };

        if width == 0 || height == 0 {
            return Err(unavailable(format!("invalid resolution {}x{}", width, height)));
        }

        let entries = fs::read_dir(dir).map_err(|e| unavailable(e.to_string()))?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_frame_file(path))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(unavailable("no frames found".into()));
        }

        tracing::info!(
            "Opened frame source {} ({} frames at {}x{})",
            name,
            files.len(),
            width,
            height
        );

        Ok(Self {
            name,
            files,
            next: 0,
            resolution: (width, height),
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FrameSource for ImageSequence {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        let Some(path) = self.files.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;

        let frame = ImageReader::open(path)
            .and_then(|r| r.with_guessed_format())
            .map_err(|e| Error::FrameRead(format!("{}: {}", path.display(), e)))?
            .decode()
            .map_err(|e| Error::FrameRead(format!("{}: {}", path.display(), e)))?
            .into_rgb8();

        let (w, h) = self.resolution;
        if frame.dimensions() == (w, h) {
            Ok(Some(frame))
        } else {
            Ok(Some(imageops::resize(&frame, w, h, FilterType::Triangle)))
        }
    }
}

impl Drop for ImageSequence {
    fn drop(&mut self) {
        tracing::info!(
            "Released frame source {} after {} frames",
            self.name,
            self.next
        );
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            FRAME_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}
