//! Sprite loading with placeholder fallback.
//!
//! A missing or unreadable sprite never stops a game: it is replaced by a
//! drawn placeholder and reported as an [`AssetWarning`].

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageReader, Rgb, RgbImage, Rgba, RgbaImage};
use tempfile::TempPath;

use crate::config::{SpriteConfig, SpriteSource};
use crate::draw;

/// Placeholder background size (the reference camera frame)
const PLACEHOLDER_BG: (u32, u32) = (1280, 720);
const PLACEHOLDER_BG_GRAY: u8 = 100;

/// Placeholder ball: white square with a red disc filling it
const PLACEHOLDER_BALL: u32 = 50;

/// Placeholder paddle size (w, h)
const PLACEHOLDER_PADDLE: (u32, u32) = (30, 150);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteKind {
    Background,
    GameOverBackground,
    Ball,
    PaddleLeft,
    PaddleRight,
}

impl SpriteKind {
    pub const ALL: [SpriteKind; 5] = [
        SpriteKind::Background,
        SpriteKind::GameOverBackground,
        SpriteKind::Ball,
        SpriteKind::PaddleLeft,
        SpriteKind::PaddleRight,
    ];

    /// File looked up in the asset directory when no override is given.
    /// The game-over screen reuses the background file.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            SpriteKind::Background | SpriteKind::GameOverBackground => "Background.jpg",
            SpriteKind::Ball => "ball.jpg",
            SpriteKind::PaddleLeft => "bat1.jpg",
            SpriteKind::PaddleRight => "bat2.jpg",
        }
    }
}

impl fmt::Display for SpriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpriteKind::Background => write!(f, "background"),
            SpriteKind::GameOverBackground => write!(f, "game-over background"),
            SpriteKind::Ball => write!(f, "ball"),
            SpriteKind::PaddleLeft => write!(f, "left paddle"),
            SpriteKind::PaddleRight => write!(f, "right paddle"),
        }
    }
}

/// Where a loaded sprite actually came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Override(PathBuf),
    Upload(String),
    Default(PathBuf),
    Placeholder,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Override(p) => write!(f, "override {}", p.display()),
            Origin::Upload(name) => write!(f, "upload '{}'", name),
            Origin::Default(p) => write!(f, "default {}", p.display()),
            Origin::Placeholder => write!(f, "placeholder"),
        }
    }
}

/// Non-fatal problems met while loading sprites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetWarning {
    /// An upload could not be written to a temporary file; the default asset was used
    StagingFailed { kind: SpriteKind, reason: String },
    /// The image could not be decoded; a placeholder was drawn instead
    Placeholder {
        kind: SpriteKind,
        path: PathBuf,
        reason: String,
    },
}

impl fmt::Display for AssetWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetWarning::StagingFailed { kind, reason } => {
                write!(f, "error saving uploaded {} image: {}", kind, reason)
            }
            AssetWarning::Placeholder { kind, path, reason } => write!(
                f,
                "could not load {} from {} ({}), using placeholder",
                kind,
                path.display(),
                reason
            ),
        }
    }
}

/// The five images a game is drawn with. Paddles always carry alpha.
#[derive(Debug, Clone)]
pub struct SpriteSet {
    pub background: RgbImage,
    pub game_over_background: RgbImage,
    pub ball: RgbImage,
    pub paddle_left: RgbaImage,
    pub paddle_right: RgbaImage,
}

impl SpriteSet {
    /// The set used when no image file is available at all.
    pub fn placeholders() -> Self {
        Self {
            background: placeholder_background(),
            game_over_background: placeholder_background(),
            ball: placeholder_ball(),
            paddle_left: placeholder_paddle(Rgb([0, 0, 255])),
            paddle_right: placeholder_paddle(Rgb([0, 255, 0])),
        }
    }

    pub fn dimensions(&self, kind: SpriteKind) -> (u32, u32) {
        match kind {
            SpriteKind::Background => self.background.dimensions(),
            SpriteKind::GameOverBackground => self.game_over_background.dimensions(),
            SpriteKind::Ball => self.ball.dimensions(),
            SpriteKind::PaddleLeft => self.paddle_left.dimensions(),
            SpriteKind::PaddleRight => self.paddle_right.dimensions(),
        }
    }
}

#[derive(Debug)]
pub struct LoadedSprites {
    pub sprites: SpriteSet,
    pub origins: Vec<(SpriteKind, Origin)>,
    pub warnings: Vec<AssetWarning>,
}

impl LoadedSprites {
    pub fn origin(&self, kind: SpriteKind) -> Option<&Origin> {
        self.origins.iter().find(|(k, _)| *k == kind).map(|(_, o)| o)
    }
}

/// A path ready to decode. Staged uploads are deleted when this drops.
struct Resolved {
    path: PathBuf,
    origin: Origin,
    _staged: Option<TempPath>,
}

/// Loads every sprite, substituting placeholders for anything unreadable.
pub fn load_sprites(config: &SpriteConfig) -> LoadedSprites {
    let mut warnings = Vec::new();
    let mut origins = Vec::with_capacity(SpriteKind::ALL.len());

    let mut load = |kind: SpriteKind, source: Option<&SpriteSource>| -> Option<DynamicImage> {
        let resolved = resolve(kind, source, config, &mut warnings);
        match decode(&resolved.path) {
            Ok(img) => {
                tracing::debug!("Loaded {} from {}", kind, resolved.origin);
                origins.push((kind, resolved.origin));
                Some(img)
            }
            Err(reason) => {
                tracing::warn!(
                    "Could not load {} from {}: {}",
                    kind,
                    resolved.path.display(),
                    reason
                );
                warnings.push(AssetWarning::Placeholder {
                    kind,
                    path: resolved.path,
                    reason,
                });
                origins.push((kind, Origin::Placeholder));
                None
            }
        }
    };

    let background = load(SpriteKind::Background, config.background.as_ref())
        .map(DynamicImage::into_rgb8)
        .unwrap_or_else(placeholder_background);

    let game_over_background = match config.game_over_background.as_ref() {
        Some(source) => load(SpriteKind::GameOverBackground, Some(source))
            .map(DynamicImage::into_rgb8)
            .unwrap_or_else(placeholder_background),
        None => background.clone(),
    };

    let ball = load(SpriteKind::Ball, config.ball.as_ref())
        .map(DynamicImage::into_rgb8)
        .unwrap_or_else(placeholder_ball);

    let paddle_left = load(SpriteKind::PaddleLeft, config.paddle_left.as_ref())
        .map(ensure_alpha)
        .unwrap_or_else(|| placeholder_paddle(Rgb([0, 0, 255])));

    let paddle_right = load(SpriteKind::PaddleRight, config.paddle_right.as_ref())
        .map(ensure_alpha)
        .unwrap_or_else(|| placeholder_paddle(Rgb([0, 255, 0])));

    if config.game_over_background.is_none() {
        let shared = origins
            .iter()
            .find(|(k, _)| *k == SpriteKind::Background)
            .map(|(_, o)| o.clone())
            .unwrap_or(Origin::Placeholder);
        origins.push((SpriteKind::GameOverBackground, shared));
    }

    LoadedSprites {
        sprites: SpriteSet {
            background,
            game_over_background,
            ball,
            paddle_left,
            paddle_right,
        },
        origins,
        warnings,
    }
}

fn resolve(
    kind: SpriteKind,
    source: Option<&SpriteSource>,
    config: &SpriteConfig,
    warnings: &mut Vec<AssetWarning>,
) -> Resolved {
    let default = || {
        let path = config.asset_dir.join(kind.default_file_name());
        Resolved {
            origin: Origin::Default(path.clone()),
            path,
            _staged: None,
        }
    };

    match source {
        None => default(),
        Some(SpriteSource::Path(path)) => Resolved {
            path: path.clone(),
            origin: Origin::Override(path.clone()),
            _staged: None,
        },
        Some(SpriteSource::Upload { name, bytes }) => {
            match stage_upload(name, bytes, config.staging_dir.as_deref()) {
                Ok(staged) => Resolved {
                    path: staged.to_path_buf(),
                    origin: Origin::Upload(name.clone()),
                    _staged: Some(staged),
                },
                Err(e) => {
                    tracing::warn!("Error saving uploaded {} '{}': {}", kind, name, e);
                    warnings.push(AssetWarning::StagingFailed {
                        kind,
                        reason: e.to_string(),
                    });
                    default()
                }
            }
        }
    }
}

/// Writes uploaded bytes to a named temporary file so they can be decoded
/// like any other sprite file.
pub fn stage_upload(name: &str, bytes: &[u8], dir: Option<&Path>) -> std::io::Result<TempPath> {
    let suffix = Path::new(name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_else(|| ".img".to_string());

    let mut builder = tempfile::Builder::new();
    builder.prefix("handpong-upload-").suffix(&suffix);
    let mut file = match dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file.into_temp_path())
}

/// Decodes by content, so a PNG staged under a `.jpg` name still loads.
fn decode(path: &Path) -> Result<DynamicImage, String> {
    let reader = ImageReader::open(path)
        .map_err(|e| e.to_string())?
        .with_guessed_format()
        .map_err(|e| e.to_string())?;
    reader.decode().map_err(|e| e.to_string())
}

/// Paddles are composited with alpha; images without it become fully opaque.
pub fn ensure_alpha(img: DynamicImage) -> RgbaImage {
    if !img.color().has_alpha() {
        tracing::debug!("Adding opaque alpha channel to {}x{} sprite", img.width(), img.height());
    }
    img.into_rgba8()
}

fn placeholder_background() -> RgbImage {
    let (w, h) = PLACEHOLDER_BG;
    RgbImage::from_pixel(w, h, Rgb([PLACEHOLDER_BG_GRAY; 3]))
}

fn placeholder_ball() -> RgbImage {
    let size = PLACEHOLDER_BALL;
    let r = (size / 2) as i32;
    let mut ball = RgbImage::from_pixel(size, size, Rgb([255, 255, 255]));
    draw::fill_circle(&mut ball, r, r, r, Rgb([255, 0, 0]));
    ball
}

fn placeholder_paddle(color: Rgb<u8>) -> RgbaImage {
    let (w, h) = PLACEHOLDER_PADDLE;
    let Rgb([r, g, b]) = color;
    RgbaImage::from_pixel(w, h, Rgba([r, g, b, 255]))
}
