pub mod assets;
pub mod camera;
pub mod config;
pub mod draw;
pub mod engine;
pub mod error;
pub mod session;
pub mod sink;
pub mod tracker;

pub use assets::{load_sprites, AssetWarning, LoadedSprites, Origin, SpriteKind, SpriteSet};
pub use camera::{FrameSource, ImageSequence};
pub use config::{GameConfig, SpriteConfig, SpriteSource};
pub use engine::{LayoutPolicy, RoundEngine};
pub use error::{Error, Result};
pub use session::{run_session, Control, EndReason, Session, SessionSummary, StopSignal};
pub use sink::{DiscardFrames, FrameSink, PngSequence};
pub use tracker::{HandScript, HandTracker, NoHands, ScriptedTracker};

/// A round engine ready to play, plus what went wrong getting there.
pub struct PreparedGame {
    pub engine: RoundEngine,
    pub session: Session,
    pub warnings: Vec<AssetWarning>,
}

/// Prepare a game from configuration.
///
/// Loads the sprite set (never failing on a bad sprite: placeholders are
/// substituted and reported in `warnings`) and creates a stopped session at
/// the configured speed.
///
/// # Arguments
/// * `config` - The game configuration; validated before anything is loaded
///
/// # Returns
/// * `Ok(PreparedGame)` - Engine, fresh session and any asset warnings
/// * `Err` - If the configuration is invalid
pub fn prepare_game(config: &GameConfig) -> Result<PreparedGame> {
    config.validate()?;

    let loaded = load_sprites(&config.sprites);

    let policy = LayoutPolicy::from_flag(config.scale_layout);
    tracing::info!(
        "Prepared game: speed {}, layout {:?}, {} asset warning(s)",
        config.speed,
        policy,
        loaded.warnings.len()
    );

    Ok(PreparedGame {
        engine: RoundEngine::new(loaded.sprites, policy),
        session: Session::new(config.speed)?,
        warnings: loaded.warnings,
    })
}
