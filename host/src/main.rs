use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use handpong::{
    load_sprites, prepare_game, run_session, DiscardFrames, EndReason, FrameSink, GameConfig,
    HandTracker, ImageSequence, NoHands, PngSequence, ScriptedTracker, SpriteKind, SpriteSource,
    StopSignal,
};

#[derive(Parser)]
#[command(name = "handpong", version, about = "Pong on a camera feed, paddles driven by your hands")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play a session from a frame source and write the composited frames
    Play(PlayArgs),
    /// Resolve the sprite set and show where each sprite came from
    Assets(SpriteArgs),
}

#[derive(Args)]
struct PlayArgs {
    /// Directory of camera frames (png/jpg), played back in name order
    #[arg(long)]
    frames: PathBuf,

    /// Hand script (JSON); without it no hands are detected
    #[arg(long)]
    hands: Option<PathBuf>,

    /// Output directory for composited frames
    /// (default: handpong-session_<timestamp>)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Do not write frames anywhere
    #[arg(long, conflicts_with = "out")]
    headless: bool,

    /// Ball speed in pixels per frame (5-25)
    #[arg(long)]
    speed: Option<i32>,

    /// Stop after this many frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// Scale fixed pixel offsets to the frame size
    #[arg(long)]
    scale_layout: bool,

    #[command(flatten)]
    sprites: SpriteArgs,
}

#[derive(Args)]
struct SpriteArgs {
    /// JSON config file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the default sprite files
    #[arg(long)]
    assets: Option<PathBuf>,

    #[arg(long)]
    background: Option<PathBuf>,

    #[arg(long)]
    game_over_background: Option<PathBuf>,

    #[arg(long)]
    ball: Option<PathBuf>,

    #[arg(long)]
    paddle_left: Option<PathBuf>,

    #[arg(long)]
    paddle_right: Option<PathBuf>,
}

impl SpriteArgs {
    fn to_config(&self) -> GameConfig {
        let mut config = match &self.config {
            Some(path) => GameConfig::from_file(path).unwrap_or_else(|e| {
                eprintln!("❌ Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }),
            None => GameConfig::default(),
        };

        let sprites = &mut config.sprites;
        if let Some(dir) = &self.assets {
            sprites.asset_dir = dir.clone();
        }
        let set = |slot: &mut Option<SpriteSource>, flag: &Option<PathBuf>| {
            if let Some(path) = flag {
                *slot = Some(SpriteSource::Path(path.clone()));
            }
        };
        set(&mut sprites.background, &self.background);
        set(&mut sprites.game_over_background, &self.game_over_background);
        set(&mut sprites.ball, &self.ball);
        set(&mut sprites.paddle_left, &self.paddle_left);
        set(&mut sprites.paddle_right, &self.paddle_right);
        config
    }
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    println!("🏓 Hand Pong");
    println!("{}", "=".repeat(70));
    println!();

    match cli.command {
        Command::Play(args) => play_command(args),
        Command::Assets(args) => assets_command(args),
    }
}

fn play_command(args: PlayArgs) {
    let mut config = args.sprites.to_config();
    if let Some(speed) = args.speed {
        config.speed = speed;
    }
    if args.max_frames.is_some() {
        config.max_frames = args.max_frames;
    }
    config.scale_layout |= args.scale_layout;

    let prepared = prepare_game(&config).unwrap_or_else(|e| {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    });
    for warning in &prepared.warnings {
        println!("⚠️  {}", warning);
    }

    // Camera first: if it cannot be opened the session never starts.
    let source = ImageSequence::open(&args.frames).unwrap_or_else(|e| {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    });

    let mut tracker: Box<dyn HandTracker> = match &args.hands {
        Some(path) => Box::new(ScriptedTracker::from_file(path).unwrap_or_else(|e| {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        })),
        None => Box::new(NoHands),
    };

    let out_dir = if args.headless {
        None
    } else {
        Some(args.out.clone().unwrap_or_else(|| {
            PathBuf::from(format!(
                "handpong-session_{}",
                chrono::Utc::now().timestamp()
            ))
        }))
    };
    let mut sink: Box<dyn FrameSink> = match &out_dir {
        Some(dir) => Box::new(PngSequence::create(dir).unwrap_or_else(|e| {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        })),
        None => Box::new(DiscardFrames::default()),
    };

    println!("🎮 Playing");
    println!("  Frames: {} ({} files)", args.frames.display(), source.len());
    println!("  Speed: {}", config.speed);
    match &out_dir {
        Some(dir) => println!("  Output: {}", dir.display()),
        None => println!("  Output: (headless)"),
    }

    // Enter on the terminal is the Stop control; the loop ends at the next frame boundary.
    let stop = StopSignal::new();
    if std::io::stdin().is_terminal() {
        let signal = stop.clone();
        std::thread::spawn(move || {
            let mut line = String::new();
            if std::io::stdin().read_line(&mut line).is_ok() {
                signal.stop();
            }
        });
        println!("  Press Enter to stop");
    }
    println!();

    let mut session = prepared.session;
    session.start();
    let start = Instant::now();

    let summary = run_session(
        &mut session,
        source,
        tracker.as_mut(),
        &prepared.engine,
        sink.as_mut(),
        &stop,
        config.max_frames,
    )
    .unwrap_or_else(|e| {
        eprintln!();
        eprintln!("❌ Session failed: {}", e);
        std::process::exit(1);
    });

    let duration = start.elapsed();
    let fps = if duration.as_secs_f64() > 0.0 {
        summary.frames as f64 / duration.as_secs_f64()
    } else {
        0.0
    };

    println!("✅ Session finished");
    println!(
        "  Ended: {}",
        match summary.reason {
            EndReason::NotRunning => "not running",
            EndReason::Stopped => "stopped",
            EndReason::Exhausted => "out of frames",
            EndReason::FrameLimit => "frame limit reached",
        }
    );
    println!("  Frames: {} ({:.1} fps)", summary.frames, fps);
    println!("  Score: {}-{}", summary.score.left, summary.score.right);
    if summary.game_over {
        println!("  Result: {}", pong_core::winner_text(&summary.score));
    } else {
        println!("  Result: game still in play");
    }
    println!("{}", "=".repeat(70));
}

fn assets_command(args: SpriteArgs) {
    let config = args.to_config();
    let loaded = load_sprites(&config.sprites);

    println!("🖼️  Sprites (asset dir: {})", config.sprites.asset_dir.display());
    for kind in SpriteKind::ALL {
        let (w, h) = loaded.sprites.dimensions(kind);
        let origin = loaded
            .origin(kind)
            .map(|o| o.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!("  {:<22} {:>4}x{:<4} {}", kind.to_string(), w, h, origin);
    }

    if !loaded.warnings.is_empty() {
        println!();
        for warning in &loaded.warnings {
            println!("⚠️  {}", warning);
        }
    }
    println!("{}", "=".repeat(70));
}
