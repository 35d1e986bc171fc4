//! A game session and the frame loop that drives it.
//!
//! [`Session`] is owned by whoever hosts the game (a CLI, a UI, a test) and
//! is lent to [`run_session`] for the length of one run. Nothing about a game
//! lives in global state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::imageops;
use pong_core::{GameState, Score};

use crate::camera::FrameSource;
use crate::config::validate_speed;
use crate::engine::RoundEngine;
use crate::error::Result;
use crate::sink::FrameSink;
use crate::tracker::HandTracker;

/// Cloneable stop flag, checked once per frame boundary.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Re-arms the signal for another run.
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Front-end controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Start,
    Stop,
    /// Fresh game at the current speed, and keep running
    Reset,
    /// Takes effect at the next start or reset, never mid-flight
    SetSpeed(i32),
}

#[derive(Debug, Clone)]
pub struct Session {
    state: GameState,
    speed: i32,
    running: bool,
}

impl Session {
    pub fn new(speed: i32) -> Result<Self> {
        validate_speed(speed)?;
        Ok(Self {
            state: GameState::new(speed),
            speed,
            running: false,
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn speed(&self) -> i32 {
        self.speed
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self) {
        self.state.reset(self.speed);
        self.running = true;
        tracing::info!("Game reset (speed {})", self.speed);
    }

    pub fn set_speed(&mut self, speed: i32) -> Result<()> {
        validate_speed(speed)?;
        self.speed = speed;
        Ok(())
    }

    pub fn apply(&mut self, control: Control) -> Result<()> {
        match control {
            Control::Start => self.start(),
            Control::Stop => self.stop(),
            Control::Reset => self.reset(),
            Control::SetSpeed(speed) => self.set_speed(speed)?,
        }
        Ok(())
    }
}

/// Why a run ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The session was not running when the run was requested
    NotRunning,
    Stopped,
    /// A finite frame source ran out
    Exhausted,
    FrameLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames: u64,
    pub score: Score,
    pub game_over: bool,
    pub reason: EndReason,
}

/// Runs frames until stopped, out of frames, at `max_frames`, or failed.
///
/// Takes the frame source by value: it is released when this returns, on
/// every path including errors. Starting a run points the ball at
/// `(+speed, +speed)` from wherever it is, as the front end's start button
/// always did.
pub fn run_session<S, T, K>(
    session: &mut Session,
    mut source: S,
    tracker: &mut T,
    engine: &RoundEngine,
    sink: &mut K,
    stop: &StopSignal,
    max_frames: Option<u64>,
) -> Result<SessionSummary>
where
    S: FrameSource,
    T: HandTracker + ?Sized,
    K: FrameSink + ?Sized,
{
    if !session.running {
        tracing::info!("Session not running; releasing {}", source.name());
        return Ok(summary(session, 0, EndReason::NotRunning));
    }

    let speed = session.speed;
    session.state.apply_speed(speed);
    tracing::info!("Session started on {} (speed {})", source.name(), speed);

    let mut frames = 0u64;
    let outcome = run_frames(
        session,
        &mut source,
        tracker,
        engine,
        sink,
        stop,
        max_frames,
        &mut frames,
    );

    match outcome {
        Ok(reason) => {
            let s = summary(session, frames, reason);
            tracing::info!(
                "Session ended ({:?}) after {} frames, score {}-{}",
                reason,
                frames,
                s.score.left,
                s.score.right
            );
            Ok(s)
        }
        Err(e) => {
            tracing::error!("Session aborted after {} frames: {}", frames, e);
            session.running = false;
            Err(e)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_frames<S, T, K>(
    session: &mut Session,
    source: &mut S,
    tracker: &mut T,
    engine: &RoundEngine,
    sink: &mut K,
    stop: &StopSignal,
    max_frames: Option<u64>,
    frames: &mut u64,
) -> Result<EndReason>
where
    S: FrameSource,
    T: HandTracker + ?Sized,
    K: FrameSink + ?Sized,
{
    loop {
        if stop.is_stopped() {
            session.running = false;
            return Ok(EndReason::Stopped);
        }
        if max_frames.is_some_and(|max| *frames >= max) {
            return Ok(EndReason::FrameLimit);
        }

        let Some(raw) = source.read_frame()? else {
            return Ok(EndReason::Exhausted);
        };

        // Mirror so moving a hand right moves it right on screen.
        let mirrored = imageops::flip_horizontal(&raw);
        let hands = tracker.detect(&mirrored)?;
        let frame = engine.render(&mut session.state, &mirrored, &hands)?;
        sink.present(*frames, &frame)?;
        *frames += 1;
    }
}

fn summary(session: &Session, frames: u64, reason: EndReason) -> SessionSummary {
    SessionSummary {
        frames,
        score: session.state.score,
        game_over: session.state.game_over,
        reason,
    }
}
