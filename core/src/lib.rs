#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod constants;
pub mod physics;

use alloc::format;
use alloc::string::String;
use serde::{Deserialize, Serialize};

pub use constants::Layout;
pub use physics::{
    advance_ball, apply_paddle_hits, ball_draw_origin, check_exit, paddle_top, paddle_x, step,
    PaddlePlacement, StepReport,
};

/// Which paddle a detected hand drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// Axis-aligned rectangle reported by the hand tracker, in frame pixels.
///
/// Serialized as `[x, y, w, h]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Saturates instead of overflowing on out-of-frame boxes.
    pub fn center_y(&self) -> i32 {
        self.y.saturating_add(self.h / 2)
    }
}

impl From<[i32; 4]> for BoundingBox {
    fn from([x, y, w, h]: [i32; 4]) -> Self {
        Self { x, y, w, h }
    }
}

impl From<BoundingBox> for [i32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x, b.y, b.w, b.h]
    }
}

/// One hand seen in one frame. Consumed and dropped every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    pub bbox: BoundingBox,
    #[serde(rename = "type")]
    pub side: Side,
}

impl Hand {
    pub fn new(side: Side, bbox: BoundingBox) -> Self {
        Self { bbox, side }
    }
}

/// Width and height of a sprite or frame, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub w: i32,
    pub h: i32,
}

impl Size {
    pub fn new(w: i32, h: i32) -> Self {
        Self { w, h }
    }
}

/// Everything about the play field the rules need to know: the frame size and
/// the sprite sizes that become collision rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arena {
    pub width: i32,
    pub height: i32,
    pub paddle_left: Size,
    pub paddle_right: Size,
    pub ball: Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub left: u32,
    pub right: u32,
}

impl Score {
    pub fn total(&self) -> u32 {
        self.left + self.right
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Active,
    GameOver,
}

/// The only mutable core of a game: ball, scores and the game-over latch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub ball: Ball,
    pub score: Score,
    pub game_over: bool,
}

impl GameState {
    /// Fresh game: ball at the reference start point, moving down-right at `speed`.
    pub fn new(speed: i32) -> Self {
        Self {
            ball: Ball {
                x: constants::START_X,
                y: constants::START_Y,
                vx: speed as f32,
                vy: speed as f32,
            },
            score: Score::default(),
            game_over: false,
        }
    }

    /// Restores exactly the state `new(speed)` produces.
    pub fn reset(&mut self, speed: i32) {
        *self = Self::new(speed);
    }

    /// Points the velocity at `(+speed, +speed)` without moving the ball.
    pub fn apply_speed(&mut self, speed: i32) {
        self.ball.vx = speed as f32;
        self.ball.vy = speed as f32;
    }

    pub fn phase(&self) -> Phase {
        if self.game_over {
            Phase::GameOver
        } else {
            Phase::Active
        }
    }
}

pub fn winner_text(score: &Score) -> &'static str {
    if score.left > score.right {
        "Player 1 Wins!"
    } else if score.right > score.left {
        "Player 2 Wins!"
    } else {
        "It's a Draw!"
    }
}

pub fn final_score_text(score: &Score) -> String {
    format!("Final Score: {} - {}", score.left, score.right)
}

pub const RESET_PROMPT: &str = "Press Reset to Play Again";
