// Pixel constants of the play field.
// All of them are tuned for a 1280x720 camera frame.

/// Reference frame width (pixels)
pub const REFERENCE_WIDTH: i32 = 1280;

/// Reference frame height (pixels)
pub const REFERENCE_HEIGHT: i32 = 720;

/// Paddle distance from the left/right frame edge (pixels)
pub const PADDLE_MARGIN_X: i32 = 59;

/// Minimum gap between a paddle and the top/bottom frame edge (pixels)
pub const PADDLE_MARGIN_Y: i32 = 20;

/// Horizontal push applied to the ball after a paddle hit (pixels)
pub const HIT_NUDGE: i32 = 30;

/// Ball x closer than this to a side edge ends the game (pixels)
pub const EXIT_MARGIN: i32 = 40;

/// Ball y within this distance of the top/bottom edge bounces (pixels)
pub const WALL_MARGIN: i32 = 10;

/// Ball start position. Not scaled with the layout: reset always returns here.
pub const START_X: f32 = 100.0;
pub const START_Y: f32 = 100.0;

/// Default ball speed per axis (pixels/frame)
pub const DEFAULT_SPEED: i32 = 15;

/// Accepted ball speed range (pixels/frame)
pub const MIN_SPEED: i32 = 5;
pub const MAX_SPEED: i32 = 25;

/// Bottom-left anchors of the live score text
pub const LEFT_SCORE_ANCHOR: (i32, i32) = (300, 650);
pub const RIGHT_SCORE_ANCHOR: (i32, i32) = (900, 650);

/// Bottom-left anchors of the game-over text
pub const WINNER_ANCHOR: (i32, i32) = (400, 350);
pub const FINAL_SCORE_ANCHOR: (i32, i32) = (420, 450);
pub const RESET_PROMPT_ANCHOR: (i32, i32) = (400, 550);

/// Picture-in-picture camera preview: top-left corner and size
pub const PIP_ORIGIN: (i32, i32) = (20, 580);
pub const PIP_SIZE: (i32, i32) = (213, 120);

/// Every fixed offset the rules and the compositor use.
///
/// [`Layout::reference`] is the 1280x720 set. [`Layout::scaled`] re-expresses
/// the same proportions for another frame size: horizontal values follow the
/// width ratio, vertical values the height ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub paddle_margin_x: i32,
    pub paddle_margin_y: i32,
    pub hit_nudge: i32,
    pub exit_margin: i32,
    pub wall_margin: i32,
    pub left_score_anchor: (i32, i32),
    pub right_score_anchor: (i32, i32),
    pub winner_anchor: (i32, i32),
    pub final_score_anchor: (i32, i32),
    pub reset_prompt_anchor: (i32, i32),
    pub pip_origin: (i32, i32),
    pub pip_size: (i32, i32),
}

impl Layout {
    pub fn reference() -> Self {
        Self {
            paddle_margin_x: PADDLE_MARGIN_X,
            paddle_margin_y: PADDLE_MARGIN_Y,
            hit_nudge: HIT_NUDGE,
            exit_margin: EXIT_MARGIN,
            wall_margin: WALL_MARGIN,
            left_score_anchor: LEFT_SCORE_ANCHOR,
            right_score_anchor: RIGHT_SCORE_ANCHOR,
            winner_anchor: WINNER_ANCHOR,
            final_score_anchor: FINAL_SCORE_ANCHOR,
            reset_prompt_anchor: RESET_PROMPT_ANCHOR,
            pip_origin: PIP_ORIGIN,
            pip_size: PIP_SIZE,
        }
    }

    pub fn scaled(width: i32, height: i32) -> Self {
        let r = Self::reference();
        if width <= 0 || height <= 0 {
            return r;
        }
        let sx = |v: i32| scale(v, width, REFERENCE_WIDTH);
        let sy = |v: i32| scale(v, height, REFERENCE_HEIGHT);
        let point = |(x, y): (i32, i32)| (sx(x), sy(y));
        Self {
            paddle_margin_x: sx(r.paddle_margin_x),
            paddle_margin_y: sy(r.paddle_margin_y),
            hit_nudge: sx(r.hit_nudge),
            exit_margin: sx(r.exit_margin),
            wall_margin: sy(r.wall_margin),
            left_score_anchor: point(r.left_score_anchor),
            right_score_anchor: point(r.right_score_anchor),
            winner_anchor: point(r.winner_anchor),
            final_score_anchor: point(r.final_score_anchor),
            reset_prompt_anchor: point(r.reset_prompt_anchor),
            pip_origin: point(r.pip_origin),
            pip_size: point(r.pip_size),
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::reference()
    }
}

// Integer scaling rounded to nearest: v * num / den
#[inline]
fn scale(v: i32, num: i32, den: i32) -> i32 {
    let n = v as i64 * num as i64;
    let d = den as i64;
    ((n + d / 2) / d) as i32
}
