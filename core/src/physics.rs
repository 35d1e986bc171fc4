use alloc::vec::Vec;

use crate::constants::Layout;
use crate::{Arena, GameState, Hand, Side};

/// Where a paddle was drawn this frame and whether the ball was inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaddlePlacement {
    pub side: Side,
    pub x: i32,
    pub y: i32,
    pub hit: bool,
}

/// Outcome of one frame of rules, consumed by the compositor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    pub paddles: Vec<PaddlePlacement>,
    /// True only on the frame that flipped `game_over`.
    pub ended: bool,
    /// Top-left corner of the ball sprite, when it fits inside the frame.
    pub ball_origin: Option<(i32, i32)>,
}

impl StepReport {
    pub fn hits(&self) -> usize {
        self.paddles.iter().filter(|p| p.hit).count()
    }
}

// Clip like numpy: lower bound first, then upper, so crossed bounds yield `hi`.
#[inline]
fn clip(v: i32, lo: i32, hi: i32) -> i32 {
    v.max(lo).min(hi)
}

/// Top edge of a paddle centred on the hand, kept `paddle_margin_y` away from
/// the frame's top and bottom.
#[inline]
pub fn paddle_top(hand: &Hand, paddle_h: i32, frame_h: i32, layout: &Layout) -> i32 {
    let y = hand.bbox.center_y().saturating_sub(paddle_h / 2);
    clip(
        y,
        layout.paddle_margin_y,
        frame_h - paddle_h - layout.paddle_margin_y,
    )
}

/// Left edge of a paddle: a fixed margin in from its own side of the frame.
#[inline]
pub fn paddle_x(side: Side, paddle_w: i32, frame_w: i32, layout: &Layout) -> i32 {
    match side {
        Side::Left => layout.paddle_margin_x,
        Side::Right => frame_w - paddle_w - layout.paddle_margin_x,
    }
}

/// Places one paddle per hand and bounces the ball off every paddle it is
/// inside. Hits are not exclusive: two hands covering the ball in the same
/// frame both flip `vx`, both nudge and both score.
pub fn apply_paddle_hits(
    state: &mut GameState,
    hands: &[Hand],
    arena: &Arena,
    layout: &Layout,
) -> Vec<PaddlePlacement> {
    let mut placements = Vec::with_capacity(hands.len());

    for hand in hands {
        let size = match hand.side {
            Side::Left => arena.paddle_left,
            Side::Right => arena.paddle_right,
        };
        let x = paddle_x(hand.side, size.w, arena.width, layout);
        let y = paddle_top(hand, size.h, arena.height, layout);

        let b = &state.ball;
        let inside = (x as f32) < b.x
            && b.x < (x + size.w) as f32
            && (y as f32) < b.y
            && b.y < (y + size.h) as f32;

        if inside {
            let ball = &mut state.ball;
            ball.vx = -ball.vx;
            match hand.side {
                Side::Left => {
                    ball.x += layout.hit_nudge as f32;
                    state.score.left += 1;
                }
                Side::Right => {
                    ball.x -= layout.hit_nudge as f32;
                    state.score.right += 1;
                }
            }
        }

        placements.push(PaddlePlacement {
            side: hand.side,
            x,
            y,
            hit: inside,
        });
    }

    placements
}

/// Latches `game_over` once the ball leaves the horizontal play band.
/// Returns true only when this call made the transition.
#[inline]
pub fn check_exit(state: &mut GameState, arena: &Arena, layout: &Layout) -> bool {
    if state.game_over {
        return false;
    }
    let x = state.ball.x;
    let lo = layout.exit_margin as f32;
    let hi = (arena.width - layout.exit_margin) as f32;
    if x < lo || x > hi {
        state.game_over = true;
        return true;
    }
    false
}

/// Wall bounce, then move. The bounce looks at the position before the move.
#[inline]
pub fn advance_ball(state: &mut GameState, arena: &Arena, layout: &Layout) {
    let ball = &mut state.ball;
    let top = layout.wall_margin as f32;
    let bottom = (arena.height - layout.wall_margin) as f32;
    if ball.y >= bottom || ball.y <= top {
        ball.vy = -ball.vy;
    }
    ball.x += ball.vx;
    ball.y += ball.vy;
}

/// Top-left corner for drawing the ball sprite centred on the ball, or `None`
/// when the sprite would not fit in the frame. Purely a drawing guard.
#[inline]
pub fn ball_draw_origin(state: &GameState, arena: &Arena) -> Option<(i32, i32)> {
    let bw = arena.ball.w;
    let bh = arena.ball.h;
    let x1 = (state.ball.x - (bw / 2) as f32) as i32;
    let y1 = (state.ball.y - (bh / 2) as f32) as i32;
    let fits_x = 0 <= x1 && x1 < arena.width - bw;
    let fits_y = 0 <= y1 && y1 < arena.height - bh;
    if fits_x && fits_y {
        Some((x1, y1))
    } else {
        None
    }
}

/// One frame of rules.
///
/// While active: paddles and hits, then the exit check, then (if still active)
/// the wall bounce and move. Once `game_over` is latched nothing moves and
/// hands are ignored until the state is reset.
pub fn step(state: &mut GameState, hands: &[Hand], arena: &Arena, layout: &Layout) -> StepReport {
    if state.game_over {
        return StepReport::default();
    }

    let paddles = apply_paddle_hits(state, hands, arena, layout);
    let ended = check_exit(state, arena, layout);

    let ball_origin = if state.game_over {
        None
    } else {
        advance_ball(state, arena, layout);
        ball_draw_origin(state, arena)
    };

    StepReport {
        paddles,
        ended,
        ball_origin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoundingBox, Size};

    fn arena() -> Arena {
        Arena {
            width: 1280,
            height: 720,
            paddle_left: Size::new(30, 150),
            paddle_right: Size::new(30, 150),
            ball: Size::new(50, 50),
        }
    }

    #[test]
    fn clip_prefers_upper_bound_when_crossed() {
        assert_eq!(clip(5, 20, 10), 10);
        assert_eq!(clip(50, 20, 100), 50);
        assert_eq!(clip(-3, 20, 100), 20);
    }

    #[test]
    fn paddle_top_is_clamped_to_margins() {
        let layout = Layout::reference();
        let high = Hand::new(Side::Left, BoundingBox::new(0, -200, 80, 80));
        let low = Hand::new(Side::Left, BoundingBox::new(0, 900, 80, 80));
        assert_eq!(paddle_top(&high, 150, 720, &layout), 20);
        assert_eq!(paddle_top(&low, 150, 720, &layout), 720 - 150 - 20);
    }

    #[test]
    fn right_paddle_sits_margin_from_right_edge() {
        let a = arena();
        let layout = Layout::reference();
        assert_eq!(paddle_x(Side::Right, 30, a.width, &layout), 1280 - 30 - 59);
        assert_eq!(paddle_x(Side::Left, 30, a.width, &layout), 59);
    }

    #[test]
    fn ball_origin_none_when_sprite_leaves_frame() {
        let a = arena();
        let mut s = GameState::new(15);
        s.ball.x = 10.0;
        assert_eq!(ball_draw_origin(&s, &a), None);
        s.ball.x = 640.0;
        s.ball.y = 360.0;
        assert_eq!(ball_draw_origin(&s, &a), Some((615, 335)));
    }
}
