use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use pong_core::{
    final_score_text, step, winner_text, Arena, GameState, Hand, Layout, Side, Size,
    RESET_PROMPT,
};

use crate::assets::SpriteSet;
use crate::draw;
use crate::error::{Error, Result};

/// Share of the camera image in the blended play field; the rest is background
pub const CAMERA_WEIGHT: f32 = 0.2;

/// Font pixel size for the live scores
const SCORE_SCALE: i32 = 8;
/// Font pixel size for the game-over banner lines
const BANNER_SCALE: i32 = 4;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);

/// How fixed pixel offsets relate to the camera frame size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LayoutPolicy {
    /// Use the 1280x720 constants whatever the frame size
    #[default]
    Reference,
    /// Scale the constants to each frame's size
    ScaleToFrame,
}

impl LayoutPolicy {
    pub fn from_flag(scale_layout: bool) -> Self {
        if scale_layout {
            LayoutPolicy::ScaleToFrame
        } else {
            LayoutPolicy::Reference
        }
    }

    pub fn layout_for(&self, width: u32, height: u32) -> Layout {
        match self {
            LayoutPolicy::Reference => Layout::reference(),
            LayoutPolicy::ScaleToFrame => Layout::scaled(width as i32, height as i32),
        }
    }
}

/// Per-frame update: advances the game and composites the frame shown to the players.
///
/// The engine owns the sprites for a whole session. The game state is owned by
/// the caller and lent to every call.
pub struct RoundEngine {
    sprites: SpriteSet,
    policy: LayoutPolicy,
}

impl RoundEngine {
    pub fn new(sprites: SpriteSet, policy: LayoutPolicy) -> Self {
        Self { sprites, policy }
    }

    pub fn sprites(&self) -> &SpriteSet {
        &self.sprites
    }

    /// Collision geometry for a frame of the given size.
    pub fn arena(&self, width: u32, height: u32) -> Arena {
        let size = |(w, h): (u32, u32)| Size::new(w as i32, h as i32);
        Arena {
            width: width as i32,
            height: height as i32,
            paddle_left: size(self.sprites.paddle_left.dimensions()),
            paddle_right: size(self.sprites.paddle_right.dimensions()),
            ball: size(self.sprites.ball.dimensions()),
        }
    }

    /// Runs one frame.
    ///
    /// `mirrored` is the camera frame already flipped horizontally, the same
    /// frame the hands were detected in.
    pub fn render(
        &self,
        state: &mut GameState,
        mirrored: &RgbImage,
        hands: &[Hand],
    ) -> Result<RgbImage> {
        let (width, height) = mirrored.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::FrameRead("camera returned an empty frame".into()));
        }

        let layout = self.policy.layout_for(width, height);
        let arena = self.arena(width, height);

        let mut frame = draw::blend(mirrored, &self.sprites.background, CAMERA_WEIGHT);
        let report = step(state, hands, &arena, &layout);

        for paddle in &report.paddles {
            let sprite = match paddle.side {
                Side::Left => &self.sprites.paddle_left,
                Side::Right => &self.sprites.paddle_right,
            };
            draw::overlay_rgba(&mut frame, sprite, paddle.x, paddle.y);
            if paddle.hit {
                tracing::debug!(
                    "{:?} paddle hit at y={} (score {}-{})",
                    paddle.side,
                    paddle.y,
                    state.score.left,
                    state.score.right
                );
            }
        }

        if report.ended {
            tracing::info!(
                "Game over: {} ({})",
                winner_text(&state.score),
                final_score_text(&state.score)
            );
        }

        if state.game_over {
            self.draw_game_over(&mut frame, state, &layout);
        } else {
            if let Some((x, y)) = report.ball_origin {
                draw::paste(&mut frame, &self.sprites.ball, x, y);
            }
            draw::draw_text(
                &mut frame,
                &state.score.left.to_string(),
                layout.left_score_anchor,
                SCORE_SCALE,
                WHITE,
            );
            draw::draw_text(
                &mut frame,
                &state.score.right.to_string(),
                layout.right_score_anchor,
                SCORE_SCALE,
                WHITE,
            );
        }

        draw_preview(&mut frame, mirrored, &layout);
        Ok(frame)
    }

    fn draw_game_over(&self, frame: &mut RgbImage, state: &GameState, layout: &Layout) {
        let (width, height) = frame.dimensions();
        let screen = &self.sprites.game_over_background;
        let resized;
        let screen = if screen.width() > width || screen.height() > height {
            resized = draw::fit(screen, width, height);
            &resized
        } else {
            screen
        };
        draw::paste(frame, screen, 0, 0);

        draw::draw_text(
            frame,
            winner_text(&state.score),
            layout.winner_anchor,
            BANNER_SCALE,
            GREEN,
        );
        draw::draw_text(
            frame,
            &final_score_text(&state.score),
            layout.final_score_anchor,
            BANNER_SCALE,
            BLACK,
        );
        draw::draw_text(
            frame,
            RESET_PROMPT,
            layout.reset_prompt_anchor,
            BANNER_SCALE,
            RED,
        );
    }
}

// Small unmirrored camera view in the bottom-left corner, drawn in every phase.
fn draw_preview(frame: &mut RgbImage, mirrored: &RgbImage, layout: &Layout) {
    let (pw, ph) = layout.pip_size;
    if pw <= 0 || ph <= 0 {
        return;
    }
    let raw = imageops::flip_horizontal(mirrored);
    let thumb = imageops::resize(&raw, pw as u32, ph as u32, FilterType::Triangle);
    let (x, y) = layout.pip_origin;
    draw::paste(frame, &thumb, x, y);
}
