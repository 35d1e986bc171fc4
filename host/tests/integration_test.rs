// End-to-end tests: round engine compositing and the session frame loop,
// driven by in-memory cameras and scripted hands.
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use handpong::{
    run_session, Control, DiscardFrames, EndReason, Error, FrameSink, FrameSource, HandScript,
    HandTracker, LayoutPolicy, NoHands, PngSequence, RoundEngine, ScriptedTracker, Session,
    SpriteSet, StopSignal,
};
use image::{Rgb, RgbImage};
use pong_core::{BoundingBox, GameState, Hand, Score, Side};

const CAMERA: Rgb<u8> = Rgb([10, 20, 30]);
// 0.2 * camera + 0.8 * placeholder gray (100)
const BLENDED: Rgb<u8> = Rgb([82, 84, 86]);
const GRAY: Rgb<u8> = Rgb([100, 100, 100]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);
const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
const GREEN: Rgb<u8> = Rgb([0, 255, 0]);

fn camera_frame(w: u32, h: u32) -> RgbImage {
    RgbImage::from_pixel(w, h, CAMERA)
}

fn engine() -> RoundEngine {
    RoundEngine::new(SpriteSet::placeholders(), LayoutPolicy::Reference)
}

fn assert_close(actual: &Rgb<u8>, expected: Rgb<u8>, what: &str) {
    for i in 0..3 {
        let d = (actual[i] as i32 - expected[i] as i32).abs();
        assert!(d <= 1, "{}: expected {:?}, got {:?}", what, expected, actual);
    }
}

/// In-memory camera that records when it is released.
struct TestCamera {
    frames: VecDeque<RgbImage>,
    fail_after: Option<usize>,
    read: usize,
    released: Arc<AtomicBool>,
}

impl TestCamera {
    fn new(count: usize, w: u32, h: u32) -> (Self, Arc<AtomicBool>) {
        let released = Arc::new(AtomicBool::new(false));
        let camera = Self {
            frames: (0..count).map(|_| camera_frame(w, h)).collect(),
            fail_after: None,
            read: 0,
            released: Arc::clone(&released),
        };
        (camera, released)
    }
}

impl FrameSource for TestCamera {
    fn name(&self) -> &str {
        "test camera"
    }

    fn read_frame(&mut self) -> handpong::Result<Option<RgbImage>> {
        if self.fail_after == Some(self.read) {
            return Err(Error::FrameRead("device unplugged".into()));
        }
        self.read += 1;
        Ok(self.frames.pop_front())
    }
}

impl Drop for TestCamera {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Counts frames handed to the sink.
#[derive(Default)]
struct CountingSink {
    frames: Vec<(u32, u32)>,
}

impl FrameSink for CountingSink {
    fn present(&mut self, _index: u64, frame: &RgbImage) -> handpong::Result<()> {
        self.frames.push(frame.dimensions());
        Ok(())
    }
}

#[test]
fn test_active_frame_composites_ball_scores_and_preview() {
    let engine = engine();
    let mut state = GameState::new(15);
    state.ball.x = 640.0;
    state.ball.y = 360.0;

    let frame = engine
        .render(&mut state, &camera_frame(1280, 720), &[])
        .expect("render should succeed");

    assert_eq!(frame.dimensions(), (1280, 720));
    assert_eq!(state.ball.x, 655.0);
    assert_eq!(state.ball.y, 375.0);

    // Background blend away from everything else
    assert_close(frame.get_pixel(640, 100), BLENDED, "blended field");
    // Ball sprite centred on the new position: red disc centre
    assert_eq!(*frame.get_pixel(655, 375), RED);
    // Top row of the left "0" score glyph (anchor 300,650, scale 8)
    assert_eq!(*frame.get_pixel(310, 588), WHITE);
    // Picture-in-picture shows the raw camera
    assert_close(frame.get_pixel(100, 650), CAMERA, "camera preview");
}

#[test]
fn test_left_hand_hits_ball_through_engine() {
    let engine = engine();
    let mut state = GameState::new(15);
    state.ball.x = 80.0;
    state.ball.y = 300.0;
    state.ball.vx = -15.0;
    state.ball.vy = 0.0;
    let hands = [Hand::new(Side::Left, BoundingBox::new(400, 260, 80, 80))];

    let frame = engine
        .render(&mut state, &camera_frame(1280, 720), &hands)
        .unwrap();

    assert_eq!(state.score, Score { left: 1, right: 0 });
    assert_eq!(state.ball.vx, 15.0);
    assert_eq!(state.ball.x, 125.0);
    // Placeholder left paddle is blue, drawn at x=59, y=300-75
    assert_eq!(*frame.get_pixel(64, 230), BLUE);
    assert!(!state.game_over);
}

#[test]
fn test_right_paddle_drawn_at_right_margin() {
    let engine = engine();
    let mut state = GameState::new(15);
    state.ball.x = 640.0;
    state.ball.y = 360.0;
    let hands = [Hand::new(Side::Right, BoundingBox::new(100, 400, 60, 60))];

    let frame = engine
        .render(&mut state, &camera_frame(1280, 720), &hands)
        .unwrap();

    // x = 1280 - 30 - 59 = 1191, y = 430 - 75 = 355
    assert_eq!(*frame.get_pixel(1195, 360), GREEN);
    assert_close(frame.get_pixel(1185, 360), BLENDED, "left of right paddle");
    assert_eq!(state.score, Score::default());
}

#[test]
fn test_game_over_screen_replaces_field() {
    let engine = engine();
    let mut state = GameState::new(15);
    state.ball.x = 5.0;
    state.ball.y = 360.0;
    state.score = Score { left: 6, right: 6 };

    let frame = engine
        .render(&mut state, &camera_frame(1280, 720), &[])
        .unwrap();

    assert!(state.game_over);
    assert_eq!(state.ball.x, 5.0, "Ball frozen once the game is over");
    assert_eq!(*frame.get_pixel(640, 100), GRAY, "Game-over background is pasted opaque");

    // Winner line is green text just above y=350
    let green_in_winner_band = (318..350)
        .flat_map(|y| (400..900).map(move |x| (x, y)))
        .filter(|&(x, y)| *frame.get_pixel(x, y) == GREEN)
        .count();
    assert!(green_in_winner_band > 0, "Winner text should be drawn");

    // Prompt is red above y=550
    let red_in_prompt_band = (518..550)
        .flat_map(|y| (400..1280).map(move |x| (x, y)))
        .filter(|&(x, y)| *frame.get_pixel(x, y) == RED)
        .count();
    assert!(red_in_prompt_band > 0, "Reset prompt should be drawn");

    assert_close(frame.get_pixel(100, 650), CAMERA, "preview on game-over screen");
}

#[test]
fn test_game_over_frames_stay_frozen() {
    let engine = engine();
    let mut state = GameState::new(15);
    state.ball.x = 1270.0;
    let hands = [
        Hand::new(Side::Left, BoundingBox::new(0, 300, 80, 80)),
        Hand::new(Side::Right, BoundingBox::new(0, 300, 80, 80)),
    ];
    engine.render(&mut state, &camera_frame(1280, 720), &hands).unwrap();
    let frozen = state;

    for _ in 0..5 {
        engine.render(&mut state, &camera_frame(1280, 720), &hands).unwrap();
    }
    assert_eq!(state, frozen);
}

#[test]
fn test_preview_is_unmirrored() {
    let engine = engine();
    let mut state = GameState::new(15);
    state.ball.x = 640.0;
    state.ball.y = 360.0;

    // The engine receives the mirrored frame: marker on the right half.
    let mut mirrored = camera_frame(1280, 720);
    for y in 0..720 {
        for x in 640..1280 {
            mirrored.put_pixel(x, y, WHITE);
        }
    }
    let frame = engine.render(&mut state, &mirrored, &[]).unwrap();

    // Preview spans x 20..233; the raw camera had the marker on its left half.
    assert_close(frame.get_pixel(40, 640), WHITE, "preview left half");
    assert_close(frame.get_pixel(210, 640), CAMERA, "preview right half");
}

#[test]
fn test_small_frames_with_reference_and_scaled_layouts() {
    let mut state = GameState::new(5);
    state.ball.x = 200.0;
    state.ball.y = 150.0;
    let small = camera_frame(640, 360);

    let reference = engine();
    let frame = reference.render(&mut state.clone(), &small, &[]).unwrap();
    assert_eq!(frame.dimensions(), (640, 360));

    let scaled = RoundEngine::new(SpriteSet::placeholders(), LayoutPolicy::ScaleToFrame);
    let frame = scaled.render(&mut state, &small, &[]).unwrap();
    // Scaled preview sits at (10, 290), 107x60
    assert_close(frame.get_pixel(50, 320), CAMERA, "scaled preview");
}

#[test]
fn test_empty_frame_is_a_read_error() {
    let engine = engine();
    let mut state = GameState::new(15);
    let result = engine.render(&mut state, &RgbImage::new(0, 0), &[]);
    assert!(matches!(result, Err(Error::FrameRead(_))));
}

#[test]
fn test_session_runs_until_source_exhausted_and_releases_it() {
    let engine = engine();
    let (camera, released) = TestCamera::new(4, 320, 180);
    let mut session = Session::new(15).unwrap();
    session.start();
    let mut sink = CountingSink::default();

    let summary = run_session(
        &mut session,
        camera,
        &mut NoHands,
        &engine,
        &mut sink,
        &StopSignal::new(),
        None,
    )
    .unwrap();

    assert_eq!(summary.reason, EndReason::Exhausted);
    assert_eq!(summary.frames, 4);
    assert_eq!(sink.frames, vec![(320, 180); 4]);
    assert!(released.load(Ordering::SeqCst), "Camera must be released");
    assert!(session.is_running());
}

#[test]
fn test_session_not_running_does_nothing() {
    let engine = engine();
    let (camera, released) = TestCamera::new(3, 320, 180);
    let mut session = Session::new(15).unwrap();
    let mut sink = DiscardFrames::default();

    let summary = run_session(
        &mut session,
        camera,
        &mut NoHands,
        &engine,
        &mut sink,
        &StopSignal::new(),
        None,
    )
    .unwrap();

    assert_eq!(summary.reason, EndReason::NotRunning);
    assert_eq!(sink.presented, 0);
    assert!(released.load(Ordering::SeqCst));
}

#[test]
fn test_read_failure_aborts_and_releases_camera() {
    let engine = engine();
    let (mut camera, released) = TestCamera::new(10, 320, 180);
    camera.fail_after = Some(3);
    let mut session = Session::new(15).unwrap();
    session.start();
    let mut sink = CountingSink::default();

    let result = run_session(
        &mut session,
        camera,
        &mut NoHands,
        &engine,
        &mut sink,
        &StopSignal::new(),
        None,
    );

    match result {
        Err(e) => assert!(e.is_camera_failure(), "unexpected error: {}", e),
        Ok(s) => panic!("expected a read failure, got {:?}", s),
    }
    assert_eq!(sink.frames.len(), 3);
    assert!(released.load(Ordering::SeqCst), "Camera must be released on error");
    assert!(!session.is_running());
}

#[test]
fn test_stop_signal_ends_session_at_frame_boundary() {
    let engine = engine();
    let (camera, released) = TestCamera::new(10, 320, 180);
    let mut session = Session::new(15).unwrap();
    session.start();
    let stop = StopSignal::new();
    stop.stop();

    let summary = run_session(
        &mut session,
        camera,
        &mut NoHands,
        &engine,
        &mut DiscardFrames::default(),
        &stop,
        None,
    )
    .unwrap();

    assert_eq!(summary.reason, EndReason::Stopped);
    assert_eq!(summary.frames, 0);
    assert!(released.load(Ordering::SeqCst));
    assert!(!session.is_running());

    stop.clear();
    assert!(!stop.is_stopped());
}

/// Raises the stop signal once enough frames have been presented.
struct StopAfter {
    stop: StopSignal,
    after: usize,
    presented: usize,
}

impl FrameSink for StopAfter {
    fn present(&mut self, _index: u64, _frame: &RgbImage) -> handpong::Result<()> {
        self.presented += 1;
        if self.presented == self.after {
            self.stop.stop();
        }
        Ok(())
    }
}

#[test]
fn test_stop_raised_mid_run_ends_at_next_boundary() {
    let engine = engine();
    let (camera, released) = TestCamera::new(10, 320, 180);
    let mut session = Session::new(15).unwrap();
    session.start();
    let stop = StopSignal::new();
    let mut sink = StopAfter {
        stop: stop.clone(),
        after: 2,
        presented: 0,
    };

    let summary = run_session(
        &mut session,
        camera,
        &mut NoHands,
        &engine,
        &mut sink,
        &stop,
        None,
    )
    .unwrap();

    assert_eq!(summary.reason, EndReason::Stopped);
    assert_eq!(summary.frames, 2, "Frame in flight completes before stopping");
    assert!(released.load(Ordering::SeqCst), "Camera must be released on stop");
    assert!(!session.is_running());
}

#[test]
fn test_frame_limit() {
    let engine = engine();
    let (camera, _) = TestCamera::new(10, 320, 180);
    let mut session = Session::new(15).unwrap();
    session.start();

    let summary = run_session(
        &mut session,
        camera,
        &mut NoHands,
        &engine,
        &mut DiscardFrames::default(),
        &StopSignal::new(),
        Some(2),
    )
    .unwrap();

    assert_eq!(summary.reason, EndReason::FrameLimit);
    assert_eq!(summary.frames, 2);
}

#[test]
fn test_start_reapplies_configured_speed() {
    let engine = engine();
    let mut session = Session::new(10).unwrap();
    session.state_mut().ball.vx = -10.0;
    session.state_mut().ball.vy = -10.0;
    session.state_mut().ball.x = 500.0;
    session.start();

    let (camera, _) = TestCamera::new(0, 320, 180);
    run_session(
        &mut session,
        camera,
        &mut NoHands,
        &engine,
        &mut DiscardFrames::default(),
        &StopSignal::new(),
        None,
    )
    .unwrap();

    assert_eq!(session.state().ball.vx, 10.0);
    assert_eq!(session.state().ball.vy, 10.0);
    assert_eq!(session.state().ball.x, 500.0, "Start keeps the ball where it is");
}

#[test]
fn test_unattended_game_ends_and_reset_restores_play() {
    let engine = engine();
    let (camera, _) = TestCamera::new(40, 320, 180);
    let mut session = Session::new(15).unwrap();
    session.start();

    // 320px wide: ball leaves the [40, 280] band within a dozen frames.
    let summary = run_session(
        &mut session,
        camera,
        &mut NoHands,
        &engine,
        &mut DiscardFrames::default(),
        &StopSignal::new(),
        None,
    )
    .unwrap();

    assert!(summary.game_over);
    assert_eq!(summary.score, Score::default());
    assert_eq!(summary.frames, 40, "Game-over frames keep rendering");

    session.apply(Control::SetSpeed(20)).unwrap();
    assert!(session.state().game_over, "Speed change alone does not reset");
    session.apply(Control::Reset).unwrap();

    assert!(session.is_running());
    assert_eq!(*session.state(), GameState::new(20));
}

#[test]
fn test_invalid_speed_rejected() {
    assert!(matches!(Session::new(3), Err(Error::Config(_))));
    let mut session = Session::new(15).unwrap();
    assert!(session.apply(Control::SetSpeed(40)).is_err());
    assert_eq!(session.speed(), 15);
    session.apply(Control::Stop).unwrap();
    assert!(!session.is_running());
}

/// Checks every detected frame is mirrored.
struct MirrorCheck {
    calls: usize,
}

impl HandTracker for MirrorCheck {
    fn detect(&mut self, frame: &RgbImage) -> handpong::Result<Vec<Hand>> {
        self.calls += 1;
        let (w, _) = frame.dimensions();
        assert_eq!(*frame.get_pixel(w - 1, 0), RED, "tracker must see the mirrored frame");
        Ok(Vec::new())
    }
}

#[test]
fn test_tracker_sees_mirrored_frame() {
    let engine = engine();
    let (mut camera, _) = TestCamera::new(0, 320, 180);
    let mut raw = camera_frame(320, 180);
    raw.put_pixel(0, 0, RED);
    camera.frames.push_back(raw);
    let mut session = Session::new(15).unwrap();
    session.start();
    let mut tracker = MirrorCheck { calls: 0 };

    run_session(
        &mut session,
        camera,
        &mut tracker,
        &engine,
        &mut DiscardFrames::default(),
        &StopSignal::new(),
        None,
    )
    .unwrap();

    assert_eq!(tracker.calls, 1);
}

#[test]
fn test_scripted_rally_scores_both_sides() {
    let engine = engine();
    let mut session = Session::new(15).unwrap();
    session.state_mut().ball.y = 300.0;
    session.start();

    let left = Hand::new(Side::Left, BoundingBox::new(0, 260, 80, 80));
    let right = Hand::new(Side::Right, BoundingBox::new(0, 260, 80, 80));
    let mut tracker = ScriptedTracker::new(HandScript {
        frames: vec![vec![left, right]],
        repeat_last: true,
    });

    // One frame through the session, then keep the ball on y=300 so the
    // fixed paddles can return it forever.
    let (camera, _) = TestCamera::new(1, 1280, 720);
    run_session(
        &mut session,
        camera,
        &mut tracker,
        &engine,
        &mut DiscardFrames::default(),
        &StopSignal::new(),
        None,
    )
    .unwrap();
    session.state_mut().ball.vy = 0.0;
    session.state_mut().ball.y = 300.0;

    let mut state = *session.state();
    let mut previous = state.score.total();
    for _ in 0..300 {
        engine
            .render(&mut state, &camera_frame(1280, 720), &[left, right])
            .unwrap();
        assert!(state.score.total() >= previous);
        assert!(state.score.total() - previous <= 2);
        previous = state.score.total();
    }

    assert!(!state.game_over, "Paddles in the ball's path keep the rally going");
    assert!(state.score.left >= 1 && state.score.right >= 1);
}

#[test]
fn test_png_sequence_writes_numbered_frames() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = PngSequence::create(dir.path().join("out")).unwrap();
    let frame = camera_frame(16, 9);

    sink.present(0, &frame).unwrap();
    sink.present(1, &frame).unwrap();

    assert_eq!(sink.written(), 2);
    assert!(sink.frame_path(0).exists());
    assert!(sink.frame_path(1).ends_with("frame_000001.png"));
    let back = image::open(sink.frame_path(1)).unwrap().into_rgb8();
    assert_eq!(back.dimensions(), (16, 9));
}
