mod common;

use glam::Vec3;

use common::ScriptedHost;
use sss_gems::{run, AppState, DemoConfig, InitError, InputEvent, Key, RunError, Stage};

fn setup() -> (DemoConfig, AppState) {
    let config = DemoConfig::default();
    let state = AppState::new(&config);
    (config, state)
}

#[test]
fn init_failure_never_enters_frame_loop() {
    let (config, mut state) = setup();
    let mut host = ScriptedHost::new(vec![vec![]; 3]);
    host.init_error = Some(InitError::from_error("window", "no display"));

    let err = run(&mut host, &mut state, &config).unwrap_err();

    assert!(matches!(err, RunError::Init(InitError::Platform { stage: "window", .. })));
    assert_eq!(host.polls, 0);
    assert!(host.submitted.is_empty());
}

#[test]
fn escape_ends_loop_after_current_frame() {
    let (config, mut state) = setup();
    let mut host = ScriptedHost::new(vec![
        vec![],
        vec![],
        vec![InputEvent::KeyPressed(Key::Escape)],
        vec![],
    ]);

    let report = run(&mut host, &mut state, &config).unwrap();

    assert_eq!(report.frames, 3);
    assert_eq!(report.stage, Stage::Shutdown);
    assert_eq!(host.submitted.len(), 3);
    assert!(host.shut_down);
}

#[test]
fn close_request_shuts_down() {
    let (config, mut state) = setup();
    let mut host = ScriptedHost::new(vec![vec![InputEvent::CloseRequested]]);

    let report = run(&mut host, &mut state, &config).unwrap();

    assert_eq!(report.frames, 1);
    assert!(host.shut_down);
}

#[test]
fn held_forward_key_moves_light_by_elapsed_time() {
    let (config, mut state) = setup();
    let start = state.light.position();
    let mut host = ScriptedHost::new(vec![
        vec![InputEvent::KeyPressed(Key::W)],
        vec![],
        vec![],
        vec![InputEvent::KeyReleased(Key::W)],
        vec![],
    ]);
    host.frame_time = 0.25;

    run(&mut host, &mut state, &config).unwrap();

    // Held for the first three frames, 0.25 s each.
    let expected = start + Vec3::NEG_Z * (3.0 * 0.25 * state.light.speed());
    assert!((state.light.position() - expected).length() < 1e-4);
    assert!((state.timing.delta_time() - 0.25).abs() < 1e-5);
}

#[test]
fn mouse_motion_reaches_camera_in_same_frame() {
    let (config, mut state) = setup();
    let mut host = ScriptedHost::new(vec![
        vec![InputEvent::CursorMoved { x: 960.0, y: 540.0 }],
        vec![InputEvent::CursorMoved { x: 1060.0, y: 540.0 }],
    ]);

    run(&mut host, &mut state, &config).unwrap();

    assert!((state.camera.yaw() - (-80.0)).abs() < 1e-4);
    let first_view = host.submitted[0].commands.clone();
    let second_view = host.submitted[1].commands.clone();
    assert_ne!(first_view, second_view);
}

#[test]
fn frame_failure_stops_loop() {
    let (config, mut state) = setup();
    let mut host = ScriptedHost::new(vec![vec![]; 10]);
    host.fail_on_frame = Some(2);

    let err = run(&mut host, &mut state, &config).unwrap_err();

    assert!(matches!(err, RunError::Frame { frame: 2, .. }));
    assert_eq!(host.submitted.len(), 2);
    assert!(host.shut_down);
}

#[test]
fn resize_flows_into_frame_viewport() {
    let (config, mut state) = setup();
    let mut host = ScriptedHost::new(vec![
        vec![],
        vec![InputEvent::Resized {
            width: 1280,
            height: 720,
        }],
    ]);

    run(&mut host, &mut state, &config).unwrap();

    assert_eq!(host.submitted[0].viewport, (1920, 1080));
    assert_eq!(host.submitted[1].viewport, (1280, 720));
}

#[test]
fn actual_window_size_replaces_configured_viewport() {
    let (config, mut state) = setup();
    let mut host = ScriptedHost::new(vec![
        vec![InputEvent::Resized {
            width: 1600,
            height: 900,
        }],
        vec![],
    ]);

    run(&mut host, &mut state, &config).unwrap();

    assert!(host.submitted.iter().all(|frame| frame.viewport == (1600, 900)));
}
