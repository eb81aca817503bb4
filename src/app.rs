//! Per-frame state of the demo and the draw list it produces.

use glam::{Mat4, Vec3};
use log::trace;

use crate::camera::Camera;
use crate::config::DemoConfig;
use crate::input::{InputEvent, Key, KeyState, MouseTracker};
use crate::light::Light;
use crate::render::{Frame, ModelId, RenderCommand, ShaderId, Target};
use crate::timing::FrameTiming;

const MOVEMENT_KEYS: [Key; 4] = [Key::W, Key::S, Key::A, Key::D];

/// Everything the main loop mutates between frames.
#[derive(Debug)]
pub struct AppState {
    pub camera: Camera,
    pub light: Light,
    pub timing: FrameTiming,
    keys: KeyState,
    mouse: MouseTracker,
    viewport: (u32, u32),
    should_close: bool,
}

impl AppState {
    pub fn new(config: &DemoConfig) -> Self {
        Self {
            camera: Camera::new(config.camera_position),
            light: Light::new(config.light_position).with_speed(config.light_speed),
            timing: FrameTiming::new(),
            keys: KeyState::new(),
            mouse: MouseTracker::new(config.width as f32 / 2.0, config.height as f32 / 2.0),
            viewport: (config.width, config.height),
            should_close: false,
        }
    }

    pub fn should_close(&self) -> bool {
        self.should_close
    }

    pub fn request_close(&mut self) {
        self.should_close = true;
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Advances frame timing to `now` (seconds since start).
    pub fn update_timing(&mut self, now: f32) -> f32 {
        self.timing.update(now)
    }

    pub fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyPressed(key) => self.keys.set_key_down(key),
            InputEvent::KeyReleased(key) => self.keys.set_key_up(key),
            InputEvent::CursorMoved { x, y } => {
                let (dx, dy) = self.mouse.offset(x as f32, y as f32);
                self.camera.process_mouse_movement(dx, dy, true);
            }
            InputEvent::Scroll { dy, .. } => {
                // Zoom is disabled.
                trace!("ignoring scroll {dy}");
            }
            InputEvent::Resized { width, height } => {
                if width > 0 && height > 0 {
                    self.viewport = (width, height);
                }
            }
            InputEvent::CloseRequested => self.request_close(),
        }
    }

    /// Applies held keys for this frame's delta.
    pub fn process_input(&mut self) {
        if self.keys.is_key_down(Key::Escape) {
            self.request_close();
        }

        let delta_time = self.timing.delta_time();
        for key in MOVEMENT_KEYS {
            if let Some(direction) = key.light_direction().filter(|_| self.keys.is_key_down(key)) {
                self.light.process_keyboard(direction, delta_time);
            }
        }
    }

    /// Builds this frame's draw list.
    ///
    /// The direct redraw into the window reuses whatever `model` matrix was
    /// set last, i.e. the light's scaled transform.
    pub fn build_frame(&self, config: &DemoConfig) -> Frame {
        let projection = Mat4::perspective_rh(
            self.camera.zoom().to_radians(),
            config.aspect(),
            config.near,
            config.far,
        );
        let view = self.camera.view_matrix();
        let mut model = Mat4::IDENTITY;
        let mut commands = Vec::with_capacity(24);

        commands.push(RenderCommand::BindTarget(Target::Offscreen));
        commands.push(RenderCommand::Clear {
            color: config.clear_color,
            depth: true,
        });
        commands.push(RenderCommand::UseShader(ShaderId::Lamp));
        commands.extend(transforms(model, projection, view));
        commands.push(RenderCommand::DrawModel(ModelId::Primary));

        model = self.light.matrix() * Mat4::from_scale(Vec3::splat(config.light_scale));
        commands.push(set("model", model));
        commands.push(RenderCommand::DrawModel(ModelId::Light));

        commands.push(RenderCommand::BindTarget(Target::Default));
        if config.post_process {
            commands.push(RenderCommand::Clear {
                color: config.composite_clear_color,
                depth: false,
            });
            commands.push(RenderCommand::UseShader(ShaderId::Screen));
            commands.push(RenderCommand::DrawScreenQuad);
        } else {
            commands.push(RenderCommand::Clear {
                color: config.clear_color,
                depth: false,
            });
        }

        commands.push(RenderCommand::UseShader(ShaderId::Lamp));
        commands.extend(transforms(model, projection, view));
        commands.push(RenderCommand::DrawModel(ModelId::Primary));

        Frame {
            viewport: self.viewport,
            commands,
        }
    }
}

fn set(name: &'static str, value: Mat4) -> RenderCommand {
    RenderCommand::SetMat4 { name, value }
}

fn transforms(model: Mat4, projection: Mat4, view: Mat4) -> [RenderCommand; 3] {
    [
        set("model", model),
        set("projection", projection),
        set("view", view),
    ]
}
