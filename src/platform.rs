//! winit + wgpu implementation of [`Host`].

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{info, warn};
use pollster::block_on;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, DeviceId, ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{CursorGrabMode, Window, WindowId};

use crate::config::DemoConfig;
use crate::input::{EventQueue, InputEvent, Key};
use crate::lifecycle::{Host, InitError};
use crate::model::MeshData;
use crate::render::{
    Frame, FrameError, FramebufferError, RenderError, Renderer, SceneAssets, ShaderSource,
};

/// Desktop host: one window, one wgpu renderer, events pumped per frame.
pub struct WinitHost {
    config: DemoConfig,
    event_loop: Option<EventLoop<()>>,
    handler: WindowHandler,
    renderer: Option<Renderer>,
    start: Instant,
}

impl WinitHost {
    pub fn new(config: DemoConfig) -> Self {
        let handler = WindowHandler::new(&config);
        Self {
            config,
            event_loop: None,
            handler,
            renderer: None,
            start: Instant::now(),
        }
    }

    fn pump(&mut self) -> PumpStatus {
        match self.event_loop.as_mut() {
            Some(event_loop) => event_loop.pump_app_events(Some(Duration::ZERO), &mut self.handler),
            None => PumpStatus::Exit(0),
        }
    }

    fn load_assets(&self) -> Result<SceneAssets, InitError> {
        let root = &self.config.asset_root;
        Ok(SceneAssets {
            lamp_shader: ShaderSource::load(&self.config.lamp_shader, root)?,
            screen_shader: ShaderSource::load(&self.config.screen_shader, root)?,
            primary_model: MeshData::load(&self.config.asset(&self.config.primary_model))?,
            light_model: MeshData::load(&self.config.asset(&self.config.light_model))?,
        })
    }
}

impl Host for WinitHost {
    fn init(&mut self) -> Result<(), InitError> {
        let default_hook = panic::take_hook();
        panic::set_hook(Box::new(|_| {}));
        let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
        panic::set_hook(default_hook);
        let event_loop = event_loop
            .map_err(|panic| InitError::from_panic("event loop", panic))?
            .map_err(|err| InitError::from_error("event loop", err))?;
        self.event_loop = Some(event_loop);

        // The first pump delivers `resumed`, which creates the window.
        if let PumpStatus::Exit(code) = self.pump() {
            return Err(InitError::from_error(
                "window",
                format!("event loop exited with code {code}"),
            ));
        }
        if let Some(message) = self.handler.window_error.take() {
            return Err(InitError::from_error("window", message));
        }
        let window = self
            .handler
            .window
            .clone()
            .ok_or_else(|| InitError::from_error("window", "no window was created"))?;

        let assets = self.load_assets()?;
        let renderer = block_on(Renderer::new(window, assets))
            .map_err(|err| InitError::Context(format!("{err:#}")))?;
        self.renderer = Some(renderer);
        self.start = Instant::now();
        Ok(())
    }

    fn framebuffer_status(&self) -> Result<(), FramebufferError> {
        match self.renderer.as_ref() {
            Some(renderer) => renderer.framebuffer_status(),
            None => Err(FramebufferError::ZeroSized {
                attachment: "color",
            }),
        }
    }

    fn elapsed(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    fn poll_events(&mut self, queue: &mut EventQueue) {
        if let PumpStatus::Exit(_) = self.pump() {
            self.handler.pending.push(InputEvent::CloseRequested);
        }
        queue.extend(self.handler.pending.drain());
    }

    fn submit(&mut self, frame: &Frame) -> Result<(), FrameError> {
        let Some(renderer) = self.renderer.as_mut() else {
            return Ok(());
        };
        match renderer.render(frame) {
            Ok(()) => Ok(()),
            Err(RenderError::Frame(err)) => Err(err),
            Err(RenderError::Surface(err)) => match err {
                wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                    // The next frame's viewport must agree with the window,
                    // or the renderer would resize back to the stale one.
                    let size = renderer.window().inner_size();
                    renderer.resize(size);
                    self.handler.pending.push(resized(size));
                    Ok(())
                }
                wgpu::SurfaceError::OutOfMemory => Err(FrameError::OutOfMemory),
                wgpu::SurfaceError::Timeout => {
                    info!("Surface timeout; retrying next frame");
                    Ok(())
                }
                other => {
                    warn!("skipping frame: {other}");
                    Ok(())
                }
            },
        }
    }

    fn shutdown(&mut self) {
        // GPU resources go before the window they present to.
        self.renderer = None;
        self.handler.window = None;
    }
}

/// Receives winit callbacks and turns them into [`InputEvent`]s.
struct WindowHandler {
    title: String,
    size: PhysicalSize<u32>,
    window: Option<Arc<Window>>,
    window_error: Option<String>,
    pending: EventQueue,
    /// Virtual cursor fed by raw motion while the real cursor is locked.
    cursor: (f64, f64),
}

impl WindowHandler {
    fn new(config: &DemoConfig) -> Self {
        Self {
            title: config.title.clone(),
            size: PhysicalSize::new(config.width, config.height),
            window: None,
            window_error: None,
            pending: EventQueue::new(),
            cursor: (f64::from(config.width) / 2.0, f64::from(config.height) / 2.0),
        }
    }
}

impl ApplicationHandler for WindowHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(self.size);
        match event_loop.create_window(attrs) {
            Ok(window) => {
                capture_cursor(&window);
                // The platform may not honor the requested size.
                self.pending.push(resized(window.inner_size()));
                self.window = Some(Arc::new(window));
            }
            Err(err) => self.window_error = Some(err.to_string()),
        }
    }

    fn window_event(&mut self, _: &ActiveEventLoop, _: WindowId, event: WindowEvent) {
        let event = match event {
            WindowEvent::CloseRequested => InputEvent::CloseRequested,
            WindowEvent::Resized(size) => resized(size),
            WindowEvent::KeyboardInput { event, .. } if !event.repeat => {
                let Some(key) = map_key(event.physical_key) else {
                    return;
                };
                match event.state {
                    ElementState::Pressed => InputEvent::KeyPressed(key),
                    ElementState::Released => InputEvent::KeyReleased(key),
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let (dx, dy) = match delta {
                    MouseScrollDelta::LineDelta(x, y) => (x, y),
                    MouseScrollDelta::PixelDelta(p) => (p.x as f32, p.y as f32),
                };
                InputEvent::Scroll { dx, dy }
            }
            _ => return,
        };
        self.pending.push(event);
    }

    fn device_event(&mut self, _: &ActiveEventLoop, _: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.cursor.0 += dx;
            self.cursor.1 += dy;
            self.pending.push(InputEvent::CursorMoved {
                x: self.cursor.0,
                y: self.cursor.1,
            });
        }
    }
}

fn capture_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(err) = grabbed {
        warn!("could not capture cursor: {err}");
    }
    window.set_cursor_visible(false);
}

fn resized(size: PhysicalSize<u32>) -> InputEvent {
    InputEvent::Resized {
        width: size.width,
        height: size.height,
    }
}

fn map_key(key: PhysicalKey) -> Option<Key> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    Some(match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_only_bound_keys() {
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::KeyW)), Some(Key::W));
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::Escape)), Some(Key::Escape));
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::ArrowUp)), None);
    }

    #[test]
    fn window_size_becomes_resize_event() {
        assert_eq!(
            resized(PhysicalSize::new(1280, 720)),
            InputEvent::Resized {
                width: 1280,
                height: 720
            }
        );
    }
}
