//! Real-time demo that renders a cube and a movable light through an
//! offscreen target.
//!
//! Camera, light, input and frame building are plain data and carry no GPU
//! state, so the frame loop can be driven headless through
//! [`lifecycle::Host`]. [`platform::WinitHost`] is the desktop
//! implementation backed by winit and wgpu.

pub mod app;
pub mod camera;
pub mod config;
pub mod input;
pub mod lifecycle;
pub mod light;
pub mod logging;
pub mod model;
#[cfg(not(target_arch = "wasm32"))]
pub mod platform;
pub mod render;
pub mod timing;

pub use app::AppState;
pub use camera::Camera;
pub use config::{DemoConfig, ShaderPaths};
pub use input::{EventQueue, InputEvent, Key, KeyState, MouseTracker};
pub use lifecycle::{run, Host, InitError, RunError, RunReport, Stage};
pub use light::{Direction, Light};
pub use model::{MeshData, ModelError, ObjError};
pub use render::{Frame, FrameError, FramebufferError, ModelId, RenderCommand, ShaderId, Target};
pub use timing::FrameTiming;
