use std::path::{Path, PathBuf};

use glam::Vec3;

/// Vertex/fragment source pair on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderPaths {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl ShaderPaths {
    pub fn new(vertex: impl Into<PathBuf>, fragment: impl Into<PathBuf>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }
}

/// Compile-time settings for the demo.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub asset_root: PathBuf,
    pub lamp_shader: ShaderPaths,
    pub screen_shader: ShaderPaths,
    pub primary_model: PathBuf,
    pub light_model: PathBuf,
    pub clear_color: [f32; 4],
    pub composite_clear_color: [f32; 4],
    pub near: f32,
    pub far: f32,
    pub light_scale: f32,
    pub camera_position: Vec3,
    pub light_position: Vec3,
    pub light_speed: f32,
    /// Composite the offscreen target onto the window before the direct
    /// redraw.
    pub post_process: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            title: "SSS Gems".to_string(),
            width: 1920,
            height: 1080,
            asset_root: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/resources")),
            lamp_shader: ShaderPaths::new("shaders/lamp.vert.wgsl", "shaders/lamp.frag.wgsl"),
            screen_shader: ShaderPaths::new(
                "shaders/screen.vert.wgsl",
                "shaders/screen.frag.wgsl",
            ),
            primary_model: PathBuf::from("models/cube.obj"),
            light_model: PathBuf::from("models/cube.obj"),
            clear_color: [0.1, 0.1, 0.1, 1.0],
            composite_clear_color: [1.0, 1.0, 1.0, 1.0],
            near: 0.1,
            far: 100.0,
            light_scale: 0.2,
            camera_position: Vec3::new(0.0, 0.0, 3.0),
            light_position: Vec3::new(1.2, 1.0, 2.0),
            light_speed: 2.5,
            post_process: false,
        }
    }
}

impl DemoConfig {
    /// Projection aspect ratio. Follows the configured window size, not the
    /// live one.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Resolves an asset path against `asset_root`.
    pub fn asset(&self, path: &Path) -> PathBuf {
        self.asset_root.join(path)
    }
}
