use std::path::{Path, PathBuf};

use glam::Mat4;
use thiserror::Error;

use crate::config::ShaderPaths;

/// Uniform names of the lamp program, in block order.
pub const LAMP_UNIFORMS: &[&str] = &["model", "view", "projection"];

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to read shader source {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("shader `{shader}` has no uniform named `{name}`")]
    UnknownUniform { shader: &'static str, name: String },
}

/// Programs the demo can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderId {
    Lamp,
    Screen,
}

impl ShaderId {
    pub fn name(self) -> &'static str {
        match self {
            ShaderId::Lamp => "lamp",
            ShaderId::Screen => "screen",
        }
    }
}

/// WGSL text of a vertex/fragment pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderSource {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSource {
    pub fn load(paths: &ShaderPaths, root: &Path) -> Result<Self, ShaderError> {
        Ok(Self {
            vertex: read_source(&root.join(&paths.vertex))?,
            fragment: read_source(&root.join(&paths.fragment))?,
        })
    }
}

fn read_source(path: &Path) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// CPU mirror of a program's `mat4` uniform block.
///
/// Values persist between frames the same way GL program uniforms do, so a
/// draw sees whatever was last set.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformBlock {
    shader: &'static str,
    names: &'static [&'static str],
    values: Vec<Mat4>,
}

impl UniformBlock {
    pub fn new(shader: &'static str, names: &'static [&'static str]) -> Self {
        Self {
            shader,
            names,
            values: vec![Mat4::IDENTITY; names.len()],
        }
    }

    pub fn set_mat4(&mut self, name: &str, value: Mat4) -> Result<(), ShaderError> {
        let slot = self.slot(name)?;
        self.values[slot] = value;
        Ok(())
    }

    pub fn mat4(&self, name: &str) -> Result<Mat4, ShaderError> {
        self.slot(name).map(|slot| self.values[slot])
    }

    /// Column-major floats in block order, ready for upload.
    pub fn to_floats(&self) -> Vec<f32> {
        self.values.iter().flat_map(|m| m.to_cols_array()).collect()
    }

    /// Size of the block in bytes.
    pub fn byte_len(&self) -> usize {
        self.names.len() * std::mem::size_of::<Mat4>()
    }

    fn slot(&self, name: &str) -> Result<usize, ShaderError> {
        self.names
            .iter()
            .position(|n| *n == name)
            .ok_or_else(|| ShaderError::UnknownUniform {
                shader: self.shader,
                name: name.to_string(),
            })
    }
}

/// Uniform state of every program, indexed by [`ShaderId`].
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderUniforms {
    lamp: UniformBlock,
    screen: UniformBlock,
}

impl ShaderUniforms {
    pub fn new() -> Self {
        Self {
            lamp: UniformBlock::new(ShaderId::Lamp.name(), LAMP_UNIFORMS),
            screen: UniformBlock::new(ShaderId::Screen.name(), &[]),
        }
    }

    pub fn get(&self, id: ShaderId) -> &UniformBlock {
        match id {
            ShaderId::Lamp => &self.lamp,
            ShaderId::Screen => &self.screen,
        }
    }

    pub fn get_mut(&mut self, id: ShaderId) -> &mut UniformBlock {
        match id {
            ShaderId::Lamp => &mut self.lamp,
            ShaderId::Screen => &mut self.screen,
        }
    }
}

impl Default for ShaderUniforms {
    fn default() -> Self {
        Self::new()
    }
}
