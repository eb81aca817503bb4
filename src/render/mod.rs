pub mod commands;
#[cfg(not(target_arch = "wasm32"))]
pub mod renderer;
pub mod shader;
pub mod target;

pub use commands::{
    plan_passes, DrawCall, DrawMesh, Frame, FrameError, ModelId, PassPlan, RenderCommand, Target,
};
#[cfg(not(target_arch = "wasm32"))]
pub use renderer::{RenderError, Renderer, SceneAssets};
pub use shader::{ShaderError, ShaderId, ShaderSource, ShaderUniforms, UniformBlock};
pub use target::{FramebufferError, OffscreenTarget};
