//! Ordered draw submission and its grouping into render passes.
//!
//! The frame builder emits commands in the same order a GL program would
//! issue them. [`plan_passes`] replays that list against the persistent
//! uniform state and produces one [`PassPlan`] per render pass, with each
//! draw carrying a snapshot of the uniforms it must see.

use glam::Mat4;
use thiserror::Error;

use super::shader::{ShaderError, ShaderId, ShaderUniforms};

/// Destination of subsequent draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Offscreen,
    Default,
}

/// Meshes uploaded at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelId {
    Primary,
    Light,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    BindTarget(Target),
    /// Clears the bound target's color, and its depth when `depth` is set.
    Clear { color: [f32; 4], depth: bool },
    UseShader(ShaderId),
    SetMat4 { name: &'static str, value: Mat4 },
    DrawModel(ModelId),
    /// Full-screen quad sampling the offscreen color attachment.
    DrawScreenQuad,
}

/// Everything the host needs to render one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub viewport: (u32, u32),
    pub commands: Vec<RenderCommand>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMesh {
    Model(ModelId),
    ScreenQuad,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub shader: ShaderId,
    pub mesh: DrawMesh,
    /// Uniform block contents at the time of the draw.
    pub uniforms: Vec<f32>,
}

impl DrawCall {
    /// Reads back a `mat4` from the snapshot of a lamp draw.
    pub fn lamp_mat4(&self, name: &str) -> Option<Mat4> {
        let slot = super::shader::LAMP_UNIFORMS.iter().position(|n| *n == name)?;
        let floats = self.uniforms.get(slot * 16..slot * 16 + 16)?;
        Some(Mat4::from_cols_slice(floats))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassPlan {
    pub target: Target,
    pub clear_color: Option<[f32; 4]>,
    pub clear_depth: bool,
    pub draws: Vec<DrawCall>,
}

impl PassPlan {
    fn new(target: Target) -> Self {
        Self {
            target,
            clear_color: None,
            clear_depth: false,
            draws: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("draw issued before any render target was bound")]
    NoTarget,
    #[error("draw issued before any shader was bound")]
    NoShader,
    #[error("{draw:?} cannot be drawn with the {shader:?} shader")]
    ShaderMismatch { shader: ShaderId, draw: DrawMesh },
    #[error("the offscreen target cannot sample itself")]
    SampledTargetBound,
    #[error("frame issues {count} draws but only {capacity} uniform slots exist")]
    TooManyDraws { count: usize, capacity: usize },
    #[error(transparent)]
    Uniform(#[from] ShaderError),
    #[error("GPU is out of memory")]
    OutOfMemory,
}

/// Groups `commands` into render passes, updating `uniforms` as it goes.
pub fn plan_passes(
    commands: &[RenderCommand],
    uniforms: &mut ShaderUniforms,
) -> Result<Vec<PassPlan>, FrameError> {
    let mut passes: Vec<PassPlan> = Vec::new();
    let mut shader = None;

    for command in commands {
        match command {
            RenderCommand::BindTarget(target) => passes.push(PassPlan::new(*target)),
            RenderCommand::Clear { color, depth } => {
                let pass = passes.last_mut().ok_or(FrameError::NoTarget)?;
                if pass.draws.is_empty() {
                    pass.clear_color = Some(*color);
                    pass.clear_depth |= *depth;
                } else {
                    let mut next = PassPlan::new(pass.target);
                    next.clear_color = Some(*color);
                    next.clear_depth = *depth;
                    passes.push(next);
                }
            }
            RenderCommand::UseShader(id) => shader = Some(*id),
            RenderCommand::SetMat4 { name, value } => {
                let id = shader.ok_or(FrameError::NoShader)?;
                uniforms.get_mut(id).set_mat4(name, *value)?;
            }
            RenderCommand::DrawModel(model) => {
                push_draw(&mut passes, shader, DrawMesh::Model(*model), uniforms)?;
            }
            RenderCommand::DrawScreenQuad => {
                push_draw(&mut passes, shader, DrawMesh::ScreenQuad, uniforms)?;
            }
        }
    }

    Ok(passes)
}

fn push_draw(
    passes: &mut [PassPlan],
    shader: Option<ShaderId>,
    mesh: DrawMesh,
    uniforms: &ShaderUniforms,
) -> Result<(), FrameError> {
    let pass = passes.last_mut().ok_or(FrameError::NoTarget)?;
    let shader = shader.ok_or(FrameError::NoShader)?;
    match (shader, mesh) {
        (ShaderId::Lamp, DrawMesh::Model(_)) => {}
        (ShaderId::Screen, DrawMesh::ScreenQuad) => {
            if pass.target == Target::Offscreen {
                return Err(FrameError::SampledTargetBound);
            }
        }
        (shader, draw) => return Err(FrameError::ShaderMismatch { shader, draw }),
    }
    pass.draws.push(DrawCall {
        shader,
        mesh,
        uniforms: uniforms.get(shader).to_floats(),
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    const GREY: [f32; 4] = [0.1, 0.1, 0.1, 1.0];

    fn model(value: Mat4) -> RenderCommand {
        RenderCommand::SetMat4 {
            name: "model",
            value,
        }
    }

    #[test]
    fn groups_draws_by_target() {
        let commands = vec![
            RenderCommand::BindTarget(Target::Offscreen),
            RenderCommand::Clear {
                color: GREY,
                depth: true,
            },
            RenderCommand::UseShader(ShaderId::Lamp),
            RenderCommand::DrawModel(ModelId::Primary),
            RenderCommand::DrawModel(ModelId::Light),
            RenderCommand::BindTarget(Target::Default),
            RenderCommand::DrawModel(ModelId::Primary),
        ];
        let passes = plan_passes(&commands, &mut ShaderUniforms::new()).unwrap();
        assert_eq!(passes.len(), 2);
        assert_eq!(passes[0].target, Target::Offscreen);
        assert_eq!(passes[0].clear_color, Some(GREY));
        assert!(passes[0].clear_depth);
        assert_eq!(passes[0].draws.len(), 2);
        assert_eq!(passes[1].target, Target::Default);
        assert_eq!(passes[1].clear_color, None);
        assert_eq!(passes[1].draws.len(), 1);
    }

    #[test]
    fn draws_snapshot_uniforms() {
        let moved = Mat4::from_translation(Vec3::X);
        let commands = vec![
            RenderCommand::BindTarget(Target::Offscreen),
            RenderCommand::UseShader(ShaderId::Lamp),
            model(Mat4::IDENTITY),
            RenderCommand::DrawModel(ModelId::Primary),
            model(moved),
            RenderCommand::DrawModel(ModelId::Light),
        ];
        let passes = plan_passes(&commands, &mut ShaderUniforms::new()).unwrap();
        let draws = &passes[0].draws;
        assert_eq!(draws[0].lamp_mat4("model"), Some(Mat4::IDENTITY));
        assert_eq!(draws[1].lamp_mat4("model"), Some(moved));
    }

    #[test]
    fn uniforms_persist_across_frames() {
        let moved = Mat4::from_translation(Vec3::Y);
        let mut uniforms = ShaderUniforms::new();
        let first = vec![
            RenderCommand::BindTarget(Target::Default),
            RenderCommand::UseShader(ShaderId::Lamp),
            model(moved),
        ];
        plan_passes(&first, &mut uniforms).unwrap();

        let second = vec![
            RenderCommand::BindTarget(Target::Default),
            RenderCommand::UseShader(ShaderId::Lamp),
            RenderCommand::DrawModel(ModelId::Primary),
        ];
        let passes = plan_passes(&second, &mut uniforms).unwrap();
        assert_eq!(passes[0].draws[0].lamp_mat4("model"), Some(moved));
    }

    #[test]
    fn clear_after_draw_starts_new_pass() {
        let commands = vec![
            RenderCommand::BindTarget(Target::Default),
            RenderCommand::UseShader(ShaderId::Lamp),
            RenderCommand::DrawModel(ModelId::Primary),
            RenderCommand::Clear {
                color: GREY,
                depth: false,
            },
            RenderCommand::DrawModel(ModelId::Light),
        ];
        let passes = plan_passes(&commands, &mut ShaderUniforms::new()).unwrap();
        assert_eq!(passes.len(), 2);
        assert_eq!(passes[1].target, Target::Default);
        assert_eq!(passes[1].clear_color, Some(GREY));
        assert_eq!(passes[1].draws.len(), 1);
    }

    #[test]
    fn draw_without_target_fails() {
        let commands = vec![
            RenderCommand::UseShader(ShaderId::Lamp),
            RenderCommand::DrawModel(ModelId::Primary),
        ];
        let err = plan_passes(&commands, &mut ShaderUniforms::new()).unwrap_err();
        assert!(matches!(err, FrameError::NoTarget));
    }

    #[test]
    fn draw_without_shader_fails() {
        let commands = vec![
            RenderCommand::BindTarget(Target::Default),
            RenderCommand::DrawModel(ModelId::Primary),
        ];
        let err = plan_passes(&commands, &mut ShaderUniforms::new()).unwrap_err();
        assert!(matches!(err, FrameError::NoShader));
    }

    #[test]
    fn screen_quad_needs_screen_shader_and_default_target() {
        let mismatched = vec![
            RenderCommand::BindTarget(Target::Default),
            RenderCommand::UseShader(ShaderId::Lamp),
            RenderCommand::DrawScreenQuad,
        ];
        let err = plan_passes(&mismatched, &mut ShaderUniforms::new()).unwrap_err();
        assert!(matches!(err, FrameError::ShaderMismatch { .. }));

        let feedback = vec![
            RenderCommand::BindTarget(Target::Offscreen),
            RenderCommand::UseShader(ShaderId::Screen),
            RenderCommand::DrawScreenQuad,
        ];
        let err = plan_passes(&feedback, &mut ShaderUniforms::new()).unwrap_err();
        assert!(matches!(err, FrameError::SampledTargetBound));
    }

    #[test]
    fn unknown_uniform_fails_the_frame() {
        let commands = vec![
            RenderCommand::UseShader(ShaderId::Screen),
            model(Mat4::IDENTITY),
        ];
        let err = plan_passes(&commands, &mut ShaderUniforms::new()).unwrap_err();
        assert!(matches!(err, FrameError::Uniform(_)));
    }
}
