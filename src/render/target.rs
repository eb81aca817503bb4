use thiserror::Error;

/// Color format of the offscreen attachment. wgpu has no three-channel
/// 8-bit format, so the alpha channel is carried along unused.
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub const DEPTH_STENCIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// Shape of one framebuffer attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentDesc {
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FramebufferError {
    #[error("{attachment} attachment has zero area")]
    ZeroSized { attachment: &'static str },
    #[error("{attachment} attachment is {width}x{height}, device limit is {limit}")]
    TooLarge {
        attachment: &'static str,
        width: u32,
        height: u32,
        limit: u32,
    },
    #[error("attachment sizes differ: color {color:?}, depth/stencil {depth:?}")]
    SizeMismatch { color: (u32, u32), depth: (u32, u32) },
    #[error("{format:?} cannot be used as the {attachment} attachment")]
    BadFormat {
        attachment: &'static str,
        format: wgpu::TextureFormat,
    },
}

/// Checks that a color + depth/stencil pair forms a usable framebuffer.
pub fn check_attachments(
    color: AttachmentDesc,
    depth: AttachmentDesc,
    max_dimension: u32,
) -> Result<(), FramebufferError> {
    if color.format.is_depth_stencil_format() {
        return Err(FramebufferError::BadFormat {
            attachment: "color",
            format: color.format,
        });
    }
    if !(depth.format.has_depth_aspect() && depth.format.has_stencil_aspect()) {
        return Err(FramebufferError::BadFormat {
            attachment: "depth/stencil",
            format: depth.format,
        });
    }
    for (attachment, desc) in [("color", color), ("depth/stencil", depth)] {
        if desc.width == 0 || desc.height == 0 {
            return Err(FramebufferError::ZeroSized { attachment });
        }
        if desc.width > max_dimension || desc.height > max_dimension {
            return Err(FramebufferError::TooLarge {
                attachment,
                width: desc.width,
                height: desc.height,
                limit: max_dimension,
            });
        }
    }
    if (color.width, color.height) != (depth.width, depth.height) {
        return Err(FramebufferError::SizeMismatch {
            color: (color.width, color.height),
            depth: (depth.width, depth.height),
        });
    }
    Ok(())
}

/// Offscreen render target: sampled color texture plus depth/stencil.
pub struct OffscreenTarget {
    _color: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    _depth_stencil: wgpu::Texture,
    pub depth_view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    status: Result<(), FramebufferError>,
}

impl OffscreenTarget {
    /// Creates the target at `width`x`height`.
    ///
    /// The attachments are validated before allocation. An invalid request
    /// is recorded in [`status`](Self::status) and the textures are clamped
    /// to something the device accepts.
    pub fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let limit = device.limits().max_texture_dimension_2d;
        let color = AttachmentDesc {
            format: COLOR_FORMAT,
            width,
            height,
        };
        let depth = AttachmentDesc {
            format: DEPTH_STENCIL_FORMAT,
            width,
            height,
        };
        let status = check_attachments(color, depth, limit);
        let size = wgpu::Extent3d {
            width: width.clamp(1, limit),
            height: height.clamp(1, limit),
            depth_or_array_layers: 1,
        };

        let color_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen-color"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen-depth-stencil"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_STENCIL_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("offscreen-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            color_view: color_texture.create_view(&wgpu::TextureViewDescriptor::default()),
            _color: color_texture,
            depth_view: depth_texture.create_view(&wgpu::TextureViewDescriptor::default()),
            _depth_stencil: depth_texture,
            sampler,
            status,
        }
    }

    /// Result of the completeness check done at creation.
    pub fn status(&self) -> Result<(), FramebufferError> {
        self.status.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(format: wgpu::TextureFormat, width: u32, height: u32) -> AttachmentDesc {
        AttachmentDesc {
            format,
            width,
            height,
        }
    }

    #[test]
    fn window_sized_target_is_complete() {
        let color = desc(COLOR_FORMAT, 1920, 1080);
        let depth = desc(DEPTH_STENCIL_FORMAT, 1920, 1080);
        assert_eq!(check_attachments(color, depth, 8192), Ok(()));
    }

    #[test]
    fn zero_area_is_incomplete() {
        let color = desc(COLOR_FORMAT, 0, 1080);
        let depth = desc(DEPTH_STENCIL_FORMAT, 0, 1080);
        assert_eq!(
            check_attachments(color, depth, 8192),
            Err(FramebufferError::ZeroSized {
                attachment: "color"
            })
        );
    }

    #[test]
    fn oversized_is_incomplete() {
        let color = desc(COLOR_FORMAT, 1920, 1080);
        let depth = desc(DEPTH_STENCIL_FORMAT, 1920, 1080);
        assert!(matches!(
            check_attachments(color, depth, 1024),
            Err(FramebufferError::TooLarge { limit: 1024, .. })
        ));
    }

    #[test]
    fn mismatched_sizes_are_incomplete() {
        let color = desc(COLOR_FORMAT, 1920, 1080);
        let depth = desc(DEPTH_STENCIL_FORMAT, 1280, 720);
        assert!(matches!(
            check_attachments(color, depth, 8192),
            Err(FramebufferError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn depth_only_format_lacks_stencil() {
        let color = desc(COLOR_FORMAT, 64, 64);
        let depth = desc(wgpu::TextureFormat::Depth32Float, 64, 64);
        assert!(matches!(
            check_attachments(color, depth, 8192),
            Err(FramebufferError::BadFormat {
                attachment: "depth/stencil",
                ..
            })
        ));
    }
}
