//! wgpu textures backing the outline scratch targets.

use crate::context::Context;
use crate::resource::ScratchDescriptor;

/// wgpu resources for an off-screen scratch target.
pub struct OffscreenBuffers {
    /// Debug name of the target.
    pub name: &'static str,
    /// The color texture to render to.
    pub color_texture: wgpu::Texture,
    /// The color texture view.
    pub color_view: wgpu::TextureView,
    /// The sampler used when a later pass reads this target.
    pub sampler: wgpu::Sampler,
    /// Width of the render target.
    pub width: u32,
    /// Height of the render target.
    pub height: u32,
}

impl OffscreenBuffers {
    /// Creates a new off-screen color target matching `descriptor`.
    pub fn new(descriptor: &ScratchDescriptor, name: &'static str) -> Self {
        let ctxt = Context::get();

        // Ensure minimum dimensions of 1x1 to avoid wgpu validation errors
        let width = descriptor.width.max(1);
        let height = descriptor.height.max(1);

        let color_texture = ctxt.create_texture(&wgpu::TextureDescriptor {
            label: Some(name),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: descriptor.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let color_view = color_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = ctxt.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(name),
            address_mode_u: descriptor.address_mode,
            address_mode_v: descriptor.address_mode,
            address_mode_w: descriptor.address_mode,
            mag_filter: descriptor.filter,
            min_filter: descriptor.filter,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        OffscreenBuffers {
            name,
            color_texture,
            color_view,
            sampler,
            width,
            height,
        }
    }

    /// Destroys the GPU texture immediately instead of waiting for the last handle to drop.
    pub fn destroy(self) {
        self.color_texture.destroy();
    }
}
