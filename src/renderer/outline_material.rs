//! wgpu pipelines built from an outline shader.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glamx::Mat4;

use crate::builtin::{
    OutlineShader, COMPOSITE_FRAGMENT_ENTRY, EDGE_DETECT_FRAGMENT_ENTRY, FULLSCREEN_VERTEX_ENTRY,
    SILHOUETTE_FRAGMENT_ENTRY, SILHOUETTE_VERTEX_ENTRY,
};
use crate::color::{self, Color};
use crate::context::Context;
use crate::error::{OutlineError, Result};
use crate::renderer::backend::SubPass;
use crate::resource::{DynamicUniformBuffer, SCRATCH_FORMAT};

/// Vertex data for full-screen quad.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct QuadVertex {
    position: [f32; 2],
}

/// Uniforms shared by the edge-detection and composite sub-passes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct OutlineUniforms {
    color: [f32; 4],
    width: f32,
    _padding: [f32; 3],
}

/// Per-object uniforms of the silhouette sub-pass.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct ObjectUniforms {
    clip_from_object: [[f32; 4]; 4],
}

impl ObjectUniforms {
    pub(crate) fn new(clip_from_object: &Mat4) -> Self {
        ObjectUniforms {
            clip_from_object: clip_from_object.to_cols_array_2d(),
        }
    }
}

const TRANSFORM_BINDING: u32 = 2;

/// The outline shader compiled into its three pipelines.
pub struct OutlineMaterial {
    label: String,
    shader: wgpu::ShaderModule,
    silhouette_pipeline: wgpu::RenderPipeline,
    fullscreen_layout: wgpu::PipelineLayout,
    fullscreen_pipelines: HashMap<(SubPass, wgpu::TextureFormat), wgpu::RenderPipeline>,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    uniforms: OutlineUniforms,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    pub(crate) transforms: DynamicUniformBuffer<ObjectUniforms>,
    vertex_buffer: wgpu::Buffer,
    /// Generation of the last submission whose commands use this material.
    pub(crate) recorded_in: Option<u64>,
}

impl OutlineMaterial {
    /// Compiles `shader` and builds the pipelines of every sub-pass.
    ///
    /// The composite pipeline is prepared for the context's surface format; other
    /// camera formats get their pipeline on first use.
    pub fn new(shader: &OutlineShader) -> Result<OutlineMaterial> {
        shader.validate()?;
        let ctxt = Context::try_get()?;

        ctxt.with_validation(|ctxt| Self::build(ctxt, shader))
            .map_err(|message| OutlineError::ShaderCompilation {
                shader: shader.label.to_string(),
                message,
            })
    }

    fn build(ctxt: &Context, shader: &OutlineShader) -> OutlineMaterial {
        let label = shader.label.to_string();
        let module = ctxt.create_shader_module(Some(&label), &shader.source);

        let transform_bind_group_layout =
            ctxt.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("outline_transform_bind_group_layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: TRANSFORM_BINDING,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: Some(DynamicUniformBuffer::<ObjectUniforms>::entry_size()),
                    },
                    count: None,
                }],
            });

        let texture_bind_group_layout =
            ctxt.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("outline_texture_bind_group_layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let uniform_bind_group_layout =
            ctxt.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("outline_uniform_bind_group_layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let silhouette_layout = ctxt.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("outline_silhouette_pipeline_layout"),
            bind_group_layouts: &[&transform_bind_group_layout],
            push_constant_ranges: &[],
        });

        let fullscreen_layout = ctxt.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("outline_fullscreen_pipeline_layout"),
            bind_group_layouts: &[&texture_bind_group_layout, &uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        let silhouette_pipeline = ctxt.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("outline_silhouette_pipeline"),
            layout: Some(&silhouette_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some(SILHOUETTE_VERTEX_ENTRY),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[wgpu::VertexAttribute {
                        offset: 0,
                        shader_location: 0,
                        format: wgpu::VertexFormat::Float32x3,
                    }],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some(SILHOUETTE_FRAGMENT_ENTRY),
                targets: &[Some(wgpu::ColorTargetState {
                    format: SCRATCH_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let uniforms = OutlineUniforms {
            color: color::to_array(color::WHITE),
            width: 1.0,
            _padding: [0.0; 3],
        };
        let uniform_buffer = ctxt.create_buffer_init(
            Some("outline_uniform_buffer"),
            bytemuck::bytes_of(&uniforms),
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        );
        let uniform_bind_group = ctxt.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("outline_uniform_bind_group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let transforms = DynamicUniformBuffer::new(
            "outline_transform_buffer",
            &transform_bind_group_layout,
            TRANSFORM_BINDING,
            64,
        );

        // Full-screen quad, drawn as a triangle strip.
        let vertices = [
            QuadVertex {
                position: [-1.0, -1.0],
            },
            QuadVertex {
                position: [1.0, -1.0],
            },
            QuadVertex {
                position: [-1.0, 1.0],
            },
            QuadVertex {
                position: [1.0, 1.0],
            },
        ];
        let vertex_buffer = ctxt.create_buffer_init(
            Some("outline_vertex_buffer"),
            bytemuck::cast_slice(&vertices),
            wgpu::BufferUsages::VERTEX,
        );

        let mut material = OutlineMaterial {
            label,
            shader: module,
            silhouette_pipeline,
            fullscreen_layout,
            fullscreen_pipelines: HashMap::new(),
            texture_bind_group_layout,
            uniforms,
            uniform_buffer,
            uniform_bind_group,
            transforms,
            vertex_buffer,
            recorded_in: None,
        };

        // Build the pipelines we know we need while validation errors are still captured.
        let _ = material.fullscreen_pipeline(SubPass::EdgeDetect, SCRATCH_FORMAT);
        let _ = material.fullscreen_pipeline(SubPass::Composite, ctxt.surface_format);
        material
    }

    /// Destroys the material's GPU buffers immediately.
    pub(crate) fn destroy(self) {
        self.uniform_buffer.destroy();
        self.vertex_buffer.destroy();
        self.transforms.destroy();
    }

    /// Label of the shader this material was built from.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Current outline color.
    pub fn outline_color(&self) -> Color {
        let [r, g, b, a] = self.uniforms.color;
        Color::new(r, g, b, a)
    }

    /// Current outline width.
    pub fn outline_width(&self) -> f32 {
        self.uniforms.width
    }

    pub(crate) fn set_outline_color(&mut self, value: Color) {
        self.uniforms.color = color::to_array(value);
        self.upload_uniforms();
    }

    pub(crate) fn set_outline_width(&mut self, value: f32) {
        self.uniforms.width = value;
        self.upload_uniforms();
    }

    fn upload_uniforms(&self) {
        Context::get().write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));
    }

    pub(crate) fn silhouette_pipeline(&self) -> &wgpu::RenderPipeline {
        &self.silhouette_pipeline
    }

    pub(crate) fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    pub(crate) fn uniform_bind_group(&self) -> &wgpu::BindGroup {
        &self.uniform_bind_group
    }

    pub(crate) fn source_bind_group(
        &self,
        view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        Context::get().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("outline_source_bind_group"),
            layout: &self.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    /// The pipeline running the full-screen sub-pass `pass` into a `format` target.
    ///
    /// Returns `None` for the silhouette sub-pass, which draws geometry.
    pub(crate) fn fullscreen_pipeline(
        &mut self,
        pass: SubPass,
        format: wgpu::TextureFormat,
    ) -> Option<wgpu::RenderPipeline> {
        let (entry_point, blend) = match pass {
            SubPass::Silhouette => return None,
            SubPass::EdgeDetect => (EDGE_DETECT_FRAGMENT_ENTRY, None),
            SubPass::Composite => (COMPOSITE_FRAGMENT_ENTRY, Some(wgpu::BlendState::ALPHA_BLENDING)),
        };

        if let Some(pipeline) = self.fullscreen_pipelines.get(&(pass, format)) {
            return Some(pipeline.clone());
        }

        let ctxt = Context::get();
        let pipeline = ctxt.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(entry_point),
            layout: Some(&self.fullscreen_layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some(FULLSCREEN_VERTEX_ENTRY),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[wgpu::VertexAttribute {
                        offset: 0,
                        shader_location: 0,
                        format: wgpu::VertexFormat::Float32x2,
                    }],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some(entry_point),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        log::debug!("built {:?} pipeline for {:?} targets", pass, format);
        self.fullscreen_pipelines
            .insert((pass, format), pipeline.clone());
        Some(pipeline)
    }
}
