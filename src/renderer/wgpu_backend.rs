//! Executes the outline pass with wgpu.

use glamx::{Mat4, Vec3};

use crate::builtin::OutlineShader;
use crate::color::{self, Color};
use crate::context::Context;
use crate::error::Result;
use crate::renderer::backend::{BlitTarget, MaterialProperty, RenderBackend, SubPass};
use crate::renderer::outline_material::{ObjectUniforms, OutlineMaterial};
use crate::resource::{OffscreenBuffers, ScratchAllocator, ScratchDescriptor, SCRATCH_FORMAT};
use crate::scene::Renderable;

/// Geometry drawn by the silhouette sub-pass: positions only, indexed triangles.
#[derive(Clone, Debug)]
pub struct SilhouetteMesh {
    /// `Float32x3` positions.
    pub vertices: wgpu::Buffer,
    /// `u32` triangle indices.
    pub indices: wgpu::Buffer,
    /// Number of indices to draw.
    pub index_count: u32,
    /// Transform from object space to clip space for the current camera.
    pub clip_from_object: Mat4,
}

impl SilhouetteMesh {
    /// Uploads a mesh to the GPU.
    ///
    /// # Arguments
    /// * `positions` - Vertex positions
    /// * `indices` - Triangle list indices into `positions`
    /// * `clip_from_object` - Object-to-clip transform
    pub fn new(positions: &[Vec3], indices: &[u32], clip_from_object: Mat4) -> Self {
        let ctxt = Context::get();
        let coords: Vec<[f32; 3]> = positions.iter().map(|p| p.to_array()).collect();

        let vertices = ctxt.create_buffer_init(
            Some("silhouette_vertex_buffer"),
            bytemuck::cast_slice(&coords),
            wgpu::BufferUsages::VERTEX,
        );
        let indices_buffer = ctxt.create_buffer_init(
            Some("silhouette_index_buffer"),
            bytemuck::cast_slice(indices),
            wgpu::BufferUsages::INDEX,
        );

        SilhouetteMesh {
            vertices,
            indices: indices_buffer,
            index_count: indices.len() as u32,
            clip_from_object,
        }
    }

    /// The same geometry seen through another transform.
    pub fn with_transform(&self, clip_from_object: Mat4) -> Self {
        SilhouetteMesh {
            clip_from_object,
            ..self.clone()
        }
    }
}

/// The camera color target lent by the host for one frame.
#[derive(Clone, Debug)]
pub struct CameraColorTarget {
    /// View of the camera color texture.
    pub view: wgpu::TextureView,
    /// Format of the camera color texture.
    pub format: wgpu::TextureFormat,
}

/// Bookkeeping of the commands recorded since the last submission.
///
/// Every submission gets a generation number. Resources stamped with the current
/// generation are referenced by commands that have not reached the queue yet.
struct InFlight<R> {
    generation: u64,
    recording: bool,
    scopes: Vec<String>,
    retired: Vec<R>,
}

impl<R> InFlight<R> {
    fn new() -> Self {
        InFlight {
            generation: 0,
            recording: false,
            scopes: Vec::new(),
            retired: Vec::new(),
        }
    }

    fn begin_recording(&mut self) {
        self.recording = true;
    }

    fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a resource stamped with `stamp` is used by unsubmitted commands.
    fn is_pending(&self, stamp: Option<u64>) -> bool {
        self.recording && stamp == Some(self.generation)
    }

    /// Hands `resource` back if it can be destroyed right away, or keeps it until
    /// the commands being recorded are submitted.
    fn retire(&mut self, resource: R) -> Option<R> {
        if self.recording {
            self.retired.push(resource);
            None
        } else {
            Some(resource)
        }
    }

    fn scopes(&self) -> &[String] {
        &self.scopes
    }

    fn push_scope(&mut self, name: &str) {
        self.scopes.push(name.to_string());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Closes the current generation and returns the resources retired during it.
    ///
    /// Open scopes stay open: they are pushed again on the next encoder.
    fn finish(&mut self) -> Vec<R> {
        self.recording = false;
        self.generation += 1;
        std::mem::take(&mut self.retired)
    }
}

/// GPU resources waiting for the commands using them to be submitted.
enum Retired {
    Texture(OffscreenBuffers),
    Material(OutlineMaterial),
}

impl Retired {
    fn destroy(self) {
        match self {
            Retired::Texture(texture) => texture.destroy(),
            Retired::Material(material) => material.destroy(),
        }
    }
}

/// A [`RenderBackend`] recording into a wgpu command encoder.
///
/// Commands accumulate in one encoder until [`WgpuBackend::submit`] is called,
/// so several cameras may be recorded before a single submission. Writing the
/// parameters or transforms of a material already used by unsubmitted commands
/// submits those commands first. Released textures and destroyed materials are
/// only destroyed once the commands referencing them are submitted.
pub struct WgpuBackend {
    encoder: Option<wgpu::CommandEncoder>,
    in_flight: InFlight<Retired>,
}

impl Default for WgpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl WgpuBackend {
    /// Creates a backend using the global [`Context`].
    pub fn new() -> Self {
        WgpuBackend {
            encoder: None,
            in_flight: InFlight::new(),
        }
    }

    fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        let in_flight = &mut self.in_flight;
        self.encoder.get_or_insert_with(|| {
            let mut encoder = Context::get().create_command_encoder(Some("outline_encoder"));
            for scope in in_flight.scopes() {
                encoder.push_debug_group(scope);
            }
            in_flight.begin_recording();
            encoder
        })
    }

    /// Submits the recorded commands, then destroys the resources released while
    /// recording them.
    pub fn submit(&mut self) {
        let Some(mut encoder) = self.encoder.take() else {
            return;
        };
        for _ in self.in_flight.scopes() {
            encoder.pop_debug_group();
        }

        let ctxt = Context::get();
        ctxt.submit(std::iter::once(encoder.finish()));

        for resource in self.in_flight.finish() {
            resource.destroy();
        }
    }

    /// Submits pending commands if `material` is used by them, so that it can be
    /// rewritten without affecting them.
    fn prepare_write(&mut self, material: &OutlineMaterial) {
        if self.in_flight.is_pending(material.recorded_in) {
            log::trace!(
                "submitting pending commands before rewriting {}",
                material.label()
            );
            self.submit();
        }
    }

    fn retire(&mut self, resource: Retired) {
        if let Some(resource) = self.in_flight.retire(resource) {
            resource.destroy();
        }
    }
}

impl ScratchAllocator for WgpuBackend {
    type Texture = OffscreenBuffers;

    fn allocate(&mut self, descriptor: &ScratchDescriptor, name: &'static str) -> OffscreenBuffers {
        OffscreenBuffers::new(descriptor, name)
    }

    fn release(&mut self, texture: OffscreenBuffers) {
        self.retire(Retired::Texture(texture));
    }
}

impl RenderBackend for WgpuBackend {
    type Material = OutlineMaterial;
    type Mesh = SilhouetteMesh;
    type CameraTarget = CameraColorTarget;

    fn create_material(&mut self, shader: &OutlineShader) -> Result<OutlineMaterial> {
        OutlineMaterial::new(shader)
    }

    fn destroy_material(&mut self, material: OutlineMaterial) {
        log::debug!("destroying outline material {}", material.label());
        self.retire(Retired::Material(material));
    }

    fn set_color(&mut self, material: &mut OutlineMaterial, property: MaterialProperty, value: Color) {
        self.prepare_write(material);
        match property {
            MaterialProperty::OutlineColor => material.set_outline_color(value),
            MaterialProperty::OutlineWidth => {
                log::warn!("{} is not a color property", property.name())
            }
        }
    }

    fn set_float(&mut self, material: &mut OutlineMaterial, property: MaterialProperty, value: f32) {
        self.prepare_write(material);
        match property {
            MaterialProperty::OutlineWidth => material.set_outline_width(value),
            MaterialProperty::OutlineColor => {
                log::warn!("{} is not a float property", property.name())
            }
        }
    }

    fn begin_scope(&mut self, name: &str) {
        self.encoder().push_debug_group(name);
        self.in_flight.push_scope(name);
    }

    fn end_scope(&mut self) {
        if !self.in_flight.scopes().is_empty() {
            self.encoder().pop_debug_group();
            self.in_flight.pop_scope();
        }
    }

    fn clear(&mut self, target: &OffscreenBuffers, color: Color) {
        let _ = self
            .encoder()
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("outline_clear_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(color::to_wgpu(color)),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
    }

    fn draw_renderers(
        &mut self,
        target: &OffscreenBuffers,
        renderables: &[&Renderable<SilhouetteMesh>],
        material: &mut OutlineMaterial,
        pass: SubPass,
    ) {
        if pass != SubPass::Silhouette {
            log::warn!("sub-pass {:?} cannot draw geometry", pass);
            return;
        }
        if renderables.is_empty() {
            return;
        }

        self.prepare_write(material);
        material.transforms.clear();
        let offsets: Vec<u32> = renderables
            .iter()
            .map(|r| {
                material
                    .transforms
                    .push(&ObjectUniforms::new(&r.mesh.clip_from_object))
            })
            .collect();
        material.transforms.flush();
        material.recorded_in = Some(self.in_flight.generation());

        let mut render_pass = self
            .encoder()
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("outline_silhouette_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

        render_pass.set_pipeline(material.silhouette_pipeline());
        for (renderable, offset) in renderables.iter().zip(offsets) {
            let mesh = &renderable.mesh;
            render_pass.set_bind_group(0, material.transforms.bind_group(), &[offset]);
            render_pass.set_vertex_buffer(0, mesh.vertices.slice(..));
            render_pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }

    fn blit(
        &mut self,
        source: &OffscreenBuffers,
        destination: BlitTarget<'_, OffscreenBuffers, CameraColorTarget>,
        material: &mut OutlineMaterial,
        pass: SubPass,
    ) {
        let (view, format, load) = match destination {
            BlitTarget::Scratch(target) => (
                &target.color_view,
                SCRATCH_FORMAT,
                wgpu::LoadOp::Clear(color::to_wgpu(color::TRANSPARENT)),
            ),
            BlitTarget::Camera(camera) => (&camera.view, camera.format, wgpu::LoadOp::Load),
        };

        let Some(pipeline) = material.fullscreen_pipeline(pass, format) else {
            log::warn!("sub-pass {:?} cannot be blitted", pass);
            return;
        };
        let source_bind_group = material.source_bind_group(&source.color_view, &source.sampler);
        material.recorded_in = Some(self.in_flight.generation());

        let mut render_pass = self
            .encoder()
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("outline_blit_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

        render_pass.set_pipeline(&pipeline);
        render_pass.set_bind_group(0, &source_bind_group, &[]);
        render_pass.set_bind_group(1, material.uniform_bind_group(), &[]);
        render_pass.set_vertex_buffer(0, material.vertex_buffer().slice(..));
        render_pass.draw(0..4, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_resources_wait_for_the_submission() {
        let mut in_flight = InFlight::new();
        assert_eq!(in_flight.retire("idle"), Some("idle"));

        in_flight.begin_recording();
        assert_eq!(in_flight.retire("camera a silhouette"), None);
        assert_eq!(in_flight.retire("camera a outline"), None);

        assert_eq!(
            in_flight.finish(),
            vec!["camera a silhouette", "camera a outline"]
        );
        assert!(in_flight.finish().is_empty());
    }

    #[test]
    fn materials_used_by_unsubmitted_commands_are_pending() {
        let mut in_flight: InFlight<()> = InFlight::new();
        assert!(!in_flight.is_pending(None));

        in_flight.begin_recording();
        let stamp = Some(in_flight.generation());
        assert!(in_flight.is_pending(stamp));
        assert!(!in_flight.is_pending(None));

        in_flight.finish();
        assert!(!in_flight.is_pending(stamp));

        in_flight.begin_recording();
        assert!(!in_flight.is_pending(stamp));
        assert!(in_flight.is_pending(Some(in_flight.generation())));
    }

    #[test]
    fn scopes_outlive_a_submission() {
        let mut in_flight: InFlight<()> = InFlight::new();
        in_flight.begin_recording();
        in_flight.push_scope("Outline");
        in_flight.finish();

        assert_eq!(in_flight.scopes(), ["Outline".to_string()]);
        in_flight.pop_scope();
        assert!(in_flight.scopes().is_empty());
    }
}
