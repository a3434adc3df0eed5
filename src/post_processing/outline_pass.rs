//! The render pass drawing screen-space outlines.
//!
//! Each frame the pass:
//!
//! 1. sizes its two scratch targets to half the camera resolution (reallocating only
//!    when the camera changed) and pushes the outline parameters to its material,
//! 2. clears the silhouette target and draws the filtered geometry into it with the
//!    silhouette sub-pass of its own material,
//! 3. runs the edge-detection sub-pass from the silhouette target into the outline target,
//! 4. composites the outline target onto the camera color target.

use crate::camera::{CameraData, CameraDescriptor};
use crate::color::{self, Color};
use crate::error::Result;
use crate::post_processing::outline_feature::OutlineFeatureSettings;
use crate::post_processing::outline_volume::{OutlineVolume, DEFAULT_OUTLINE_WIDTH};
use crate::post_processing::render_feature::{InjectionPoint, ScriptablePass};
use crate::renderer::{BlitTarget, MaterialProperty, RenderBackend, SubPass};
use crate::resource::{ScratchDescriptor, ScratchTargets};
use crate::scene::{rendering_layer_mask, CullResults, DrawingSettings, FilteringSettings};

/// Draws outlines around the filtered geometry.
pub struct OutlinePass<B: RenderBackend> {
    name: String,
    injection_point: InjectionPoint,
    material: Option<B::Material>,
    filtering: FilteringSettings,
    drawing: DrawingSettings,
    targets: ScratchTargets<B::Texture>,
    outline_color: Color,
    outline_width: f32,
}

impl<B: RenderBackend> OutlinePass<B> {
    /// Builds the pass and its material.
    ///
    /// Fails if the material cannot be built from `settings.shader`; a pass without
    /// a shader never records anything.
    pub fn new(name: &str, settings: &OutlineFeatureSettings, backend: &mut B) -> Result<Self> {
        let material = match &settings.shader {
            Some(shader) => Some(backend.create_material(shader)?),
            None => None,
        };

        let filtering = FilteringSettings::new(
            settings.queue_range.range(),
            settings.layer_mask,
            rendering_layer_mask(settings.rendering_layer),
        );

        log::info!(
            "created outline pass {} at {:?} ({:?} queue, layers {:#x}, rendering layers {:#x})",
            name,
            settings.injection_point,
            settings.queue_range,
            settings.layer_mask.bits(),
            filtering.rendering_layer_mask
        );

        Ok(OutlinePass {
            name: name.to_string(),
            injection_point: settings.injection_point,
            material,
            filtering,
            drawing: DrawingSettings::default(),
            targets: ScratchTargets::new(),
            outline_color: color::WHITE,
            outline_width: DEFAULT_OUTLINE_WIDTH,
        })
    }

    /// Captures this frame's outline parameters.
    pub fn setup(&mut self, volume: &OutlineVolume) {
        self.outline_color = volume.outline_color;
        self.outline_width = volume.outline_width();
    }

    /// The filters selecting the geometry drawn into the silhouette.
    pub fn filtering(&self) -> &FilteringSettings {
        &self.filtering
    }

    /// Shader tags and ordering of the silhouette draw.
    pub fn drawing_settings_mut(&mut self) -> &mut DrawingSettings {
        &mut self.drawing
    }

    /// The scratch targets, as last allocated.
    pub fn scratch_targets(&self) -> &ScratchTargets<B::Texture> {
        &self.targets
    }

    /// Whether the pass has a material to draw with.
    pub fn has_material(&self) -> bool {
        self.material.is_some()
    }

    /// Releases the material and both scratch targets.
    pub fn dispose(mut self, backend: &mut B) {
        if let Some(material) = self.material.take() {
            backend.destroy_material(material);
        }
        self.targets.release(backend);
    }
}

impl<B: RenderBackend> ScriptablePass<B> for OutlinePass<B> {
    fn name(&self) -> &str {
        &self.name
    }

    fn injection_point(&self) -> InjectionPoint {
        self.injection_point
    }

    fn camera_setup(&mut self, backend: &mut B, camera: &CameraDescriptor) {
        let Some(material) = self.material.as_mut() else {
            return;
        };

        let descriptor = ScratchDescriptor::for_camera(camera);
        self.targets.reallocate_if_needed(&descriptor, backend);

        backend.set_color(material, MaterialProperty::OutlineColor, self.outline_color);
        backend.set_float(material, MaterialProperty::OutlineWidth, self.outline_width);
    }

    fn execute(
        &mut self,
        backend: &mut B,
        camera: &CameraData<'_, B::CameraTarget>,
        cull: &CullResults<B::Mesh>,
    ) {
        let Some(material) = self.material.as_mut() else {
            return;
        };
        let (Some(silhouette), Some(outline)) = (self.targets.silhouette(), self.targets.outline())
        else {
            log::warn!("{}: executed before camera setup, skipping", self.name);
            return;
        };

        backend.begin_scope(&self.name);

        backend.clear(silhouette, color::TRANSPARENT);
        let renderables = self.drawing.select(cull, &self.filtering);
        backend.draw_renderers(silhouette, &renderables, material, SubPass::Silhouette);

        backend.blit(
            silhouette,
            BlitTarget::Scratch(outline),
            material,
            SubPass::EdgeDetect,
        );

        backend.blit(
            outline,
            BlitTarget::Camera(camera.color_target),
            material,
            SubPass::Composite,
        );

        backend.end_scope();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::OutlineShader;
    use crate::renderer::{RecordedCommand, RecordingBackend};
    use crate::resource::{OUTLINE_TARGET_NAME, SILHOUETTE_TARGET_NAME};
    use crate::scene::{LayerMask, Renderable, RenderQueueFilter, TRANSPARENT_QUEUE};

    fn settings() -> OutlineFeatureSettings {
        OutlineFeatureSettings {
            shader: Some(OutlineShader::builtin()),
            layer_mask: LayerMask::all(),
            ..Default::default()
        }
    }

    fn camera(width: u32, height: u32) -> CameraDescriptor {
        CameraDescriptor::new(width, height, wgpu::TextureFormat::Bgra8UnormSrgb)
    }

    fn run_frame(
        pass: &mut OutlinePass<RecordingBackend>,
        backend: &mut RecordingBackend,
        descriptor: CameraDescriptor,
        cull: &CullResults<u32>,
    ) {
        let camera = CameraData::new(descriptor, "camera");
        pass.camera_setup(backend, &camera.descriptor);
        pass.execute(backend, &camera, cull);
    }

    #[test]
    fn frame_records_the_three_sub_passes_in_order() {
        let mut backend = RecordingBackend::<u32>::new();
        let mut pass = OutlinePass::new("Outline", &settings(), &mut backend).unwrap();
        pass.setup(&OutlineVolume::new(color::RED, 5.0));
        backend.take_commands();

        let cull = CullResults::new(vec![
            Renderable::new(7),
            Renderable::new(8).with_render_queue(TRANSPARENT_QUEUE),
        ]);
        run_frame(&mut pass, &mut backend, camera(640, 480), &cull);

        let commands = backend.take_commands();
        let material = match commands[2] {
            RecordedCommand::SetColor { material, .. } => material,
            ref other => panic!("unexpected command {other:?}"),
        };

        assert!(matches!(commands[0], RecordedCommand::Allocate { name: SILHOUETTE_TARGET_NAME, .. }));
        assert!(matches!(commands[1], RecordedCommand::Allocate { name: OUTLINE_TARGET_NAME, .. }));
        assert_eq!(
            commands[2..],
            [
                RecordedCommand::SetColor {
                    material,
                    property: MaterialProperty::OutlineColor,
                    value: color::RED,
                },
                RecordedCommand::SetFloat {
                    material,
                    property: MaterialProperty::OutlineWidth,
                    value: 5.0,
                },
                RecordedCommand::BeginScope("Outline".to_string()),
                RecordedCommand::Clear {
                    target: SILHOUETTE_TARGET_NAME,
                    color: color::TRANSPARENT,
                },
                RecordedCommand::DrawRenderers {
                    target: SILHOUETTE_TARGET_NAME,
                    meshes: vec![7],
                    pass: SubPass::Silhouette,
                },
                RecordedCommand::Blit {
                    source: SILHOUETTE_TARGET_NAME,
                    destination: OUTLINE_TARGET_NAME.to_string(),
                    pass: SubPass::EdgeDetect,
                },
                RecordedCommand::Blit {
                    source: OUTLINE_TARGET_NAME,
                    destination: "camera".to_string(),
                    pass: SubPass::Composite,
                },
                RecordedCommand::EndScope,
            ]
        );
    }

    #[test]
    fn scratch_targets_follow_camera_resolution() {
        let mut backend = RecordingBackend::<u32>::new();
        let mut pass = OutlinePass::new("Outline", &settings(), &mut backend).unwrap();
        let cull = CullResults::default();

        run_frame(&mut pass, &mut backend, camera(1280, 720), &cull);
        run_frame(&mut pass, &mut backend, camera(1280, 720), &cull);
        assert_eq!(backend.allocation_count(), 2);

        run_frame(&mut pass, &mut backend, camera(1001, 501), &cull);
        assert_eq!(backend.allocation_count(), 4);
        assert_eq!(backend.live_texture_count(), 2);

        let descriptor = pass.scratch_targets().descriptor().copied().unwrap();
        assert_eq!((descriptor.width, descriptor.height), (500, 250));
        assert_eq!(descriptor.format, wgpu::TextureFormat::R8Unorm);
    }

    #[test]
    fn consecutive_identical_frames_record_identical_commands() {
        let mut backend = RecordingBackend::<u32>::new();
        let mut pass = OutlinePass::new("Outline", &settings(), &mut backend).unwrap();
        pass.setup(&OutlineVolume::new(color::YELLOW, 2.0));
        let cull = CullResults::new(vec![Renderable::new(1), Renderable::new(2).with_view_depth(-1.0)]);

        run_frame(&mut pass, &mut backend, camera(300, 200), &cull);
        backend.take_commands();

        run_frame(&mut pass, &mut backend, camera(300, 200), &cull);
        let second = backend.take_commands();
        run_frame(&mut pass, &mut backend, camera(300, 200), &cull);
        let third = backend.take_commands();

        assert_eq!(second, third);
        assert!(!second
            .iter()
            .any(|c| matches!(c, RecordedCommand::Allocate { .. })));
    }

    #[test]
    fn queue_filter_selects_transparent_geometry() {
        let mut backend = RecordingBackend::<u32>::new();
        let settings = OutlineFeatureSettings {
            queue_range: RenderQueueFilter::Transparent,
            ..settings()
        };
        let mut pass = OutlinePass::new("Outline", &settings, &mut backend).unwrap();
        let cull = CullResults::new(vec![
            Renderable::new(1),
            Renderable::new(2).with_render_queue(TRANSPARENT_QUEUE),
        ]);

        run_frame(&mut pass, &mut backend, camera(64, 64), &cull);

        let drawn: Vec<_> = backend
            .commands()
            .iter()
            .filter_map(|c| match c {
                RecordedCommand::DrawRenderers { meshes, .. } => Some(meshes.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(drawn, vec![vec![2]]);
    }

    #[test]
    fn pass_without_shader_records_nothing() {
        let mut backend = RecordingBackend::<u32>::new();
        let settings = OutlineFeatureSettings {
            shader: None,
            ..settings()
        };
        let mut pass = OutlinePass::new("Outline", &settings, &mut backend).unwrap();
        assert!(!pass.has_material());

        run_frame(&mut pass, &mut backend, camera(64, 64), &CullResults::default());
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn execute_before_camera_setup_is_skipped() {
        let mut backend = RecordingBackend::<u32>::new();
        let mut pass = OutlinePass::new("Outline", &settings(), &mut backend).unwrap();
        backend.take_commands();

        let camera = CameraData::new(camera(64, 64), "camera");
        pass.execute(&mut backend, &camera, &CullResults::default());
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn dispose_releases_material_and_targets() {
        let mut backend = RecordingBackend::<u32>::new();
        let mut pass = OutlinePass::new("Outline", &settings(), &mut backend).unwrap();
        run_frame(&mut pass, &mut backend, camera(64, 64), &CullResults::default());
        assert_eq!(backend.live_texture_count(), 2);
        assert_eq!(backend.live_material_count(), 1);

        pass.dispose(&mut backend);
        assert_eq!(backend.live_texture_count(), 0);
        assert_eq!(backend.live_material_count(), 0);
    }
}
