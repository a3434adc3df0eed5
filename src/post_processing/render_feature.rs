//! Plugging passes into the host's frame.
//!
//! A [`RenderFeature`] is created once per configuration load. Every frame, for
//! every camera, the host asks each feature to enqueue its passes into a
//! [`FrameSchedule`], then runs the schedule.

use crate::camera::{CameraData, CameraDescriptor};
use crate::error::Result;
use crate::post_processing::volume::VolumeStack;
use crate::renderer::RenderBackend;
use crate::scene::CullResults;

/// Where in the frame a pass runs, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InjectionPoint {
    /// Before anything else is rendered.
    BeforeRendering,
    /// Before shadow maps are rendered.
    BeforeRenderingShadows,
    /// After shadow maps are rendered.
    AfterRenderingShadows,
    /// Before depth/normal pre-passes.
    BeforeRenderingPrePasses,
    /// After depth/normal pre-passes.
    AfterRenderingPrePasses,
    /// Before opaque geometry.
    BeforeRenderingOpaques,
    /// After opaque geometry.
    AfterRenderingOpaques,
    /// Before the skybox.
    BeforeRenderingSkybox,
    /// After the skybox.
    AfterRenderingSkybox,
    /// Before transparent geometry.
    BeforeRenderingTransparents,
    /// After transparent geometry.
    #[default]
    AfterRenderingTransparents,
    /// Before the post-processing stack.
    BeforeRenderingPostProcessing,
    /// After the post-processing stack.
    AfterRenderingPostProcessing,
    /// After everything else.
    AfterRendering,
}

/// A unit of GPU work enqueued into a frame.
pub trait ScriptablePass<B: RenderBackend> {
    /// Name used for debug scopes.
    fn name(&self) -> &str;

    /// Where in the frame the pass runs.
    fn injection_point(&self) -> InjectionPoint;

    /// Prepares per-camera resources before `execute`.
    fn camera_setup(&mut self, backend: &mut B, camera: &CameraDescriptor);

    /// Records the pass's commands.
    fn execute(
        &mut self,
        backend: &mut B,
        camera: &CameraData<'_, B::CameraTarget>,
        cull: &CullResults<B::Mesh>,
    );
}

/// An extension of the host's renderer.
pub trait RenderFeature<B: RenderBackend> {
    /// Builds the feature's passes from its configuration.
    ///
    /// Called whenever the host (re)loads its pipeline configuration; calling it
    /// again replaces what a previous call built.
    fn initialize(&mut self, backend: &mut B) -> Result<()>;

    /// Enqueues this frame's passes, if any.
    fn per_frame<'a>(&'a mut self, volumes: &VolumeStack, schedule: &mut FrameSchedule<'a, B>)
    where
        B: 'a;

    /// Releases every GPU resource of the feature. Safe to call at any time.
    fn teardown(&mut self, backend: &mut B);
}

/// The passes enqueued for one camera in one frame.
pub struct FrameSchedule<'a, B: RenderBackend + 'a> {
    passes: Vec<&'a mut dyn ScriptablePass<B>>,
}

impl<B: RenderBackend> Default for FrameSchedule<'_, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, B: RenderBackend + 'a> FrameSchedule<'a, B> {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        FrameSchedule { passes: Vec::new() }
    }

    /// Enqueues a pass.
    pub fn enqueue(&mut self, pass: &'a mut dyn ScriptablePass<B>) {
        self.passes.push(pass);
    }

    /// Number of enqueued passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Whether nothing was enqueued.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Names and injection points of the enqueued passes, in enqueue order.
    pub fn entries(&self) -> Vec<(String, InjectionPoint)> {
        self.passes
            .iter()
            .map(|p| (p.name().to_string(), p.injection_point()))
            .collect()
    }

    /// Runs every enqueued pass, ordered by injection point.
    ///
    /// Passes sharing an injection point run in enqueue order.
    pub fn run(
        mut self,
        backend: &mut B,
        camera: &CameraData<'_, B::CameraTarget>,
        cull: &CullResults<B::Mesh>,
    ) {
        self.passes.sort_by_key(|p| p.injection_point());

        for pass in self.passes {
            log::trace!("running pass {} at {:?}", pass.name(), pass.injection_point());
            pass.camera_setup(backend, &camera.descriptor);
            pass.execute(backend, camera, cull);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{RecordedCommand, RecordingBackend};

    struct ScopePass {
        name: &'static str,
        at: InjectionPoint,
    }

    impl ScriptablePass<RecordingBackend> for ScopePass {
        fn name(&self) -> &str {
            self.name
        }

        fn injection_point(&self) -> InjectionPoint {
            self.at
        }

        fn camera_setup(&mut self, _: &mut RecordingBackend, _: &CameraDescriptor) {}

        fn execute(
            &mut self,
            backend: &mut RecordingBackend,
            _: &CameraData<'_, str>,
            _: &CullResults<u32>,
        ) {
            backend.begin_scope(self.name);
            backend.end_scope();
        }
    }

    #[test]
    fn injection_points_are_ordered_through_the_frame() {
        assert!(InjectionPoint::BeforeRendering < InjectionPoint::AfterRenderingOpaques);
        assert!(
            InjectionPoint::AfterRenderingOpaques < InjectionPoint::AfterRenderingTransparents
        );
        assert!(InjectionPoint::AfterRenderingTransparents < InjectionPoint::AfterRendering);
        assert_eq!(
            InjectionPoint::default(),
            InjectionPoint::AfterRenderingTransparents
        );
    }

    #[test]
    fn schedule_runs_passes_by_injection_point_then_enqueue_order() {
        let mut late = ScopePass {
            name: "late",
            at: InjectionPoint::AfterRendering,
        };
        let mut first = ScopePass {
            name: "first",
            at: InjectionPoint::BeforeRenderingOpaques,
        };
        let mut second = ScopePass {
            name: "second",
            at: InjectionPoint::BeforeRenderingOpaques,
        };

        let mut schedule = FrameSchedule::new();
        schedule.enqueue(&mut late);
        schedule.enqueue(&mut first);
        schedule.enqueue(&mut second);
        assert_eq!(schedule.len(), 3);

        let mut backend = RecordingBackend::new();
        let camera = CameraData::new(
            CameraDescriptor::new(4, 4, wgpu::TextureFormat::Rgba8Unorm),
            "camera",
        );
        schedule.run(&mut backend, &camera, &CullResults::default());

        let scopes: Vec<_> = backend
            .commands()
            .iter()
            .filter_map(|c| match c {
                RecordedCommand::BeginScope(name) => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(scopes, vec!["first", "second", "late"]);
    }
}
