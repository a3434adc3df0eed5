//! Registration of the outline pass with the host renderer.

use crate::builtin::OutlineShader;
use crate::error::Result;
use crate::post_processing::outline_pass::OutlinePass;
use crate::post_processing::outline_volume::OutlineVolume;
use crate::post_processing::render_feature::{FrameSchedule, InjectionPoint, RenderFeature};
use crate::post_processing::volume::{VolumeComponent, VolumeStack};
use crate::renderer::RenderBackend;
use crate::scene::{LayerMask, RenderQueueFilter, MAX_RENDERING_LAYER};

/// Designer configuration of the outline feature.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OutlineFeatureSettings {
    /// Where in the frame the outline is drawn.
    pub injection_point: InjectionPoint,
    /// The outline shader. Without one the feature does nothing.
    pub shader: Option<OutlineShader>,
    /// Render queues contributing to the silhouette.
    pub queue_range: RenderQueueFilter,
    /// Layers contributing to the silhouette.
    pub layer_mask: LayerMask,
    /// Rendering-layer index contributing to the silhouette, in `0..=32`; `32` selects all.
    pub rendering_layer: u32,
}

impl Default for OutlineFeatureSettings {
    fn default() -> Self {
        OutlineFeatureSettings {
            injection_point: InjectionPoint::AfterRenderingTransparents,
            shader: None,
            queue_range: RenderQueueFilter::Opaque,
            layer_mask: LayerMask::empty(),
            rendering_layer: 0,
        }
    }
}

impl OutlineFeatureSettings {
    /// Settings using the built-in outline shader.
    pub fn with_builtin_shader() -> Self {
        OutlineFeatureSettings {
            shader: Some(OutlineShader::builtin()),
            ..Default::default()
        }
    }

    /// Sets the rendering-layer index, clamped to `0..=32`.
    pub fn set_rendering_layer(&mut self, index: u32) {
        self.rendering_layer = index.min(MAX_RENDERING_LAYER);
    }
}

/// Adds screen-space outlines to every camera whose [`OutlineVolume`] is active.
pub struct OutlineFeature<B: RenderBackend> {
    name: String,
    settings: OutlineFeatureSettings,
    pass: Option<OutlinePass<B>>,
}

impl<B: RenderBackend> OutlineFeature<B> {
    /// Creates an uninitialized feature.
    pub fn new(name: impl Into<String>, settings: OutlineFeatureSettings) -> Self {
        OutlineFeature {
            name: name.into(),
            settings,
            pass: None,
        }
    }

    /// The feature's name, also used as its debug scope.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The feature's configuration.
    pub fn settings(&self) -> &OutlineFeatureSettings {
        &self.settings
    }

    /// Replaces the configuration. Takes effect on the next `initialize`.
    pub fn set_settings(&mut self, settings: OutlineFeatureSettings) {
        self.settings = settings;
    }

    /// The pass built by the last successful `initialize`.
    pub fn pass(&self) -> Option<&OutlinePass<B>> {
        self.pass.as_ref()
    }
}

impl<B: RenderBackend> RenderFeature<B> for OutlineFeature<B> {
    fn initialize(&mut self, backend: &mut B) -> Result<()> {
        self.teardown(backend);

        if self.settings.shader.is_none() {
            log::warn!("{}: no outline shader assigned, feature disabled", self.name);
            return Ok(());
        }

        self.pass = Some(OutlinePass::new(&self.name, &self.settings, backend)?);
        Ok(())
    }

    fn per_frame<'a>(&'a mut self, volumes: &VolumeStack, schedule: &mut FrameSchedule<'a, B>)
    where
        B: 'a,
    {
        let Some(pass) = self.pass.as_mut() else {
            return;
        };

        let Some(volume) = volumes.get::<OutlineVolume>().filter(|v| v.is_active()) else {
            log::trace!("{}: outline inactive this frame", self.name);
            return;
        };

        pass.setup(volume);
        schedule.enqueue(pass);
    }

    fn teardown(&mut self, backend: &mut B) {
        if let Some(pass) = self.pass.take() {
            pass.dispose(backend);
        }
    }
}
