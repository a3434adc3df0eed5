/*!
# Screen-space outline

A post-processing pass drawing outlines around selected geometry, for renderers
built on [wgpu](https://wgpu.rs).

Every frame the pass:

* renders the selected geometry into a half-resolution, single-channel silhouette mask,
* runs an edge-detection shader over the mask into a second half-resolution target,
* blends the resulting outline mask over the camera's color target.

The host renderer drives the effect through three calls: [`RenderFeature::initialize`]
when its configuration is loaded, [`RenderFeature::per_frame`] once per camera and frame,
and [`RenderFeature::teardown`] when the feature goes away.

```no_run
use screen_space_outline::prelude::*;

# fn frame(device: wgpu::Device, queue: wgpu::Queue, camera_view: wgpu::TextureView, cube: SilhouetteMesh) -> screen_space_outline::error::Result<()> {
Context::init(device, queue, wgpu::TextureFormat::Bgra8UnormSrgb);

let mut backend = WgpuBackend::new();
let settings = OutlineFeatureSettings {
    layer_mask: LayerMask::DEFAULT,
    ..OutlineFeatureSettings::with_builtin_shader()
};
let mut feature = OutlineFeature::new("Outline", settings);
feature.initialize(&mut backend)?;

let mut volumes = VolumeStack::new();
volumes.set(OutlineVolume::new(ORANGE, 3.0));

// Once per frame.
let target = CameraColorTarget { view: camera_view, format: wgpu::TextureFormat::Bgra8UnormSrgb };
let camera = CameraData::new(CameraDescriptor::new(1280, 720, target.format), &target);
let cull = CullResults::new(vec![Renderable::new(cube)]);

let mut schedule = FrameSchedule::new();
feature.per_frame(&volumes, &mut schedule);
schedule.run(&mut backend, &camera, &cull);
backend.submit();

feature.teardown(&mut backend);
# Ok(())
# }
```

Without a GPU, [`RecordingBackend`](renderer::RecordingBackend) records what the pass
would do instead.
*/

#![allow(clippy::module_inception)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]

pub use glamx;

pub mod builtin;
pub mod camera;
pub mod color;
pub mod context;
pub mod error;
pub mod post_processing;
pub mod renderer;
pub mod resource;
pub mod scene;

pub use crate::post_processing::RenderFeature;

/// Commonly used types, for glob imports.
pub mod prelude {
    pub use crate::builtin::*;
    pub use crate::camera::*;
    pub use crate::color::*;
    pub use crate::context::*;
    pub use crate::error::{OutlineError, Result};
    pub use crate::post_processing::*;
    pub use crate::renderer::*;
    pub use crate::resource::*;
    pub use crate::scene::*;
    pub use glamx::{Mat4, Vec3};
}
