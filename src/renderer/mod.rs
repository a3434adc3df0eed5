//! Backends executing the outline pass.

pub use self::backend::{BlitTarget, MaterialProperty, RenderBackend, SubPass};
pub use self::outline_material::OutlineMaterial;
pub use self::recording::{RecordedCommand, RecordedMaterial, RecordedTexture, RecordingBackend};
pub use self::wgpu_backend::{CameraColorTarget, SilhouetteMesh, WgpuBackend};

mod backend;
mod outline_material;
mod recording;
mod wgpu_backend;
