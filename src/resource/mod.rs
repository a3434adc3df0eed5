//! GPU resources owned by the outline pass.

pub use crate::resource::dynamic_buffer::DynamicUniformBuffer;
pub use crate::resource::framebuffer_manager::OffscreenBuffers;
pub use crate::resource::scratch_targets::{
    ScratchAllocator, ScratchDescriptor, ScratchSlot, ScratchTargets, OUTLINE_TARGET_NAME,
    SCRATCH_DOWNSAMPLE, SCRATCH_FORMAT, SILHOUETTE_TARGET_NAME,
};

mod dynamic_buffer;
mod framebuffer_manager;
mod scratch_targets;
