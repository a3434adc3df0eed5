//! The host's view of the scene: visible objects and the filters selecting them.

pub use self::filtering::{
    rendering_layer_mask, DrawingSettings, FilteringSettings, LayerMask, RenderQueueFilter,
    RenderQueueRange, SortingCriteria, DEFAULT_SHADER_TAGS, MAX_RENDERING_LAYER,
};
pub use self::renderable::{
    CullResults, Renderable, GEOMETRY_QUEUE, MAX_RENDER_QUEUE, OPAQUE_QUEUE_MAX, TRANSPARENT_QUEUE,
};

mod filtering;
mod renderable;
