//! Built-in shader assets.

pub use self::outline_shader::{
    OutlineShader, COMPOSITE_FRAGMENT_ENTRY, EDGE_DETECT_FRAGMENT_ENTRY, FULLSCREEN_VERTEX_ENTRY,
    OUTLINE_WGSL, SILHOUETTE_FRAGMENT_ENTRY, SILHOUETTE_VERTEX_ENTRY,
};

mod outline_shader;
