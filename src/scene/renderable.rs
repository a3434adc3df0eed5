//! Visible objects reported by the host's culling.

/// Render queue values up to (and including) this one are considered opaque.
pub const OPAQUE_QUEUE_MAX: u32 = 2500;

/// The highest render queue value.
pub const MAX_RENDER_QUEUE: u32 = 5000;

/// Default render queue of opaque geometry.
pub const GEOMETRY_QUEUE: u32 = 2000;

/// Default render queue of transparent geometry.
pub const TRANSPARENT_QUEUE: u32 = 3000;

/// One visible object, as reported by the host's culling.
///
/// `mesh` is whatever the render backend needs to draw the object.
#[derive(Debug, Clone, PartialEq)]
pub struct Renderable<M> {
    /// Backend-specific geometry.
    pub mesh: M,
    /// Render queue of the object's material; decides opaque vs transparent.
    pub render_queue: u32,
    /// Index of the object's layer, in `0..32`.
    pub layer: u32,
    /// Rendering-layer bits of the object.
    pub rendering_layer_mask: u32,
    /// Shader pass tag of the object's material, e.g. `"UniversalForward"`.
    pub light_mode: &'static str,
    /// Distance from the camera along its view direction.
    pub view_depth: f32,
}

impl<M> Renderable<M> {
    /// An opaque object on the default layer and rendering layer.
    pub fn new(mesh: M) -> Self {
        Renderable {
            mesh,
            render_queue: GEOMETRY_QUEUE,
            layer: 0,
            rendering_layer_mask: 1,
            light_mode: "UniversalForward",
            view_depth: 0.0,
        }
    }

    /// Sets the render queue.
    pub fn with_render_queue(mut self, render_queue: u32) -> Self {
        self.render_queue = render_queue;
        self
    }

    /// Sets the layer index.
    pub fn with_layer(mut self, layer: u32) -> Self {
        self.layer = layer;
        self
    }

    /// Sets the rendering-layer bits.
    pub fn with_rendering_layer_mask(mut self, mask: u32) -> Self {
        self.rendering_layer_mask = mask;
        self
    }

    /// Sets the shader pass tag.
    pub fn with_light_mode(mut self, light_mode: &'static str) -> Self {
        self.light_mode = light_mode;
        self
    }

    /// Sets the view depth.
    pub fn with_view_depth(mut self, view_depth: f32) -> Self {
        self.view_depth = view_depth;
        self
    }

    /// Whether the object is drawn in the transparent range of the render queue.
    #[inline]
    pub fn is_transparent(&self) -> bool {
        self.render_queue > OPAQUE_QUEUE_MAX
    }
}

/// The objects visible to the camera this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CullResults<M> {
    /// Visible objects, in no particular order.
    pub visible: Vec<Renderable<M>>,
}

impl<M> Default for CullResults<M> {
    fn default() -> Self {
        CullResults {
            visible: Vec::new(),
        }
    }
}

impl<M> CullResults<M> {
    /// Wraps the list of visible objects.
    pub fn new(visible: Vec<Renderable<M>>) -> Self {
        CullResults { visible }
    }

    /// Number of visible objects.
    pub fn len(&self) -> usize {
        self.visible.len()
    }

    /// Whether nothing is visible.
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }
}

impl<M> FromIterator<Renderable<M>> for CullResults<M> {
    fn from_iter<I: IntoIterator<Item = Renderable<M>>>(iter: I) -> Self {
        CullResults::new(iter.into_iter().collect())
    }
}
