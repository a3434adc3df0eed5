//! The seam between the outline pass and the device it records commands for.

use crate::builtin::OutlineShader;
use crate::color::Color;
use crate::error::Result;
use crate::resource::ScratchAllocator;
use crate::scene::Renderable;

/// The sub-passes of the outline shader, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubPass {
    /// Draws the filtered geometry as a mask.
    Silhouette = 0,
    /// Turns the silhouette mask into an outline mask.
    EdgeDetect = 1,
    /// Blends the outline mask onto the camera target.
    Composite = 2,
}

impl SubPass {
    /// The sub-pass index inside the outline shader.
    #[inline]
    pub fn index(self) -> u32 {
        self as u32
    }
}

/// The material properties written by the outline pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialProperty {
    /// RGBA color of the outline.
    OutlineColor,
    /// Outline width, in camera pixels.
    OutlineWidth,
}

impl MaterialProperty {
    /// The property name exposed by the shader asset.
    pub fn name(self) -> &'static str {
        match self {
            MaterialProperty::OutlineColor => "_OutlineColor",
            MaterialProperty::OutlineWidth => "_OutlineWidth",
        }
    }
}

/// Where a full-screen blit writes.
pub enum BlitTarget<'a, T, C: ?Sized> {
    /// One of the pass's own scratch targets.
    Scratch(&'a T),
    /// The camera color target borrowed for this frame; its content is kept and blended over.
    Camera(&'a C),
}

/// A device able to run the outline pass.
///
/// Commands are recorded in call order; a backend must execute them in that order.
pub trait RenderBackend: ScratchAllocator {
    /// Material built from an [`OutlineShader`].
    type Material;
    /// Geometry the host attaches to its [`Renderable`]s.
    type Mesh;
    /// The camera color target the host lends for one frame.
    type CameraTarget: ?Sized;

    /// Builds the material of `shader`.
    fn create_material(&mut self, shader: &OutlineShader) -> Result<Self::Material>;
    /// Destroys a material built by `create_material`.
    fn destroy_material(&mut self, material: Self::Material);

    /// Sets a color property of `material`.
    fn set_color(&mut self, material: &mut Self::Material, property: MaterialProperty, value: Color);
    /// Sets a float property of `material`.
    fn set_float(&mut self, material: &mut Self::Material, property: MaterialProperty, value: f32);

    /// Opens a named debug/profiling scope.
    fn begin_scope(&mut self, name: &str);
    /// Closes the innermost scope.
    fn end_scope(&mut self);

    /// Clears a scratch target.
    fn clear(&mut self, target: &Self::Texture, color: Color);
    /// Draws `renderables`, in order, with `material`'s `pass` instead of their own materials.
    fn draw_renderers(
        &mut self,
        target: &Self::Texture,
        renderables: &[&Renderable<Self::Mesh>],
        material: &mut Self::Material,
        pass: SubPass,
    );
    /// Runs `material`'s `pass` over the whole of `destination`, sampling `source`.
    fn blit(
        &mut self,
        source: &Self::Texture,
        destination: BlitTarget<'_, Self::Texture, Self::CameraTarget>,
        material: &mut Self::Material,
        pass: SubPass,
    );
}
