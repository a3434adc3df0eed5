//! A backend that records commands instead of executing them.
//!
//! Useful to check what a pass does without a GPU.

use std::collections::BTreeSet;

use crate::builtin::OutlineShader;
use crate::color::Color;
use crate::error::{OutlineError, Result};
use crate::renderer::backend::{BlitTarget, MaterialProperty, RenderBackend, SubPass};
use crate::resource::{ScratchAllocator, ScratchDescriptor};
use crate::scene::Renderable;

/// Texture handle handed out by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTexture {
    /// Unique id of the allocation.
    pub id: usize,
    /// Name the texture was allocated with.
    pub name: &'static str,
    /// Descriptor the texture was allocated with.
    pub descriptor: ScratchDescriptor,
}

/// Material handle handed out by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedMaterial {
    /// Unique id of the material.
    pub id: usize,
    /// Label of the shader it was built from.
    pub shader: String,
    /// Last color written to `_OutlineColor`.
    pub outline_color: Option<Color>,
    /// Last value written to `_OutlineWidth`.
    pub outline_width: Option<f32>,
}

/// One recorded command.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand<M> {
    /// A material was built.
    CreateMaterial { material: usize, shader: String },
    /// A material was destroyed.
    DestroyMaterial { material: usize },
    /// A scratch texture was allocated.
    Allocate {
        texture: usize,
        name: &'static str,
        descriptor: ScratchDescriptor,
    },
    /// A scratch texture was released.
    Release { texture: usize, name: &'static str },
    /// A color property was written.
    SetColor {
        material: usize,
        property: MaterialProperty,
        value: Color,
    },
    /// A float property was written.
    SetFloat {
        material: usize,
        property: MaterialProperty,
        value: f32,
    },
    /// A profiling scope was opened.
    BeginScope(String),
    /// The innermost profiling scope was closed.
    EndScope,
    /// A scratch target was cleared.
    Clear { target: &'static str, color: Color },
    /// Geometry was drawn with an override material.
    DrawRenderers {
        target: &'static str,
        meshes: Vec<M>,
        pass: SubPass,
    },
    /// A full-screen pass was run.
    Blit {
        source: &'static str,
        destination: String,
        pass: SubPass,
    },
}

/// A [`RenderBackend`] that records every call.
///
/// The camera target is identified by name (`&str`) and meshes by any cloneable value.
pub struct RecordingBackend<M = u32> {
    commands: Vec<RecordedCommand<M>>,
    live_textures: BTreeSet<usize>,
    live_materials: BTreeSet<usize>,
    next_id: usize,
    fail_materials: bool,
}

impl<M> Default for RecordingBackend<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> RecordingBackend<M> {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        RecordingBackend {
            commands: Vec::new(),
            live_textures: BTreeSet::new(),
            live_materials: BTreeSet::new(),
            next_id: 0,
            fail_materials: false,
        }
    }

    /// Makes every following `create_material` call fail, as a device rejecting the shader would.
    pub fn fail_materials(&mut self, fail: bool) {
        self.fail_materials = fail;
    }

    /// All commands recorded so far.
    pub fn commands(&self) -> &[RecordedCommand<M>] {
        &self.commands
    }

    /// Removes and returns all commands recorded so far.
    pub fn take_commands(&mut self) -> Vec<RecordedCommand<M>> {
        std::mem::take(&mut self.commands)
    }

    /// Number of texture allocations recorded so far.
    pub fn allocation_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RecordedCommand::Allocate { .. }))
            .count()
    }

    /// Number of geometry draws and blits recorded so far.
    pub fn draw_call_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    RecordedCommand::DrawRenderers { .. } | RecordedCommand::Blit { .. }
                )
            })
            .count()
    }

    /// Number of textures allocated and not yet released.
    pub fn live_texture_count(&self) -> usize {
        self.live_textures.len()
    }

    /// Number of materials created and not yet destroyed.
    pub fn live_material_count(&self) -> usize {
        self.live_materials.len()
    }

    fn next_id(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }
}

impl<M> ScratchAllocator for RecordingBackend<M> {
    type Texture = RecordedTexture;

    fn allocate(&mut self, descriptor: &ScratchDescriptor, name: &'static str) -> RecordedTexture {
        let id = self.next_id();
        self.live_textures.insert(id);
        self.commands.push(RecordedCommand::Allocate {
            texture: id,
            name,
            descriptor: *descriptor,
        });
        RecordedTexture {
            id,
            name,
            descriptor: *descriptor,
        }
    }

    fn release(&mut self, texture: RecordedTexture) {
        self.live_textures.remove(&texture.id);
        self.commands.push(RecordedCommand::Release {
            texture: texture.id,
            name: texture.name,
        });
    }
}

impl<M: Clone> RenderBackend for RecordingBackend<M> {
    type Material = RecordedMaterial;
    type Mesh = M;
    type CameraTarget = str;

    fn create_material(&mut self, shader: &OutlineShader) -> Result<RecordedMaterial> {
        if self.fail_materials {
            return Err(OutlineError::ShaderCompilation {
                shader: shader.label.to_string(),
                message: "rejected by the recording backend".to_string(),
            });
        }

        shader.validate()?;

        let id = self.next_id();
        self.live_materials.insert(id);
        self.commands.push(RecordedCommand::CreateMaterial {
            material: id,
            shader: shader.label.to_string(),
        });
        Ok(RecordedMaterial {
            id,
            shader: shader.label.to_string(),
            outline_color: None,
            outline_width: None,
        })
    }

    fn destroy_material(&mut self, material: RecordedMaterial) {
        self.live_materials.remove(&material.id);
        self.commands
            .push(RecordedCommand::DestroyMaterial { material: material.id });
    }

    fn set_color(&mut self, material: &mut RecordedMaterial, property: MaterialProperty, value: Color) {
        if property == MaterialProperty::OutlineColor {
            material.outline_color = Some(value);
        }
        self.commands.push(RecordedCommand::SetColor {
            material: material.id,
            property,
            value,
        });
    }

    fn set_float(&mut self, material: &mut RecordedMaterial, property: MaterialProperty, value: f32) {
        if property == MaterialProperty::OutlineWidth {
            material.outline_width = Some(value);
        }
        self.commands.push(RecordedCommand::SetFloat {
            material: material.id,
            property,
            value,
        });
    }

    fn begin_scope(&mut self, name: &str) {
        self.commands.push(RecordedCommand::BeginScope(name.to_string()));
    }

    fn end_scope(&mut self) {
        self.commands.push(RecordedCommand::EndScope);
    }

    fn clear(&mut self, target: &RecordedTexture, color: Color) {
        self.commands.push(RecordedCommand::Clear {
            target: target.name,
            color,
        });
    }

    fn draw_renderers(
        &mut self,
        target: &RecordedTexture,
        renderables: &[&Renderable<M>],
        _: &mut RecordedMaterial,
        pass: SubPass,
    ) {
        self.commands.push(RecordedCommand::DrawRenderers {
            target: target.name,
            meshes: renderables.iter().map(|r| r.mesh.clone()).collect(),
            pass,
        });
    }

    fn blit(
        &mut self,
        source: &RecordedTexture,
        destination: BlitTarget<'_, RecordedTexture, str>,
        _: &mut RecordedMaterial,
        pass: SubPass,
    ) {
        let destination = match destination {
            BlitTarget::Scratch(texture) => texture.name.to_string(),
            BlitTarget::Camera(camera) => camera.to_string(),
        };
        self.commands.push(RecordedCommand::Blit {
            source: source.name,
            destination,
            pass,
        });
    }
}
