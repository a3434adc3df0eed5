//! Half-resolution scratch targets owned by the outline pass.
//!
//! Targets are cached per descriptor: asking for the same descriptor twice in a row
//! is a no-op, and a changed descriptor releases the old texture before allocating
//! the new one.

use crate::camera::CameraDescriptor;

/// Camera resolution divisor applied to both scratch targets.
pub const SCRATCH_DOWNSAMPLE: u32 = 2;

/// Format of both scratch targets: one 8-bit channel.
pub const SCRATCH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;

/// Name of the scratch target receiving the silhouette mask.
pub const SILHOUETTE_TARGET_NAME: &str = "_RendererDrawingTexture";

/// Name of the scratch target receiving the outline mask.
pub const OUTLINE_TARGET_NAME: &str = "_OutlineTexture";

/// Description of a scratch color target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScratchDescriptor {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Texel format.
    pub format: wgpu::TextureFormat,
    /// Filtering used when the target is sampled.
    pub filter: wgpu::FilterMode,
    /// Addressing used when the target is sampled.
    pub address_mode: wgpu::AddressMode,
    /// Whether a depth buffer accompanies the color target.
    pub depth_buffer: bool,
}

impl ScratchDescriptor {
    /// The scratch descriptor matching a camera: half its resolution, single 8-bit
    /// channel, bilinear, clamped and without depth.
    pub fn for_camera(camera: &CameraDescriptor) -> Self {
        ScratchDescriptor {
            width: camera.width / SCRATCH_DOWNSAMPLE,
            height: camera.height / SCRATCH_DOWNSAMPLE,
            format: SCRATCH_FORMAT,
            filter: wgpu::FilterMode::Linear,
            address_mode: wgpu::AddressMode::ClampToEdge,
            depth_buffer: false,
        }
    }
}

/// Something able to create and destroy scratch textures.
pub trait ScratchAllocator {
    /// The texture handle produced by this allocator.
    type Texture;

    /// Allocates a texture matching `descriptor`.
    fn allocate(&mut self, descriptor: &ScratchDescriptor, name: &'static str) -> Self::Texture;
    /// Releases a texture previously returned by `allocate`.
    fn release(&mut self, texture: Self::Texture);
}

/// A single cached scratch target.
pub struct ScratchSlot<T> {
    name: &'static str,
    descriptor: Option<ScratchDescriptor>,
    texture: Option<T>,
}

impl<T> ScratchSlot<T> {
    /// Creates an empty slot. Nothing is allocated until the first `reallocate_if_needed`.
    pub fn new(name: &'static str) -> Self {
        ScratchSlot {
            name,
            descriptor: None,
            texture: None,
        }
    }

    /// The name the texture is allocated with.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The descriptor of the currently allocated texture.
    pub fn descriptor(&self) -> Option<&ScratchDescriptor> {
        self.descriptor.as_ref()
    }

    /// The currently allocated texture.
    pub fn texture(&self) -> Option<&T> {
        self.texture.as_ref()
    }

    /// Makes sure the slot holds a texture matching `descriptor`.
    ///
    /// Returns `true` if a texture was allocated.
    pub fn reallocate_if_needed<A>(&mut self, descriptor: &ScratchDescriptor, allocator: &mut A) -> bool
    where
        A: ScratchAllocator<Texture = T> + ?Sized,
    {
        if self.texture.is_some() && self.descriptor.as_ref() == Some(descriptor) {
            return false;
        }

        if let Some(old) = self.texture.take() {
            allocator.release(old);
        }

        log::debug!(
            "allocating scratch target {} ({}x{}, {:?})",
            self.name,
            descriptor.width,
            descriptor.height,
            descriptor.format
        );
        self.texture = Some(allocator.allocate(descriptor, self.name));
        self.descriptor = Some(*descriptor);
        true
    }

    /// Releases the texture, if any.
    pub fn release<A>(&mut self, allocator: &mut A)
    where
        A: ScratchAllocator<Texture = T> + ?Sized,
    {
        if let Some(texture) = self.texture.take() {
            allocator.release(texture);
        }
        self.descriptor = None;
    }
}

/// The two scratch targets of the outline pass: the silhouette mask and the outline mask.
pub struct ScratchTargets<T> {
    silhouette: ScratchSlot<T>,
    outline: ScratchSlot<T>,
}

impl<T> Default for ScratchTargets<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ScratchTargets<T> {
    /// Creates both slots, unallocated.
    pub fn new() -> Self {
        ScratchTargets {
            silhouette: ScratchSlot::new(SILHOUETTE_TARGET_NAME),
            outline: ScratchSlot::new(OUTLINE_TARGET_NAME),
        }
    }

    /// The silhouette mask target.
    pub fn silhouette(&self) -> Option<&T> {
        self.silhouette.texture()
    }

    /// The outline mask target.
    pub fn outline(&self) -> Option<&T> {
        self.outline.texture()
    }

    /// The descriptor both targets were last allocated with.
    pub fn descriptor(&self) -> Option<&ScratchDescriptor> {
        self.silhouette.descriptor()
    }

    /// Reallocates both targets if `descriptor` differs from the cached one.
    ///
    /// Returns `true` if anything was allocated.
    pub fn reallocate_if_needed<A>(&mut self, descriptor: &ScratchDescriptor, allocator: &mut A) -> bool
    where
        A: ScratchAllocator<Texture = T> + ?Sized,
    {
        let silhouette = self.silhouette.reallocate_if_needed(descriptor, allocator);
        let outline = self.outline.reallocate_if_needed(descriptor, allocator);
        silhouette || outline
    }

    /// Releases both targets.
    pub fn release<A>(&mut self, allocator: &mut A)
    where
        A: ScratchAllocator<Texture = T> + ?Sized,
    {
        self.silhouette.release(allocator);
        self.outline.release(allocator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Default)]
    struct CountingAllocator {
        allocated: Vec<(&'static str, ScratchDescriptor)>,
        released: usize,
    }

    impl ScratchAllocator for CountingAllocator {
        type Texture = usize;

        fn allocate(&mut self, descriptor: &ScratchDescriptor, name: &'static str) -> usize {
            self.allocated.push((name, *descriptor));
            self.allocated.len()
        }

        fn release(&mut self, _: usize) {
            self.released += 1;
        }
    }

    fn camera(width: u32, height: u32) -> CameraDescriptor {
        CameraDescriptor::new(width, height, wgpu::TextureFormat::Rgba8UnormSrgb)
    }

    #[test]
    fn descriptor_is_half_resolution_r8_without_depth() {
        let desc = ScratchDescriptor::for_camera(&camera(1921, 1081));
        assert_eq!((desc.width, desc.height), (960, 540));
        assert_eq!(desc.format, wgpu::TextureFormat::R8Unorm);
        assert_eq!(desc.filter, wgpu::FilterMode::Linear);
        assert_eq!(desc.address_mode, wgpu::AddressMode::ClampToEdge);
        assert!(!desc.depth_buffer);
    }

    #[test]
    fn tiny_camera_yields_empty_descriptor() {
        let desc = ScratchDescriptor::for_camera(&camera(1, 1));
        assert_eq!((desc.width, desc.height), (0, 0));
    }

    #[test]
    fn repeated_descriptor_does_not_reallocate() {
        let mut allocator = CountingAllocator::default();
        let mut targets = ScratchTargets::new();
        let desc = ScratchDescriptor::for_camera(&camera(800, 600));

        assert!(targets.reallocate_if_needed(&desc, &mut allocator));
        assert!(!targets.reallocate_if_needed(&desc, &mut allocator));
        assert!(!targets.reallocate_if_needed(&desc, &mut allocator));

        assert_eq!(allocator.allocated.len(), 2);
        assert_eq!(allocator.allocated[0].0, SILHOUETTE_TARGET_NAME);
        assert_eq!(allocator.allocated[1].0, OUTLINE_TARGET_NAME);
        assert_eq!(allocator.released, 0);
    }

    #[test]
    fn changed_descriptor_releases_then_reallocates() {
        let mut allocator = CountingAllocator::default();
        let mut targets = ScratchTargets::new();

        targets.reallocate_if_needed(&ScratchDescriptor::for_camera(&camera(800, 600)), &mut allocator);
        targets.reallocate_if_needed(&ScratchDescriptor::for_camera(&camera(1024, 768)), &mut allocator);

        assert_eq!(allocator.allocated.len(), 4);
        assert_eq!(allocator.released, 2);
        assert_eq!(targets.descriptor().map(|d| (d.width, d.height)), Some((512, 384)));
    }

    #[test]
    fn format_change_of_same_size_reallocates() {
        let mut allocator = CountingAllocator::default();
        let mut slot = ScratchSlot::new("slot");
        let mut desc = ScratchDescriptor::for_camera(&camera(64, 64));

        assert!(slot.reallocate_if_needed(&desc, &mut allocator));
        desc.format = wgpu::TextureFormat::Rgba8Unorm;
        assert!(slot.reallocate_if_needed(&desc, &mut allocator));
        assert_eq!(allocator.released, 1);
    }

    #[test]
    fn release_is_safe_when_never_allocated() {
        let mut allocator = CountingAllocator::default();
        let mut targets: ScratchTargets<usize> = ScratchTargets::new();
        targets.release(&mut allocator);
        assert_eq!(allocator.released, 0);
        assert!(targets.silhouette().is_none());
    }

    proptest! {
        #[test]
        fn scratch_size_is_floor_half(width in 0u32..16_384, height in 0u32..16_384) {
            let desc = ScratchDescriptor::for_camera(&camera(width, height));
            prop_assert_eq!(desc.width, width / 2);
            prop_assert_eq!(desc.height, height / 2);
        }

        #[test]
        fn one_allocation_per_distinct_resolution(
            sizes in proptest::collection::vec((1u32..64, 1u32..64), 1..32)
        ) {
            let mut allocator = CountingAllocator::default();
            let mut targets = ScratchTargets::new();
            let mut expected = 0;
            let mut previous = None;

            for (w, h) in sizes {
                let desc = ScratchDescriptor::for_camera(&camera(w, h));
                if previous != Some(desc) {
                    expected += 2;
                }
                previous = Some(desc);
                targets.reallocate_if_needed(&desc, &mut allocator);
            }

            prop_assert_eq!(allocator.allocated.len(), expected);
        }
    }
}
