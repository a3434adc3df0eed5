//! Per-frame camera information handed to render passes by the host.

/// Size and format of the camera's color target for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraDescriptor {
    /// Width of the camera target, in pixels.
    pub width: u32,
    /// Height of the camera target, in pixels.
    pub height: u32,
    /// Format of the camera color target.
    pub format: wgpu::TextureFormat,
}

impl CameraDescriptor {
    /// Creates a new camera descriptor.
    pub fn new(width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        CameraDescriptor {
            width,
            height,
            format,
        }
    }
}

/// The camera a pass renders for during one frame.
///
/// `color_target` is borrowed from the host: passes draw into it in place but
/// never own, allocate or release it.
pub struct CameraData<'a, T: ?Sized> {
    /// Size and format of the camera target.
    pub descriptor: CameraDescriptor,
    /// The camera's live color target.
    pub color_target: &'a T,
}

impl<'a, T: ?Sized> CameraData<'a, T> {
    /// Bundles a descriptor with the camera target it describes.
    pub fn new(descriptor: CameraDescriptor, color_target: &'a T) -> Self {
        CameraData {
            descriptor,
            color_target,
        }
    }
}

impl<T: ?Sized> Clone for CameraData<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for CameraData<'_, T> {}
