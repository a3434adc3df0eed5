//! wgpu rendering context management.
//!
//! The outline pass does not own a device. The host hands its device and queue
//! over once with [`Context::init`] and every GPU resource of this crate is then
//! created through [`Context::get`].

use std::cell::RefCell;
use std::sync::Arc;

use crate::error::{OutlineError, Result};

// The global wgpu context singleton.
// RefCell<Option<>> instead of OnceLock so the host can reset it when its device is lost.
thread_local! {
    static CONTEXT_SINGLETON: RefCell<Option<Context>> = const { RefCell::new(None) };
}

/// The wgpu rendering context shared by the outline materials and scratch targets.
///
/// Cloning is cheap: the device and queue are reference counted.
#[derive(Clone)]
pub struct Context {
    /// The wgpu device used for creating GPU resources.
    pub device: Arc<wgpu::Device>,
    /// The wgpu queue used for submitting commands.
    pub queue: Arc<wgpu::Queue>,
    /// The format of the host's camera color targets.
    pub surface_format: wgpu::TextureFormat,
}

impl Context {
    /// Initializes or reinitializes the global wgpu context.
    ///
    /// # Arguments
    /// * `device` - The wgpu device
    /// * `queue` - The wgpu queue
    /// * `surface_format` - The format of the camera color targets
    pub fn init(device: wgpu::Device, queue: wgpu::Queue, surface_format: wgpu::TextureFormat) {
        Self::init_shared(Arc::new(device), Arc::new(queue), surface_format)
    }

    /// Same as [`Context::init`] for hosts that already keep their device behind an `Arc`.
    pub fn init_shared(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        surface_format: wgpu::TextureFormat,
    ) {
        CONTEXT_SINGLETON.with(|cell| {
            *cell.borrow_mut() = Some(Context {
                device,
                queue,
                surface_format,
            });
        });
    }

    /// Gets a clone of the global wgpu context.
    ///
    /// # Panics
    /// Panics if the context has not been initialized via `init()`.
    pub fn get() -> Context {
        CONTEXT_SINGLETON.with(|cell| {
            cell.borrow()
                .as_ref()
                .expect("wgpu context not initialized. Call Context::init() first.")
                .clone()
        })
    }

    /// Gets a clone of the global wgpu context, or an error if it was never initialized.
    pub fn try_get() -> Result<Context> {
        CONTEXT_SINGLETON.with(|cell| cell.borrow().clone().ok_or(OutlineError::ContextUninitialized))
    }

    /// Checks if the context has been initialized.
    pub fn is_initialized() -> bool {
        CONTEXT_SINGLETON.with(|cell| cell.borrow().is_some())
    }

    /// Resets the global wgpu context.
    ///
    /// Resources created before the reset stay valid for as long as they are
    /// alive, but `get()` panics until `init()` is called again.
    pub fn reset() {
        CONTEXT_SINGLETON.with(|cell| {
            *cell.borrow_mut() = None;
        });
    }

    /// Creates a new buffer on the GPU with specified parameters.
    ///
    /// # Arguments
    /// * `label` - Debug label for the buffer
    /// * `size` - Size of the buffer in bytes
    /// * `usage` - Buffer usage flags
    pub fn create_buffer_simple(
        &self,
        label: Option<&str>,
        size: u64,
        usage: wgpu::BufferUsages,
    ) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label,
            size,
            usage,
            mapped_at_creation: false,
        })
    }

    /// Creates a new buffer initialized with data.
    ///
    /// # Arguments
    /// * `label` - Debug label for the buffer
    /// * `contents` - The data to initialize the buffer with
    /// * `usage` - Buffer usage flags
    pub fn create_buffer_init(
        &self,
        label: Option<&str>,
        contents: &[u8],
        usage: wgpu::BufferUsages,
    ) -> wgpu::Buffer {
        use wgpu::util::DeviceExt;
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label,
                contents,
                usage,
            })
    }

    /// Writes data to a buffer.
    pub fn write_buffer(&self, buffer: &wgpu::Buffer, offset: u64, data: &[u8]) {
        self.queue.write_buffer(buffer, offset, data);
    }

    /// Creates a new texture on the GPU.
    pub fn create_texture(&self, desc: &wgpu::TextureDescriptor) -> wgpu::Texture {
        self.device.create_texture(desc)
    }

    /// Creates a new sampler.
    pub fn create_sampler(&self, desc: &wgpu::SamplerDescriptor) -> wgpu::Sampler {
        self.device.create_sampler(desc)
    }

    /// Creates a new bind group layout.
    pub fn create_bind_group_layout(
        &self,
        desc: &wgpu::BindGroupLayoutDescriptor,
    ) -> wgpu::BindGroupLayout {
        self.device.create_bind_group_layout(desc)
    }

    /// Creates a new bind group.
    pub fn create_bind_group(&self, desc: &wgpu::BindGroupDescriptor) -> wgpu::BindGroup {
        self.device.create_bind_group(desc)
    }

    /// Creates a new pipeline layout.
    pub fn create_pipeline_layout(
        &self,
        desc: &wgpu::PipelineLayoutDescriptor,
    ) -> wgpu::PipelineLayout {
        self.device.create_pipeline_layout(desc)
    }

    /// Creates a new render pipeline.
    pub fn create_render_pipeline(
        &self,
        desc: &wgpu::RenderPipelineDescriptor,
    ) -> wgpu::RenderPipeline {
        self.device.create_render_pipeline(desc)
    }

    /// Creates a new shader module from WGSL source.
    ///
    /// # Arguments
    /// * `label` - Debug label for the shader
    /// * `source` - WGSL shader source code
    pub fn create_shader_module(&self, label: Option<&str>, source: &str) -> wgpu::ShaderModule {
        self.device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label,
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
    }

    /// Creates a new command encoder.
    pub fn create_command_encoder(&self, label: Option<&str>) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label })
    }

    /// Submits command buffers to the GPU queue.
    pub fn submit<I: IntoIterator<Item = wgpu::CommandBuffer>>(&self, command_buffers: I) {
        self.queue.submit(command_buffers);
    }

    /// Runs `f` inside a validation error scope and reports the first validation error.
    ///
    /// On the web the scope cannot be awaited synchronously, so errors are left to
    /// the device's uncaptured error handler and `Ok` is always returned.
    pub fn with_validation<T>(&self, f: impl FnOnce(&Context) -> T) -> std::result::Result<T, String> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f(self);
        let scope = self.device.pop_error_scope();

        #[cfg(not(target_arch = "wasm32"))]
        if let Some(error) = pollster::block_on(scope) {
            return Err(error.to_string());
        }
        #[cfg(target_arch = "wasm32")]
        drop(scope);

        Ok(value)
    }
}
