//! Dynamic uniform buffer holding one entry per drawn object.
//!
//! The silhouette draw pushes every object's transform, flushes them to the GPU
//! in a single write and then selects each entry with a dynamic offset.

use crate::context::Context;
use bytemuck::Pod;
use std::mem;

/// A dynamic uniform buffer together with the bind group exposing it.
pub struct DynamicUniformBuffer<T: Pod> {
    /// CPU-side data accumulator
    data: Vec<u8>,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    layout: wgpu::BindGroupLayout,
    binding: u32,
    /// Current capacity in bytes
    capacity: u64,
    /// Size of each entry, padded to the device's offset alignment
    aligned_size: u64,
    count: usize,
    label: &'static str,
    _marker: std::marker::PhantomData<T>,
}

impl<T: Pod> DynamicUniformBuffer<T> {
    /// Creates a buffer with room for `initial_capacity` entries, bound at
    /// `binding` of `layout`.
    pub fn new(
        label: &'static str,
        layout: &wgpu::BindGroupLayout,
        binding: u32,
        initial_capacity: usize,
    ) -> Self {
        let ctxt = Context::get();
        let alignment = ctxt.device.limits().min_uniform_buffer_offset_alignment as u64;
        let aligned_size = (mem::size_of::<T>() as u64).div_ceil(alignment) * alignment;
        let capacity = aligned_size * initial_capacity.max(1) as u64;

        let buffer = Self::create_buffer(&ctxt, label, capacity);
        let bind_group = Self::create_bind_group(&ctxt, label, layout, binding, &buffer);

        Self {
            data: Vec::with_capacity(capacity as usize),
            buffer,
            bind_group,
            layout: layout.clone(),
            binding,
            capacity,
            aligned_size,
            count: 0,
            label,
            _marker: std::marker::PhantomData,
        }
    }

    /// The binding size every dynamic offset must address.
    pub fn entry_size() -> wgpu::BufferSize {
        wgpu::BufferSize::new(mem::size_of::<T>() as u64)
            .expect("uniform entries must not be zero-sized")
    }

    /// Number of entries pushed since the last `clear`.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the buffer contains no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Clears the buffer for the next frame without releasing memory.
    pub fn clear(&mut self) {
        self.data.clear();
        self.count = 0;
    }

    /// Pushes an entry and returns its dynamic offset.
    pub fn push(&mut self, value: &T) -> u32 {
        let offset = (self.count as u64 * self.aligned_size) as u32;

        let bytes = bytemuck::bytes_of(value);
        self.data.extend_from_slice(bytes);
        let padding = self.aligned_size as usize - bytes.len();
        self.data.extend(std::iter::repeat_n(0u8, padding));

        self.count += 1;
        offset
    }

    /// Uploads all pushed entries in one write, growing the buffer (and rebuilding
    /// its bind group) when needed.
    pub fn flush(&mut self) {
        if self.data.is_empty() {
            return;
        }

        let ctxt = Context::get();
        let required_size = self.data.len() as u64;

        if required_size > self.capacity {
            let mut new_capacity = self.capacity;
            while new_capacity < required_size {
                new_capacity *= 2;
            }

            self.buffer = Self::create_buffer(&ctxt, self.label, new_capacity);
            self.bind_group =
                Self::create_bind_group(&ctxt, self.label, &self.layout, self.binding, &self.buffer);
            self.capacity = new_capacity;
        }

        ctxt.write_buffer(&self.buffer, 0, &self.data);
    }

    /// Destroys the GPU buffer immediately.
    pub fn destroy(self) {
        self.buffer.destroy();
    }

    /// The bind group exposing this buffer.
    #[inline]
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    fn create_buffer(ctxt: &Context, label: &'static str, size: u64) -> wgpu::Buffer {
        ctxt.create_buffer_simple(
            Some(label),
            size,
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        )
    }

    fn create_bind_group(
        ctxt: &Context,
        label: &'static str,
        layout: &wgpu::BindGroupLayout,
        binding: u32,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        ctxt.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: Some(Self::entry_size()),
                }),
            }],
        })
    }
}
