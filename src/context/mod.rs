//! Access to the host's wgpu device.

pub use self::context::Context;

#[allow(clippy::module_inception)]
mod context;
