//! Error type shared by the outline feature and its backends.

use thiserror::Error;

/// Result alias for fallible operations of this crate.
pub type Result<T> = std::result::Result<T, OutlineError>;

/// Errors raised while configuring or constructing the outline pass.
#[derive(Debug, Error)]
pub enum OutlineError {
    /// A render-queue filter value read from configuration is out of range.
    ///
    /// This signals a corrupted configuration and aborts feature initialization.
    #[error("invalid render queue filter value {0} (expected 0 = all, 1 = opaque, 2 = transparent)")]
    InvalidQueueFilter(i32),
    /// The outline shader does not define one of the required entry points.
    #[error("outline shader `{shader}` is missing the `{entry_point}` entry point")]
    MissingEntryPoint {
        /// Label of the offending shader.
        shader: String,
        /// Name of the missing entry point.
        entry_point: &'static str,
    },
    /// The device rejected the outline shader or one of its pipelines.
    #[error("failed to build the outline material from `{shader}`: {message}")]
    ShaderCompilation {
        /// Label of the offending shader.
        shader: String,
        /// Validation message reported by the device.
        message: String,
    },
    /// The global wgpu context was used before `Context::init`.
    #[error("wgpu context not initialized; call Context::init() first")]
    ContextUninitialized,
}
