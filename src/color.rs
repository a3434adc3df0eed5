//! Colors used by the outline effect.
//!
//! Outline colors are [`Color`] values with RGBA components in the range [0.0, 1.0].
//!
//! # Example
//! ```
//! use screen_space_outline::color::{self, Color};
//!
//! let orange: Color = Color::new(1.0, 0.5, 0.0, 1.0);
//! assert_eq!(color::to_wgpu(color::TRANSPARENT).a, 0.0);
//! # let _ = orange;
//! ```

pub use rgb::Rgba;

/// The color type used throughout this crate. RGBA with f32 components in [0.0, 1.0].
pub type Color = Rgba<f32>;

/// <div style="margin:2px 0"><span style="background-color:rgba(0, 0, 0, 0);padding:0 0.7em;margin-right:0.5em;border:1px solid"></span>Transparent (0, 0, 0, 0)</div>
pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

/// <div style="margin:2px 0"><span style="background-color:rgb(0, 0, 0);padding:0 0.7em;margin-right:0.5em;border:1px solid"></span>Black (0, 0, 0)</div>
pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);

/// <div style="margin:2px 0"><span style="background-color:rgb(255, 255, 255);padding:0 0.7em;margin-right:0.5em;border:1px solid"></span>White (255, 255, 255)</div>
pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

/// <div style="margin:2px 0"><span style="background-color:rgb(255, 0, 0);padding:0 0.7em;margin-right:0.5em;border:1px solid"></span>Red (255, 0, 0)</div>
pub const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);

/// <div style="margin:2px 0"><span style="background-color:rgb(255, 165, 0);padding:0 0.7em;margin-right:0.5em;border:1px solid"></span>Orange (255, 165, 0)</div>
pub const ORANGE: Color = Color::new(1.0, 0.64705884, 0.0, 1.0);

/// <div style="margin:2px 0"><span style="background-color:rgb(255, 255, 0);padding:0 0.7em;margin-right:0.5em;border:1px solid"></span>Yellow (255, 255, 0)</div>
pub const YELLOW: Color = Color::new(1.0, 1.0, 0.0, 1.0);

/// <div style="margin:2px 0"><span style="background-color:rgb(0, 255, 255);padding:0 0.7em;margin-right:0.5em;border:1px solid"></span>Cyan (0, 255, 255)</div>
pub const CYAN: Color = Color::new(0.0, 1.0, 1.0, 1.0);

/// Converts a color to the representation expected by wgpu load operations.
pub fn to_wgpu(color: Color) -> wgpu::Color {
    wgpu::Color {
        r: color.r as f64,
        g: color.g as f64,
        b: color.b as f64,
        a: color.a as f64,
    }
}

/// Converts a color to a plain array, e.g. for uniform buffers.
#[inline]
pub fn to_array(color: Color) -> [f32; 4] {
    [color.r, color.g, color.b, color.a]
}
