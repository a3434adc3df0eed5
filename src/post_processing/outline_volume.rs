//! Parameters of the screen-space outline effect.

use crate::color::{self, Color};
use crate::post_processing::volume::VolumeComponent;

/// Smallest accepted outline width.
pub const MIN_OUTLINE_WIDTH: f32 = 1.0;
/// Largest accepted outline width.
pub const MAX_OUTLINE_WIDTH: f32 = 10.0;
/// Outline width of a fresh volume.
pub const DEFAULT_OUTLINE_WIDTH: f32 = 3.0;

/// Enable flag, color and width of the outline.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutlineVolume {
    /// Whether the outline is drawn.
    pub enabled: bool,
    /// Color of the outline.
    pub outline_color: Color,
    outline_width: f32,
}

impl Default for OutlineVolume {
    fn default() -> Self {
        OutlineVolume {
            enabled: false,
            outline_color: color::WHITE,
            outline_width: DEFAULT_OUTLINE_WIDTH,
        }
    }
}

impl OutlineVolume {
    /// An enabled outline of the given color and width.
    pub fn new(outline_color: Color, outline_width: f32) -> Self {
        let mut volume = OutlineVolume {
            enabled: true,
            outline_color,
            ..Default::default()
        };
        volume.set_outline_width(outline_width);
        volume
    }

    /// The outline width, always within `[MIN_OUTLINE_WIDTH, MAX_OUTLINE_WIDTH]`.
    pub fn outline_width(&self) -> f32 {
        clamp_width(self.outline_width)
    }

    /// Sets the outline width, clamped to `[MIN_OUTLINE_WIDTH, MAX_OUTLINE_WIDTH]`.
    pub fn set_outline_width(&mut self, width: f32) {
        self.outline_width = clamp_width(width);
    }
}

// NaN clamps to the minimum.
fn clamp_width(width: f32) -> f32 {
    if width.is_nan() {
        MIN_OUTLINE_WIDTH
    } else {
        width.clamp(MIN_OUTLINE_WIDTH, MAX_OUTLINE_WIDTH)
    }
}

impl VolumeComponent for OutlineVolume {
    fn is_active(&self) -> bool {
        self.enabled
    }

    fn is_tile_compatible(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post_processing::volume::VolumeStack;
    use proptest::prelude::*;

    #[test]
    fn default_volume_is_inactive_white_three_pixels() {
        let volume = OutlineVolume::default();
        assert!(!volume.is_active());
        assert!(!volume.is_tile_compatible());
        assert_eq!(volume.outline_color, color::WHITE);
        assert_eq!(volume.outline_width(), 3.0);
    }

    #[test]
    fn enabled_flag_drives_activity() {
        let mut volume = OutlineVolume::new(color::RED, 2.0);
        assert!(volume.is_active());
        volume.enabled = false;
        assert!(!volume.is_active());
    }

    #[test]
    fn nan_width_falls_back_to_minimum() {
        let mut volume = OutlineVolume::default();
        volume.set_outline_width(f32::NAN);
        assert_eq!(volume.outline_width(), MIN_OUTLINE_WIDTH);
    }

    #[test]
    fn volume_stack_lookup() {
        let mut stack = VolumeStack::new();
        assert!(stack.get::<OutlineVolume>().is_none());

        stack.set(OutlineVolume::new(color::CYAN, 4.0));
        assert_eq!(stack.get::<OutlineVolume>().map(|v| v.outline_width()), Some(4.0));

        if let Some(volume) = stack.get_mut::<OutlineVolume>() {
            volume.enabled = false;
        }
        assert_eq!(stack.remove::<OutlineVolume>().map(|v| v.enabled), Some(false));
        assert!(stack.get::<OutlineVolume>().is_none());
    }

    proptest! {
        #[test]
        fn width_is_always_clamped(width in proptest::num::f32::ANY) {
            let mut volume = OutlineVolume::default();
            volume.set_outline_width(width);
            let clamped = volume.outline_width();
            prop_assert!((MIN_OUTLINE_WIDTH..=MAX_OUTLINE_WIDTH).contains(&clamped));
            if (MIN_OUTLINE_WIDTH..=MAX_OUTLINE_WIDTH).contains(&width) {
                prop_assert_eq!(clamped, width);
            }
        }
    }
}
