//! Selection and ordering of the objects drawn by the silhouette pass.

use std::cmp::Ordering;

use bitflags::bitflags;

use crate::error::OutlineError;
use crate::scene::renderable::{CullResults, Renderable, MAX_RENDER_QUEUE, OPAQUE_QUEUE_MAX};

/// Inclusive range of render queue values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderQueueRange {
    /// Lowest accepted render queue.
    pub lower: u32,
    /// Highest accepted render queue.
    pub upper: u32,
}

impl RenderQueueRange {
    /// Every render queue.
    pub const ALL: RenderQueueRange = RenderQueueRange {
        lower: 0,
        upper: MAX_RENDER_QUEUE,
    };
    /// Opaque render queues.
    pub const OPAQUE: RenderQueueRange = RenderQueueRange {
        lower: 0,
        upper: OPAQUE_QUEUE_MAX,
    };
    /// Transparent render queues.
    pub const TRANSPARENT: RenderQueueRange = RenderQueueRange {
        lower: OPAQUE_QUEUE_MAX + 1,
        upper: MAX_RENDER_QUEUE,
    };

    /// Whether `queue` lies in this range.
    #[inline]
    pub fn contains(&self, queue: u32) -> bool {
        (self.lower..=self.upper).contains(&queue)
    }
}

/// Designer-facing choice of the render queues contributing to the silhouette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "i32", into = "i32")
)]
pub enum RenderQueueFilter {
    /// Opaque and transparent objects.
    All,
    /// Opaque objects only.
    #[default]
    Opaque,
    /// Transparent objects only.
    Transparent,
}

impl RenderQueueFilter {
    /// The render queue range selected by this filter.
    pub fn range(self) -> RenderQueueRange {
        match self {
            RenderQueueFilter::All => RenderQueueRange::ALL,
            RenderQueueFilter::Opaque => RenderQueueRange::OPAQUE,
            RenderQueueFilter::Transparent => RenderQueueRange::TRANSPARENT,
        }
    }
}

impl TryFrom<i32> for RenderQueueFilter {
    type Error = OutlineError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RenderQueueFilter::All),
            1 => Ok(RenderQueueFilter::Opaque),
            2 => Ok(RenderQueueFilter::Transparent),
            other => Err(OutlineError::InvalidQueueFilter(other)),
        }
    }
}

impl From<RenderQueueFilter> for i32 {
    fn from(filter: RenderQueueFilter) -> i32 {
        match filter {
            RenderQueueFilter::All => 0,
            RenderQueueFilter::Opaque => 1,
            RenderQueueFilter::Transparent => 2,
        }
    }
}

bitflags! {
    /// Set of object layers, one bit per layer index.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct LayerMask: u32 {
        /// The layer objects are placed on unless told otherwise.
        const DEFAULT = 1;
        const _ = !0;
    }
}

impl LayerMask {
    /// The mask containing only layer `index`. Indices past 31 give an empty mask.
    pub fn layer(index: u32) -> Self {
        LayerMask::from_bits_retain(1u32.checked_shl(index).unwrap_or(0))
    }

    /// Whether layer `index` is part of this mask.
    pub fn contains_layer(self, index: u32) -> bool {
        !(self & LayerMask::layer(index)).is_empty()
    }
}

/// Highest rendering-layer index a designer may pick.
pub const MAX_RENDERING_LAYER: u32 = 32;

/// Converts a rendering-layer index into its bit mask.
///
/// The shift amount wraps at 32 bits, so index `32` (and anything clamped to it)
/// gives the same mask as index `0`.
pub fn rendering_layer_mask(index: u32) -> u32 {
    1u32.wrapping_shl(index.min(MAX_RENDERING_LAYER))
}

/// Which visible objects take part in a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilteringSettings {
    /// Accepted render queues.
    pub render_queue_range: RenderQueueRange,
    /// Accepted object layers.
    pub layer_mask: LayerMask,
    /// Accepted rendering layers; an object needs at least one bit in common.
    pub rendering_layer_mask: u32,
}

impl FilteringSettings {
    /// Builds filtering settings.
    pub fn new(
        render_queue_range: RenderQueueRange,
        layer_mask: LayerMask,
        rendering_layer_mask: u32,
    ) -> Self {
        FilteringSettings {
            render_queue_range,
            layer_mask,
            rendering_layer_mask,
        }
    }

    /// Whether `renderable` passes the filters.
    pub fn accepts<M>(&self, renderable: &Renderable<M>) -> bool {
        self.render_queue_range.contains(renderable.render_queue)
            && self.layer_mask.contains_layer(renderable.layer)
            && self.rendering_layer_mask & renderable.rendering_layer_mask != 0
    }
}

bitflags! {
    /// How the objects of a draw are ordered.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SortingCriteria: u32 {
        /// Opaque objects front-to-back, by render queue.
        const COMMON_OPAQUE = 1;
        /// Transparent objects back-to-front, by render queue.
        const COMMON_TRANSPARENT = 1 << 1;
    }
}

/// Shader pass tags accepted by the silhouette draw by default.
pub const DEFAULT_SHADER_TAGS: [&str; 3] =
    ["SRPDefaultUnlit", "UniversalForward", "UniversalForwardOnly"];

/// How the selected objects are drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawingSettings {
    /// Objects whose shader pass tag is not listed here are skipped.
    pub shader_tags: Vec<&'static str>,
    /// Draw order.
    pub sorting: SortingCriteria,
}

impl Default for DrawingSettings {
    fn default() -> Self {
        DrawingSettings {
            shader_tags: DEFAULT_SHADER_TAGS.to_vec(),
            sorting: SortingCriteria::COMMON_OPAQUE | SortingCriteria::COMMON_TRANSPARENT,
        }
    }
}

impl DrawingSettings {
    /// Filters `cull` and returns the accepted objects in draw order.
    pub fn select<'a, M>(
        &self,
        cull: &'a CullResults<M>,
        filtering: &FilteringSettings,
    ) -> Vec<&'a Renderable<M>> {
        let mut selected: Vec<_> = cull
            .visible
            .iter()
            .filter(|r| filtering.accepts(r) && self.shader_tags.contains(&r.light_mode))
            .collect();
        selected.sort_by(|a, b| self.compare(a, b));
        selected
    }

    fn compare<M>(&self, a: &Renderable<M>, b: &Renderable<M>) -> Ordering {
        a.render_queue.cmp(&b.render_queue).then_with(|| {
            // Same queue, so both share the same transparency.
            if a.is_transparent() {
                if self.sorting.contains(SortingCriteria::COMMON_TRANSPARENT) {
                    return b.view_depth.total_cmp(&a.view_depth);
                }
            } else if self.sorting.contains(SortingCriteria::COMMON_OPAQUE) {
                return a.view_depth.total_cmp(&b.view_depth);
            }
            Ordering::Equal
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::renderable::{GEOMETRY_QUEUE, TRANSPARENT_QUEUE};

    fn everything() -> FilteringSettings {
        FilteringSettings::new(RenderQueueRange::ALL, LayerMask::all(), u32::MAX)
    }

    #[test]
    fn queue_filter_ranges() {
        assert!(RenderQueueFilter::Opaque.range().contains(2500));
        assert!(!RenderQueueFilter::Opaque.range().contains(2501));
        assert!(RenderQueueFilter::Transparent.range().contains(2501));
        assert!(!RenderQueueFilter::Transparent.range().contains(2000));
        assert!(RenderQueueFilter::All.range().contains(0));
        assert!(RenderQueueFilter::All.range().contains(5000));
    }

    #[test]
    fn queue_filter_from_raw_values() {
        assert_eq!(RenderQueueFilter::try_from(0).ok(), Some(RenderQueueFilter::All));
        assert_eq!(RenderQueueFilter::try_from(1).ok(), Some(RenderQueueFilter::Opaque));
        assert_eq!(
            RenderQueueFilter::try_from(2).ok(),
            Some(RenderQueueFilter::Transparent)
        );
        assert!(matches!(
            RenderQueueFilter::try_from(3),
            Err(OutlineError::InvalidQueueFilter(3))
        ));
        assert!(matches!(
            RenderQueueFilter::try_from(-1),
            Err(OutlineError::InvalidQueueFilter(-1))
        ));
        assert_eq!(i32::from(RenderQueueFilter::Transparent), 2);
    }

    #[test]
    fn rendering_layer_index_to_mask() {
        assert_eq!(rendering_layer_mask(0), 1);
        assert_eq!(rendering_layer_mask(5), 1 << 5);
        assert_eq!(rendering_layer_mask(31), 1 << 31);
        assert_eq!(rendering_layer_mask(32), 1);
        assert_eq!(rendering_layer_mask(100), 1);
    }

    #[test]
    fn layer_mask_membership() {
        let mask = LayerMask::layer(3) | LayerMask::DEFAULT;
        assert!(mask.contains_layer(0));
        assert!(mask.contains_layer(3));
        assert!(!mask.contains_layer(4));
        assert!(!LayerMask::all().contains_layer(40));
        assert!(!LayerMask::empty().contains_layer(0));
    }

    #[test]
    fn filtering_checks_queue_layer_and_rendering_layer() {
        let filtering = FilteringSettings::new(RenderQueueRange::OPAQUE, LayerMask::layer(2), 0b100);
        let good = Renderable::new(0).with_layer(2).with_rendering_layer_mask(0b110);

        assert!(filtering.accepts(&good));
        assert!(!filtering.accepts(&good.clone().with_render_queue(TRANSPARENT_QUEUE)));
        assert!(!filtering.accepts(&good.clone().with_layer(1)));
        assert!(!filtering.accepts(&good.clone().with_rendering_layer_mask(0b001)));
    }

    #[test]
    fn select_skips_unknown_shader_tags() {
        let cull = CullResults::new(vec![
            Renderable::new(1),
            Renderable::new(2).with_light_mode("ShadowCaster"),
            Renderable::new(3).with_light_mode("SRPDefaultUnlit"),
        ]);
        let selected = DrawingSettings::default().select(&cull, &everything());
        let meshes: Vec<_> = selected.iter().map(|r| r.mesh).collect();
        assert_eq!(meshes, vec![1, 3]);
    }

    #[test]
    fn opaque_front_to_back_then_transparent_back_to_front() {
        let cull = CullResults::new(vec![
            Renderable::new("far transparent")
                .with_render_queue(TRANSPARENT_QUEUE)
                .with_view_depth(10.0),
            Renderable::new("far opaque").with_view_depth(8.0),
            Renderable::new("near transparent")
                .with_render_queue(TRANSPARENT_QUEUE)
                .with_view_depth(1.0),
            Renderable::new("near opaque").with_view_depth(2.0),
            Renderable::new("alpha test")
                .with_render_queue(GEOMETRY_QUEUE + 450)
                .with_view_depth(0.5),
        ]);

        let selected = DrawingSettings::default().select(&cull, &everything());
        let order: Vec<_> = selected.iter().map(|r| r.mesh).collect();
        assert_eq!(
            order,
            vec![
                "near opaque",
                "far opaque",
                "alpha test",
                "far transparent",
                "near transparent"
            ]
        );
    }
}
