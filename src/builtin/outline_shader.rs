//! The shader asset driving the three outline sub-passes.

use std::borrow::Cow;

use crate::error::{OutlineError, Result};

/// WGSL source of the default outline shader.
pub const OUTLINE_WGSL: &str = include_str!("outline.wgsl");

/// Vertex entry point of the silhouette sub-pass.
pub const SILHOUETTE_VERTEX_ENTRY: &str = "vs_silhouette";
/// Fragment entry point of the silhouette sub-pass.
pub const SILHOUETTE_FRAGMENT_ENTRY: &str = "fs_silhouette";
/// Vertex entry point shared by the two full-screen sub-passes.
pub const FULLSCREEN_VERTEX_ENTRY: &str = "vs_fullscreen";
/// Fragment entry point of the edge-detection sub-pass.
pub const EDGE_DETECT_FRAGMENT_ENTRY: &str = "fs_edge_detect";
/// Fragment entry point of the composite sub-pass.
pub const COMPOSITE_FRAGMENT_ENTRY: &str = "fs_composite";

const ENTRY_POINTS: [&str; 5] = [
    SILHOUETTE_VERTEX_ENTRY,
    SILHOUETTE_FRAGMENT_ENTRY,
    FULLSCREEN_VERTEX_ENTRY,
    EDGE_DETECT_FRAGMENT_ENTRY,
    COMPOSITE_FRAGMENT_ENTRY,
];

/// A WGSL shader exposing the silhouette, edge-detection and composite sub-passes.
///
/// The shader reads the `_OutlineColor`/`_OutlineWidth` properties from a uniform
/// block at `@group(1) @binding(0)`, the source texture and sampler from
/// `@group(0) @binding(0..2)` and per-object transforms from `@group(0) @binding(2)`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutlineShader {
    /// Debug label.
    pub label: Cow<'static, str>,
    /// WGSL source.
    pub source: Cow<'static, str>,
}

impl OutlineShader {
    /// Creates a shader from WGSL source.
    pub fn new(label: impl Into<Cow<'static, str>>, source: impl Into<Cow<'static, str>>) -> Self {
        OutlineShader {
            label: label.into(),
            source: source.into(),
        }
    }

    /// The shader shipped with this crate.
    pub fn builtin() -> Self {
        OutlineShader::new("screen_space_outline", OUTLINE_WGSL)
    }

    /// Checks that every sub-pass entry point is defined.
    pub fn validate(&self) -> Result<()> {
        for entry_point in ENTRY_POINTS {
            if !self.defines(entry_point) {
                return Err(OutlineError::MissingEntryPoint {
                    shader: self.label.to_string(),
                    entry_point,
                });
            }
        }
        Ok(())
    }

    fn defines(&self, entry_point: &str) -> bool {
        self.source.match_indices("fn ").any(|(at, _)| {
            let rest = self.source[at + 3..].trim_start();
            rest.strip_prefix(entry_point)
                .is_some_and(|tail| tail.trim_start().starts_with('('))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_shader_defines_every_sub_pass() {
        assert!(OutlineShader::builtin().validate().is_ok());
    }

    #[test]
    fn missing_entry_point_is_reported() {
        let source = OUTLINE_WGSL.replace("fn fs_composite", "fn fs_blend");
        let shader = OutlineShader::new("broken", source);

        match shader.validate() {
            Err(OutlineError::MissingEntryPoint {
                shader,
                entry_point,
            }) => {
                assert_eq!(shader, "broken");
                assert_eq!(entry_point, COMPOSITE_FRAGMENT_ENTRY);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn entry_point_prefixes_do_not_count() {
        let shader = OutlineShader::new(
            "prefixed",
            OUTLINE_WGSL.replace("fn fs_edge_detect(", "fn fs_edge_detect_v2("),
        );
        assert!(shader.validate().is_err());
    }
}
