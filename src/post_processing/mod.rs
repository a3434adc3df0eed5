//! Post-processing features and the screen-space outline effect.

pub use self::outline_feature::{OutlineFeature, OutlineFeatureSettings};
pub use self::outline_pass::OutlinePass;
pub use self::outline_volume::{
    OutlineVolume, DEFAULT_OUTLINE_WIDTH, MAX_OUTLINE_WIDTH, MIN_OUTLINE_WIDTH,
};
pub use self::render_feature::{FrameSchedule, InjectionPoint, RenderFeature, ScriptablePass};
pub use self::volume::{VolumeComponent, VolumeStack};

mod outline_feature;
mod outline_pass;
mod outline_volume;
mod render_feature;
mod volume;
