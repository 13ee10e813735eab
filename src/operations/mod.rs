mod clip;
mod difference;
mod group;
mod offset;

pub use difference::SubtractOutlines;
pub use group::{GroupOutlines, OutlineGroup};
pub use offset::OffsetOutlines;

pub(crate) use clip::{multi_to_outlines, outlines_to_multi, CLIPPER_SCALE};
