//! Pipeline step implementations.

mod build_tracks;
mod compose;
mod encode;

pub use build_tracks::BuildTracksStep;
pub use compose::ComposeStep;
pub use encode::EncodeStep;
