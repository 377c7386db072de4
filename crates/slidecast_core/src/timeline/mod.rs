//! Timeline construction: slide ordering, frame preparation, clip
//! composition, and final assembly.

pub mod assembler;
pub mod composer;
pub mod frames;
pub mod slides;

pub use assembler::{assemble, render_timeline_audio, AssemblerConfig};
pub use composer::{compose_slide, ComposerConfig};
pub use frames::{prepare_frame, prepared_frame_path, FrameError};
pub use slides::{image_slide_index, slide_index, slide_key, sort_images_by_index};
