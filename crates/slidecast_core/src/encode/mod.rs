//! Encoding collaborator: the `Renderer` seam and its ffmpeg default.

mod ffmpeg;
mod options_builder;

pub use ffmpeg::{
    write_concat_manifest, EncodeError, EncodeReport, EncodeRequest, FfmpegRenderer, Renderer,
};
pub use options_builder::FfmpegOptionsBuilder;
