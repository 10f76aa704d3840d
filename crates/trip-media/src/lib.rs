//! FFmpeg CLI wrapper and journey-video composition.
//!
//! This crate provides:
//! - Type-safe multi-input FFmpeg command building
//! - Progress parsing from `-progress pipe:2` with streamed diagnostics
//! - Cancellation support via tokio
//! - ffprobe and still-image dimension probing
//! - Filter-graph builders (Ken Burns, sliding stacks, crossfades, titles)
//! - Resource-bounded chunked composition with crossfade stitching and
//!   soundtrack mixing

pub mod audio;
pub mod chunk;
pub mod command;
pub mod compose;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod probe;
pub mod progress;

pub use audio::{pick_soundtrack, SOUNDTRACK_EXTENSIONS};
pub use chunk::{
    chunk_duration_secs, chunk_segments, merged_duration_secs, LARGE_INPUT_CHUNK_SEGMENTS,
    LARGE_INPUT_PIXELS, MAX_CHUNK_SEGMENTS, MIN_CHUNK_SEGMENTS,
};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner, InputSpec};
pub use compose::{
    ComposeObserver, ComposeOutcome, ComposeRequest, ComposerConfig, OutputTarget,
    StorageDisposition, VideoComposer,
};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_image_dimensions, probe_video, VideoInfo};
pub use progress::{FfmpegProgress, ProgressCallback};
