//! Adapters - process-spawning implementations of the collaborator ports

pub mod ffmpeg_exec;
pub mod ffprobe;

pub use ffmpeg_exec::FfmpegExecutor;
pub use ffprobe::FfprobeInspector;
