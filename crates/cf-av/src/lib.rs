//! # cf-av
//!
//! External tool management, probing, encoding, and staging for the clipfit
//! pipeline.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to ffmpeg
//!   and ffprobe.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support for running external processes.
//! - **Staging** ([`Staging`], [`StagingArea`]) -- per-candidate temporary
//!   directories removed on release or drop.
//! - **Probing** ([`MediaProbe`], [`FfprobeProbe`]) -- read duration, size and
//!   bitrate from a staged source.
//! - **Transcoding** ([`TranscodeInvoker`], [`FfmpegTranscoder`]) --
//!   size-capped re-encoding with an optional trim.

pub mod command;
pub mod probe;
pub mod staging;
pub mod tools;
pub mod transcode;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use probe::{FfprobeProbe, MediaProbe};
pub use staging::{Staging, StagingArea};
pub use tools::{ToolInfo, ToolRegistry};
pub use transcode::{FfmpegTranscoder, TranscodeInvoker, TranscodeOptions};
