//! Media probing.
//!
//! [`MediaProbe`] is the seam between the pipeline and whatever reads media
//! metadata. [`FfprobeProbe`] shells out to
//! `ffprobe -v quiet -print_format json -show_format -show_streams` and maps
//! the format section into a [`MediaDescriptor`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use cf_core::{Error, MediaDescriptor, Result};

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Reads coarse metadata from a staged source file.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Probe `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Probe`] when the source cannot be parsed.
    async fn probe(&self, path: &Path) -> Result<MediaDescriptor>;
}

/// A prober backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    ffprobe_path: PathBuf,
    timeout: Duration,
}

impl FfprobeProbe {
    /// Create a new prober using the given ffprobe path.
    pub fn new(ffprobe_path: PathBuf, timeout: Duration) -> Self {
        Self {
            ffprobe_path,
            timeout,
        }
    }

    /// Create a prober from a discovered registry.
    pub fn from_registry(tools: &ToolRegistry, timeout: Duration) -> Result<Self> {
        Ok(Self::new(tools.require("ffprobe")?.to_path_buf(), timeout))
    }
}

#[async_trait]
impl MediaProbe for FfprobeProbe {
    async fn probe(&self, path: &Path) -> Result<MediaDescriptor> {
        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ]);
        cmd.arg(path.to_string_lossy().as_ref());
        cmd.timeout(self.timeout);

        let output = cmd.execute().await.map_err(Error::into_probe)?;
        let ff: FfprobeOutput = serde_json::from_str(&output.stdout)
            .map_err(|e| Error::Probe(format!("ffprobe JSON parse error: {e}")))?;

        let on_disk = tokio::fs::metadata(path).await.map(|m| m.len()).ok();
        parse_ffprobe_output(ff, on_disk)
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn parse_ffprobe_output(output: FfprobeOutput, on_disk_size: Option<u64>) -> Result<MediaDescriptor> {
    if !output
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("video"))
    {
        return Err(Error::Probe("no video stream found".into()));
    }

    // "N/A" and missing durations both count as zero.
    let duration = output
        .format
        .duration
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite())
        .unwrap_or(0.0);

    let byte_size = output
        .format
        .size
        .and_then(|s| s.parse::<u64>().ok())
        .or(on_disk_size)
        .unwrap_or(0);

    let bitrate = output
        .format
        .bit_rate
        .and_then(|s| s.parse::<u64>().ok());

    MediaDescriptor::new(duration, byte_size, bitrate)
}
