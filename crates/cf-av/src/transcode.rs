//! Size-capped re-encoding.
//!
//! [`TranscodeInvoker`] is the seam to the external encoder. Every encode
//! uses a fixed codec, preset and CRF, drops audio, writes a fast-start MP4,
//! and tells the encoder to stop shortly before `max_output_bytes`.
//! A planned trim becomes a duration limit on the output.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use cf_core::config::EncoderConfig;
use cf_core::{Error, Result, TrimPlan};

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Fraction of the cap held back from ffmpeg's `-fs`. ffmpeg stops writing
/// packets at the limit but still flushes the trailer and the relocated moov
/// atom, so the finished file lands slightly past it.
const FS_HEADROOM_DIVISOR: u64 = 50;

/// Parameters for one encode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscodeOptions {
    pub video_codec: String,
    pub preset: String,
    pub quality: u32,
    pub drop_audio: bool,
    pub fast_start: bool,
    pub max_output_bytes: u64,
    pub trim_to_seconds: Option<f64>,
}

impl TranscodeOptions {
    /// Options for encoding under `plan` with a hard cap of
    /// `size_ceiling_bytes`.
    pub fn for_plan(encoder: &EncoderConfig, plan: &TrimPlan, size_ceiling_bytes: u64) -> Self {
        Self {
            video_codec: encoder.video_codec.clone(),
            preset: encoder.preset.clone(),
            quality: encoder.crf,
            drop_audio: true,
            fast_start: true,
            max_output_bytes: size_ceiling_bytes,
            trim_to_seconds: plan.seconds(),
        }
    }

    /// Byte limit handed to the encoder's hard cutoff, 2% under the cap.
    pub fn encoder_size_limit(&self) -> u64 {
        self.max_output_bytes - self.max_output_bytes / FS_HEADROOM_DIVISOR
    }

    /// ffmpeg arguments for encoding `input` into `output`.
    pub fn ffmpeg_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut args: Vec<String> = vec!["-y".into(), "-i".into()];
        args.push(input.to_string_lossy().into_owned());

        if let Some(seconds) = self.trim_to_seconds {
            args.push("-t".into());
            args.push(format!("{seconds:.3}"));
        }

        args.extend([
            "-c:v".to_string(),
            self.video_codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.quality.to_string(),
        ]);

        if self.drop_audio {
            args.push("-an".into());
        }
        if self.fast_start {
            args.push("-movflags".into());
            args.push("+faststart".into());
        }

        args.push("-fs".into());
        args.push(self.encoder_size_limit().to_string());
        args.push(output.to_string_lossy().into_owned());
        args
    }
}

/// Drives the external encoder.
#[async_trait]
pub trait TranscodeInvoker: Send + Sync {
    /// Encode `input` into `output` and return the output's byte size.
    ///
    /// On success the output exists and is at most
    /// `options.max_output_bytes` long.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transcode`] on encoder failure, timeout, a missing
    /// output, or an output over the cap.
    async fn transcode(&self, input: &Path, output: &Path, options: &TranscodeOptions)
        -> Result<u64>;
}

/// A transcoder backed by the `ffmpeg` CLI.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg_path: PathBuf,
    timeout: Duration,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: PathBuf, timeout: Duration) -> Self {
        Self {
            ffmpeg_path,
            timeout,
        }
    }

    /// Create a transcoder from a discovered registry.
    pub fn from_registry(tools: &ToolRegistry, timeout: Duration) -> Result<Self> {
        Ok(Self::new(tools.require("ffmpeg")?.to_path_buf(), timeout))
    }
}

#[async_trait]
impl TranscodeInvoker for FfmpegTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        options: &TranscodeOptions,
    ) -> Result<u64> {
        tracing::info!(
            "transcode {:?} ({} {} crf {}, cap {} bytes, trim {:?})",
            input,
            options.video_codec,
            options.preset,
            options.quality,
            options.max_output_bytes,
            options.trim_to_seconds
        );

        let mut cmd = ToolCommand::new(self.ffmpeg_path.clone());
        cmd.args(options.ffmpeg_args(input, output));
        cmd.timeout(self.timeout);
        cmd.execute().await.map_err(Error::into_transcode)?;

        verify_output(output, options.max_output_bytes).await
    }
}

/// Check the encoder left an output within the cap and return its size.
pub async fn verify_output(output: &Path, max_output_bytes: u64) -> Result<u64> {
    let size = tokio::fs::metadata(output)
        .await
        .map_err(|e| Error::Transcode(format!("encoder produced no output: {e}")))?
        .len();

    if size > max_output_bytes {
        return Err(Error::Transcode(format!(
            "output is {size} bytes, over the {max_output_bytes} byte cap"
        )));
    }

    Ok(size)
}
