//! Application configuration types.
//!
//! The top-level [`Config`] carries every tunable used by the pipeline. Every
//! section defaults sensibly so an empty file is valid. Configuration is
//! loaded once at startup and shared immutably afterwards.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::budget::{BudgetPlanner, DEFAULT_MINIMUM_TRIM_FLOOR, DEFAULT_SAFETY_MARGIN};
use crate::{Error, Result};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub limits: Limits,
    pub encoder: EncoderConfig,
    pub tools: ToolsConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Check every section for values the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first malformed value.
    pub fn check(&self) -> Result<()> {
        self.limits.check()?;
        self.encoder.check()?;
        Ok(())
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.limits.size_ceiling_bytes > self.limits.max_upload_bytes {
            warnings.push(format!(
                "limits.size_ceiling_bytes ({}) exceeds limits.max_upload_bytes ({}); no upload will ever be trimmed",
                self.limits.size_ceiling_bytes, self.limits.max_upload_bytes
            ));
        }

        for (name, path) in [
            ("tools.ffmpeg_path", &self.tools.ffmpeg_path),
            ("tools.ffprobe_path", &self.tools.ffprobe_path),
        ] {
            if let Some(p) = path {
                if !p.exists() {
                    warnings.push(format!(
                        "{name} {} does not exist; falling back to PATH",
                        p.display()
                    ));
                }
            }
        }

        if let Some(dir) = &self.output.dir {
            if dir.exists() && !dir.is_dir() {
                warnings.push(format!("output.dir {} is not a directory", dir.display()));
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Size and batch bounds plus the budgeting parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum byte size of one converted output.
    pub size_ceiling_bytes: u64,
    /// Maximum byte size of one uploaded candidate.
    pub max_upload_bytes: u64,
    /// Maximum number of candidates per batch.
    pub max_batch_items: usize,
    /// Multiplicative headroom applied to the size ratio.
    pub safety_margin: f64,
    /// Shortest trim in seconds.
    pub minimum_trim_floor: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            size_ceiling_bytes: 20 * 1024 * 1024,
            max_upload_bytes: 500 * 1024 * 1024,
            max_batch_items: 10,
            safety_margin: DEFAULT_SAFETY_MARGIN,
            minimum_trim_floor: DEFAULT_MINIMUM_TRIM_FLOOR,
        }
    }
}

impl Limits {
    /// Reject limits the pipeline cannot honour.
    pub fn check(&self) -> Result<()> {
        if self.size_ceiling_bytes == 0 {
            return Err(Error::Config("limits.size_ceiling_bytes must be > 0".into()));
        }
        if self.max_upload_bytes == 0 {
            return Err(Error::Config("limits.max_upload_bytes must be > 0".into()));
        }
        if self.max_batch_items == 0 {
            return Err(Error::Config("limits.max_batch_items must be > 0".into()));
        }
        self.planner().map(|_| ())
    }

    /// Build the [`BudgetPlanner`] described by these limits.
    pub fn planner(&self) -> Result<BudgetPlanner> {
        BudgetPlanner::new(self.safety_margin, self.minimum_trim_floor)
    }
}

/// Fixed encoder settings and external call bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub video_codec: String,
    pub preset: String,
    pub crf: u32,
    /// Seconds before a hung ffprobe is treated as a probe failure.
    pub probe_timeout_secs: u64,
    /// Seconds before a hung ffmpeg is treated as a transcode failure.
    pub transcode_timeout_secs: u64,
    /// Candidates processed concurrently within one batch.
    pub parallelism: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            video_codec: "libx264".into(),
            preset: "fast".into(),
            crf: 23,
            probe_timeout_secs: 60,
            transcode_timeout_secs: 600,
            parallelism: 1,
        }
    }
}

impl EncoderConfig {
    pub fn check(&self) -> Result<()> {
        if self.video_codec.trim().is_empty() {
            return Err(Error::Config("encoder.video_codec must not be empty".into()));
        }
        if self.preset.trim().is_empty() {
            return Err(Error::Config("encoder.preset must not be empty".into()));
        }
        if self.crf > 51 {
            return Err(Error::Config(format!(
                "encoder.crf must be in 0..=51, got {}",
                self.crf
            )));
        }
        if self.probe_timeout_secs == 0 || self.transcode_timeout_secs == 0 {
            return Err(Error::Config("encoder timeouts must be > 0".into()));
        }
        if self.parallelism == 0 {
            return Err(Error::Config("encoder.parallelism must be > 0".into()));
        }
        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.transcode_timeout_secs)
    }
}

/// Paths to external CLI tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}

/// Where converted outputs and temporary files go.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving converted files. When unset, outputs are returned
    /// inline (base64) in the batch result.
    pub dir: Option<PathBuf>,
    /// Parent directory for per-candidate staging. Defaults to the system
    /// temp directory.
    pub staging_dir: Option<PathBuf>,
}
