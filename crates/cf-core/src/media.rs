//! Media-domain types: accepted input containers, probe results, and trim
//! decisions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::{Error, Result};

// ---------------------------------------------------------------------------
// Container
// ---------------------------------------------------------------------------

/// Input containers accepted for conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Mov,
    Mp4,
}

impl Container {
    /// Detect the container from a file name's extension (case-insensitive).
    ///
    /// Returns `None` for anything other than `.mov` or `.mp4`.
    pub fn from_name(name: impl AsRef<Path>) -> Option<Self> {
        let ext = name.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "mov" => Some(Self::Mov),
            "mp4" => Some(Self::Mp4),
            _ => None,
        }
    }

    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mov => "mov",
            Self::Mp4 => "mp4",
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

// ---------------------------------------------------------------------------
// MediaDescriptor
// ---------------------------------------------------------------------------

/// Coarse pre-encode metadata for one source file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    duration_seconds: f64,
    byte_size: u64,
    bitrate_bps: u64,
}

impl MediaDescriptor {
    /// Build a descriptor from probe values.
    ///
    /// When `bitrate_bps` is `None` it is derived as
    /// `byte_size * 8 / duration_seconds`, or `0` for a zero duration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Probe`] if `duration_seconds` is negative or not
    /// finite.
    pub fn new(duration_seconds: f64, byte_size: u64, bitrate_bps: Option<u64>) -> Result<Self> {
        if !duration_seconds.is_finite() || duration_seconds < 0.0 {
            return Err(Error::Probe(format!(
                "invalid duration reported: {duration_seconds}"
            )));
        }

        let bitrate_bps = bitrate_bps.unwrap_or_else(|| derive_bitrate(byte_size, duration_seconds));

        Ok(Self {
            duration_seconds,
            byte_size,
            bitrate_bps,
        })
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    pub fn bitrate_bps(&self) -> u64 {
        self.bitrate_bps
    }
}

fn derive_bitrate(byte_size: u64, duration_seconds: f64) -> u64 {
    if duration_seconds == 0.0 {
        return 0;
    }
    ((byte_size as f64 * 8.0) / duration_seconds).floor() as u64
}

// ---------------------------------------------------------------------------
// TrimPlan
// ---------------------------------------------------------------------------

/// Whether, and to what length, a candidate is trimmed before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "plan", rename_all = "snake_case")]
pub enum TrimPlan {
    /// The source already fits the ceiling.
    NoTrim,
    /// Encode only the first `seconds` of the source.
    TrimTo { seconds: f64 },
}

impl TrimPlan {
    pub fn is_trim(&self) -> bool {
        matches!(self, Self::TrimTo { .. })
    }

    /// Trim length in seconds, if any.
    pub fn seconds(&self) -> Option<f64> {
        match self {
            Self::NoTrim => None,
            Self::TrimTo { seconds } => Some(*seconds),
        }
    }
}

impl fmt::Display for TrimPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTrim => write!(f, "no trim"),
            Self::TrimTo { seconds } => write!(f, "trim to {seconds:.3}s"),
        }
    }
}
