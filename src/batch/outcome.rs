//! Per-candidate results and the batch result.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::Serialize;

/// Processing states a candidate moves through, in order.
///
/// A failed candidate records the last state it reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    Validated,
    Staged,
    Probed,
    Planned,
    Transcoded,
    Finalized,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::Staged => "staged",
            Self::Probed => "probed",
            Self::Planned => "planned",
            Self::Transcoded => "transcoded",
            Self::Finalized => "finalized",
        };
        f.write_str(s)
    }
}

/// How a converted output is handed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Delivery {
    /// Base64 of the output bytes.
    Data(String),
    /// Location of the output in the output directory.
    DownloadUrl(String),
}

/// A successfully converted candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedFile {
    pub original: String,
    pub output: String,
    pub trimmed: bool,
    pub file_size: u64,
    #[serde(flatten)]
    pub delivery: Delivery,
}

/// Result for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConversionOutcome {
    Success(ConvertedFile),
    Failure {
        original: String,
        error: String,
        kind: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        stage: Option<Stage>,
    },
}

impl ConversionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The submitted name this outcome belongs to.
    pub fn original(&self) -> &str {
        match self {
            Self::Success(file) => &file.original,
            Self::Failure { original, .. } => original,
        }
    }

    pub(crate) fn failure(original: &str, err: &cf_core::Error, stage: Option<Stage>) -> Self {
        Self::Failure {
            original: original.to_string(),
            error: err.to_string(),
            kind: err.kind().to_string(),
            stage,
        }
    }
}

/// Ordered results, one per submitted candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchResult {
    pub results: Vec<ConversionOutcome>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }
}

/// Output file name for a submitted name: `<stem>-converted.mp4`.
pub fn output_name(original: &str) -> String {
    format!("{}-converted.mp4", output_stem(original))
}

/// Output file names for a whole batch, one per submitted name.
///
/// Names are unique within the batch, compared case-insensitively: a
/// repeated stem gets the lowest free `-<n>` suffix, so `clip.mov` and
/// `clip.mp4` become `clip-converted.mp4` and `clip-converted-1.mp4`.
pub fn output_names<'a>(originals: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut taken = HashSet::new();
    originals
        .into_iter()
        .map(|original| {
            let stem = output_stem(original);
            let mut name = format!("{stem}-converted.mp4");
            let mut n = 1;
            while !taken.insert(name.to_lowercase()) {
                name = format!("{stem}-converted-{n}.mp4");
                n += 1;
            }
            name
        })
        .collect()
}

fn output_stem(original: &str) -> String {
    Path::new(original)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "output".to_string())
}
