//! Batch submission types.

use std::path::PathBuf;

use bytes::Bytes;

use cf_core::{Error, Result};

/// Where a candidate's raw bytes come from.
#[derive(Debug, Clone)]
pub enum CandidateSource {
    /// Upload held in memory.
    Bytes(Bytes),
    /// Upload already on disk; it is copied into staging and left untouched.
    File(PathBuf),
}

/// One input video submitted as part of a batch.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Display name, used for the extension check and the output name.
    pub name: String,
    pub source: CandidateSource,
}

impl Candidate {
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            source: CandidateSource::Bytes(bytes.into()),
        }
    }

    /// A candidate read from `path`, named after its file name.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            name,
            source: CandidateSource::File(path),
        }
    }

    /// Size of the upload in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Staging`] if an on-disk source cannot be stat'ed.
    pub async fn byte_len(&self) -> Result<u64> {
        match &self.source {
            CandidateSource::Bytes(b) => Ok(b.len() as u64),
            CandidateSource::File(p) => tokio::fs::metadata(p)
                .await
                .map(|m| m.len())
                .map_err(|e| Error::Staging(format!("cannot read {}: {e}", p.display()))),
        }
    }
}

/// Ordered sequence of candidates submitted together.
#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    candidates: Vec<Candidate>,
}

impl BatchRequest {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }

    pub fn push(&mut self, candidate: Candidate) {
        self.candidates.push(candidate);
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn into_candidates(self) -> Vec<Candidate> {
        self.candidates
    }
}

impl FromIterator<Candidate> for BatchRequest {
    fn from_iter<I: IntoIterator<Item = Candidate>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
