//! Shared fakes for integration tests.
//!
//! Staged "videos" are small text files of the form
//! `<duration>:<size>[:<delay_ms>]`. [`FakeProbe`] reads the first two
//! fields; [`FakeTranscoder`] sleeps for the optional delay and writes a tiny
//! output. Anything unparseable fails probing, like a corrupt upload would.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use cf_av::{MediaProbe, TranscodeInvoker, TranscodeOptions};
use cf_core::{Error, MediaDescriptor, Result};
use clipfit::batch::BatchOrchestrator;
use clipfit::config::Config;

fn fields(text: &str) -> Vec<&str> {
    text.trim().split(':').collect()
}

#[derive(Default)]
pub struct FakeProbe {
    pub calls: AtomicUsize,
}

#[async_trait]
impl MediaProbe for FakeProbe {
    async fn probe(&self, path: &Path) -> Result<MediaDescriptor> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Probe(e.to_string()))?;
        let f = fields(&text);
        if f.len() < 2 {
            return Err(Error::Probe("invalid data found when processing input".into()));
        }
        let duration = f[0].parse().map_err(|_| Error::Probe("bad duration".into()))?;
        let size = f[1].parse().map_err(|_| Error::Probe("bad size".into()))?;
        MediaDescriptor::new(duration, size, None)
    }
}

#[derive(Default)]
pub struct FakeTranscoder {
    /// Options received, tagged with the staged input's contents.
    pub seen: Mutex<Vec<(String, TranscodeOptions)>>,
    /// Inputs containing this marker fail to encode.
    pub fail_marker: Option<String>,
}

impl FakeTranscoder {
    pub fn failing_on(marker: &str) -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
            fail_marker: Some(marker.to_string()),
        }
    }

    pub fn trims(&self) -> Vec<Option<f64>> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|(_, o)| o.trim_to_seconds)
            .collect()
    }
}

#[async_trait]
impl TranscodeInvoker for FakeTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        options: &TranscodeOptions,
    ) -> Result<u64> {
        let text = tokio::fs::read_to_string(input).await?;
        self.seen
            .lock()
            .unwrap()
            .push((text.trim().to_string(), options.clone()));

        if let Some(delay) = fields(&text).get(2).and_then(|d| d.parse::<u64>().ok()) {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if let Some(marker) = &self.fail_marker {
            if text.contains(marker.as_str()) {
                return Err(Error::Transcode("ffmpeg: exited with status 1".into()));
            }
        }

        let len = options.max_output_bytes.min(64) as usize;
        tokio::fs::write(output, vec![0u8; len]).await?;
        cf_av::transcode::verify_output(output, options.max_output_bytes).await
    }
}

/// An encoder that panics mid-encode, after writing partial output.
#[derive(Default)]
pub struct PanicTranscoder {
    pub calls: AtomicUsize,
}

#[async_trait]
impl TranscodeInvoker for PanicTranscoder {
    async fn transcode(
        &self,
        _input: &Path,
        output: &Path,
        _options: &TranscodeOptions,
    ) -> Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::fs::write(output, b"partial").await?;
        panic!("encoder crashed");
    }
}

/// Default config with staging confined to `staging`.
pub fn test_config(staging: &Path) -> Config {
    let mut cfg = Config::default();
    cfg.output.staging_dir = Some(staging.to_path_buf());
    cfg
}

pub struct Harness {
    pub orchestrator: BatchOrchestrator,
    pub probe: Arc<FakeProbe>,
    pub transcoder: Arc<FakeTranscoder>,
}

impl Harness {
    pub fn new(config: &Config) -> Self {
        Self::with_transcoder(config, FakeTranscoder::default())
    }

    pub fn with_transcoder(config: &Config, transcoder: FakeTranscoder) -> Self {
        let probe = Arc::new(FakeProbe::default());
        let transcoder = Arc::new(transcoder);
        let orchestrator = BatchOrchestrator::new(config, probe.clone(), transcoder.clone())
            .expect("test config should be valid");
        Self {
            orchestrator,
            probe,
            transcoder,
        }
    }
}
