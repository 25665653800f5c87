//! Batch orchestration: validate, stage, probe, plan, transcode, and finalize
//! each candidate, isolating failures per candidate.
//!
//! Candidates run as independent futures through a `buffered` stream, which
//! yields results in submission order no matter which candidate finishes
//! first. Each future owns its [`StagingArea`]; the area is released once the
//! candidate reaches `Finalized` or fails, and dropped during unwinding if
//! processing panics.

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use base64::Engine;
use futures::{FutureExt, StreamExt};

use cf_av::{
    FfmpegTranscoder, FfprobeProbe, MediaProbe, Staging, StagingArea, ToolRegistry,
    TranscodeInvoker, TranscodeOptions,
};
use cf_core::config::{Config, EncoderConfig, Limits};
use cf_core::{BudgetPlanner, Container, Error, Result};

use super::outcome::{output_names, BatchResult, ConversionOutcome, ConvertedFile, Delivery, Stage};
use super::request::{BatchRequest, Candidate, CandidateSource};

/// Where finalized outputs go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Return outputs base64-encoded in the result.
    Inline,
    /// Copy outputs into this directory and report their location.
    Directory(PathBuf),
}

/// Runs batches through the per-candidate state machine.
pub struct BatchOrchestrator {
    limits: Limits,
    encoder: EncoderConfig,
    planner: BudgetPlanner,
    probe: Arc<dyn MediaProbe>,
    transcoder: Arc<dyn TranscodeInvoker>,
    staging: Staging,
    output: OutputMode,
}

impl std::fmt::Debug for BatchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchOrchestrator")
            .field("limits", &self.limits)
            .field("encoder", &self.encoder)
            .field("planner", &self.planner)
            .field("staging", &self.staging)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

impl BatchOrchestrator {
    /// Build an orchestrator from configuration and explicit backends.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is malformed.
    pub fn new(
        config: &Config,
        probe: Arc<dyn MediaProbe>,
        transcoder: Arc<dyn TranscodeInvoker>,
    ) -> Result<Self> {
        config.check()?;

        let output = match &config.output.dir {
            Some(dir) => OutputMode::Directory(dir.clone()),
            None => OutputMode::Inline,
        };

        Ok(Self {
            limits: config.limits.clone(),
            encoder: config.encoder.clone(),
            planner: config.limits.planner()?,
            probe,
            transcoder,
            staging: Staging::new(config.output.staging_dir.clone()),
            output,
        })
    }

    /// Build an orchestrator backed by the discovered ffprobe and ffmpeg.
    pub fn with_tools(config: &Config, tools: &ToolRegistry) -> Result<Self> {
        let probe = FfprobeProbe::from_registry(tools, config.encoder.probe_timeout())?;
        let transcoder = FfmpegTranscoder::from_registry(tools, config.encoder.transcode_timeout())?;
        Self::new(config, Arc::new(probe), Arc::new(transcoder))
    }

    /// Override where outputs are delivered.
    pub fn with_output_mode(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    pub fn planner(&self) -> &BudgetPlanner {
        &self.planner
    }

    /// Process every candidate in `request`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without processing anything if the batch
    /// is empty or larger than `max_batch_items`. Otherwise returns exactly
    /// one outcome per candidate, in submission order.
    pub async fn run(&self, request: BatchRequest) -> Result<BatchResult> {
        if request.is_empty() {
            return Err(Error::Validation("no files submitted".into()));
        }
        if request.len() > self.limits.max_batch_items {
            return Err(Error::Validation(format!(
                "{} files submitted; at most {} per batch",
                request.len(),
                self.limits.max_batch_items
            )));
        }

        tracing::info!(
            "batch of {} candidate(s), parallelism {}",
            request.len(),
            self.encoder.parallelism
        );

        let candidates = request.into_candidates();
        let outputs = output_names(candidates.iter().map(|c| c.name.as_str()));

        let results: Vec<ConversionOutcome> = futures::stream::iter(
            candidates.into_iter().zip(outputs).enumerate(),
        )
        .map(|(index, (candidate, output))| self.process(index, candidate, output))
        .buffered(self.encoder.parallelism)
        .collect()
        .await;

        let result = BatchResult { results };
        tracing::info!(
            "batch finished: {} succeeded, {} failed",
            result.succeeded(),
            result.failed()
        );
        Ok(result)
    }

    /// Process one candidate to an outcome. Never fails; a panic inside
    /// processing is reported as this candidate's failure.
    async fn process(
        &self,
        index: usize,
        candidate: Candidate,
        output: String,
    ) -> ConversionOutcome {
        let mut stage = Stage::Received;
        let converted = AssertUnwindSafe(self.convert(index, &candidate, output, &mut stage))
            .catch_unwind()
            .await;

        match converted {
            Ok(Ok(file)) => ConversionOutcome::Success(file),
            Ok(Err(e)) => {
                tracing::warn!("[{index}] {} failed after {stage}: {e}", candidate.name);
                ConversionOutcome::failure(&candidate.name, &e, Some(stage))
            }
            Err(_panic) => {
                tracing::error!("[{index}] {} panicked during processing", candidate.name);
                let e = Error::Internal("processing panicked".into());
                ConversionOutcome::failure(&candidate.name, &e, None)
            }
        }
    }

    async fn convert(
        &self,
        index: usize,
        candidate: &Candidate,
        output: String,
        stage: &mut Stage,
    ) -> Result<ConvertedFile> {
        let container = self.validate(candidate).await?;
        advance(index, candidate, stage, Stage::Validated);

        let area = match &candidate.source {
            CandidateSource::Bytes(bytes) => self.staging.stage_bytes(container, bytes).await?,
            CandidateSource::File(path) => self.staging.stage_file(container, path).await?,
        };
        advance(index, candidate, stage, Stage::Staged);

        let result = self.convert_staged(index, candidate, &area, output, stage).await;
        area.release();
        result
    }

    /// Reject unsupported extensions and oversized uploads before staging.
    async fn validate(&self, candidate: &Candidate) -> Result<Container> {
        let container = Container::from_name(&candidate.name).ok_or_else(|| {
            Error::Validation(format!(
                "{}: only .mov and .mp4 files are supported",
                candidate.name
            ))
        })?;

        let size = candidate.byte_len().await?;
        if size > self.limits.max_upload_bytes {
            return Err(Error::Validation(format!(
                "{}: {size} bytes exceeds the {} byte upload limit",
                candidate.name, self.limits.max_upload_bytes
            )));
        }

        Ok(container)
    }

    async fn convert_staged(
        &self,
        index: usize,
        candidate: &Candidate,
        area: &StagingArea,
        output: String,
        stage: &mut Stage,
    ) -> Result<ConvertedFile> {
        let descriptor = self.probe.probe(area.input()).await?;
        advance(index, candidate, stage, Stage::Probed);
        tracing::debug!(
            "[{index}] {}: {:.3}s, {} bytes, {} bps",
            candidate.name,
            descriptor.duration_seconds(),
            descriptor.byte_size(),
            descriptor.bitrate_bps()
        );

        let ceiling = self.limits.size_ceiling_bytes;
        let plan = self.planner.plan(&descriptor, ceiling);
        advance(index, candidate, stage, Stage::Planned);
        tracing::info!("[{index}] {}: {plan}", candidate.name);

        let options = TranscodeOptions::for_plan(&self.encoder, &plan, ceiling);
        let file_size = self
            .transcoder
            .transcode(area.input(), area.output(), &options)
            .await?;
        advance(index, candidate, stage, Stage::Transcoded);

        let delivery = match &self.output {
            OutputMode::Inline => {
                let bytes = area.read_output().await?;
                Delivery::Data(base64::engine::general_purpose::STANDARD.encode(bytes))
            }
            OutputMode::Directory(dir) => {
                let dest = area.deliver_to(&dir.join(&output)).await?;
                Delivery::DownloadUrl(dest.to_string_lossy().into_owned())
            }
        };
        advance(index, candidate, stage, Stage::Finalized);

        Ok(ConvertedFile {
            original: candidate.name.clone(),
            output,
            trimmed: plan.is_trim(),
            file_size,
            delivery,
        })
    }
}

fn advance(index: usize, candidate: &Candidate, stage: &mut Stage, next: Stage) {
    tracing::info!("[{index}] {}: {stage} -> {next}", candidate.name);
    *stage = next;
}
