//! Integration tests for the batch pipeline with fake probe/encoder backends.

mod common;

use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use assert_matches::assert_matches;
use common::{test_config, FakeProbe, FakeTranscoder, Harness, PanicTranscoder};

use clipfit::batch::{BatchOrchestrator, BatchRequest, Candidate, ConversionOutcome, Delivery, OutputMode, Stage};

const MIB: u64 = 1024 * 1024;

fn names(result: &clipfit::BatchResult) -> Vec<&str> {
    result.results.iter().map(|r| r.original()).collect()
}

#[tokio::test]
async fn one_corrupt_candidate_does_not_taint_the_batch() {
    let staging = tempfile::tempdir().unwrap();
    let h = Harness::new(&test_config(staging.path()));

    let req = BatchRequest::new(vec![
        Candidate::from_bytes("one.mp4", "10:1000"),
        Candidate::from_bytes("two.mov", "60:41943040"),
        Candidate::from_bytes("three.mp4", vec![0xde, 0xad, 0xbe, 0xef]),
        Candidate::from_bytes("four.MOV", "30:2000"),
        Candidate::from_bytes("five.mp4", "5:10"),
    ]);

    let result = h.orchestrator.run(req).await.unwrap();
    assert_eq!(result.len(), 5);
    assert_eq!(
        names(&result),
        ["one.mp4", "two.mov", "three.mp4", "four.MOV", "five.mp4"]
    );
    for (i, outcome) in result.results.iter().enumerate() {
        if i == 2 {
            assert_matches!(
                outcome,
                ConversionOutcome::Failure { kind, stage: Some(Stage::Staged), .. } if kind == "probe_error"
            );
        } else {
            assert!(outcome.is_success(), "candidate {i} failed: {outcome:?}");
        }
    }
    assert_eq!(result.succeeded(), 4);
}

#[tokio::test]
async fn transcode_failure_is_recorded_after_planning() {
    let staging = tempfile::tempdir().unwrap();
    let h = Harness::with_transcoder(
        &test_config(staging.path()),
        FakeTranscoder::failing_on("999"),
    );

    let req = BatchRequest::new(vec![
        Candidate::from_bytes("a.mp4", "999:5"),
        Candidate::from_bytes("b.mp4", "4:5"),
    ]);
    let result = h.orchestrator.run(req).await.unwrap();

    assert_matches!(
        &result.results[0],
        ConversionOutcome::Failure { kind, error, stage: Some(Stage::Planned), .. }
            if kind == "transcode_error" && error.contains("exited with status 1")
    );
    assert!(result.results[1].is_success());
    assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn mixed_extensions_are_rejected_individually() {
    let staging = tempfile::tempdir().unwrap();
    let h = Harness::new(&test_config(staging.path()));

    let req = BatchRequest::new(vec![
        Candidate::from_bytes("clip.avi", "5:10"),
        Candidate::from_bytes("clip.mp4", "5:10"),
        Candidate::from_bytes("notes.txt", "5:10"),
    ]);
    let result = h.orchestrator.run(req).await.unwrap();

    assert_eq!(result.len(), 3);
    assert!(!result.results[0].is_success());
    assert!(result.results[1].is_success());
    assert!(!result.results[2].is_success());
    // Only the .mp4 was ever probed.
    assert_eq!(h.probe.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_batches_keep_submission_order() {
    let staging = tempfile::tempdir().unwrap();
    let mut cfg = test_config(staging.path());
    cfg.encoder.parallelism = 4;
    let h = Harness::new(&cfg);

    // Earlier candidates take longer, so they finish last.
    let req: BatchRequest = (0..6)
        .map(|i| {
            let delay = (6 - i) * 25;
            Candidate::from_bytes(format!("clip{i}.mp4"), format!("10:{}:{delay}", 1000 + i))
        })
        .collect();

    let result = h.orchestrator.run(req).await.unwrap();
    assert_eq!(
        names(&result),
        ["clip0.mp4", "clip1.mp4", "clip2.mp4", "clip3.mp4", "clip4.mp4", "clip5.mp4"]
    );
    assert_eq!(result.succeeded(), 6);
}

#[tokio::test]
async fn rerunning_decides_the_same_trim() {
    let staging = tempfile::tempdir().unwrap();
    let h = Harness::new(&test_config(staging.path()));

    let make = || {
        BatchRequest::new(vec![
            Candidate::from_bytes("long.mov", format!("93.7:{}", 123 * MIB)),
            Candidate::from_bytes("short.mp4", format!("8:{}", MIB)),
        ])
    };

    h.orchestrator.run(make()).await.unwrap();
    h.orchestrator.run(make()).await.unwrap();

    let trims = h.transcoder.trims();
    assert_eq!(trims.len(), 4);
    assert_eq!(trims[0], trims[2]);
    assert_eq!(trims[1], trims[3]);
    assert!(trims[0].is_some());
    assert_eq!(trims[1], None);
}

#[tokio::test]
async fn every_encode_is_capped_at_the_ceiling() {
    let staging = tempfile::tempdir().unwrap();
    let mut cfg = test_config(staging.path());
    cfg.limits.size_ceiling_bytes = 32;
    let h = Harness::new(&cfg);

    let req = BatchRequest::new(vec![
        Candidate::from_bytes("a.mp4", "2:1000000"),
        Candidate::from_bytes("b.mp4", "2:16"),
    ]);
    let result = h.orchestrator.run(req).await.unwrap();

    for outcome in &result.results {
        assert_matches!(outcome, ConversionOutcome::Success(file) if file.file_size <= 32);
    }
    let seen = h.transcoder.seen.lock().unwrap();
    assert!(seen.iter().all(|(_, o)| o.max_output_bytes == 32));
    assert!(seen.iter().all(|(_, o)| o.drop_audio && o.fast_start));
    // Tiny ceiling against a big source: the floor applies.
    assert_eq!(seen[0].1.trim_to_seconds, Some(1.0));
}

#[tokio::test]
async fn file_sources_are_staged_and_left_in_place() {
    let staging = tempfile::tempdir().unwrap();
    let uploads = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    let src = uploads.path().join("Beach Day.MOV");
    std::fs::write(&src, "20:30000000").unwrap();

    let h = Harness::new(&test_config(staging.path()));
    let orch = h
        .orchestrator
        .with_output_mode(OutputMode::Directory(out.path().to_path_buf()));

    let result = orch
        .run(BatchRequest::new(vec![Candidate::from_file(&src)]))
        .await
        .unwrap();

    let expected = out.path().join("Beach Day-converted.mp4");
    assert_matches!(&result.results[0], ConversionOutcome::Success(file) => {
        assert_eq!(file.original, "Beach Day.MOV");
        assert_eq!(file.output, "Beach Day-converted.mp4");
        assert!(file.trimmed);
        assert_eq!(file.delivery, Delivery::DownloadUrl(expected.to_string_lossy().into_owned()));
    });
    assert!(expected.exists());
    assert!(src.exists());
    assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn batch_result_serializes_in_order() {
    let staging = tempfile::tempdir().unwrap();
    let h = Harness::new(&test_config(staging.path()));

    let req = BatchRequest::new(vec![
        Candidate::from_bytes("ok.mp4", "3:30"),
        Candidate::from_bytes("bad.avi", "3:30"),
    ]);
    let result = h.orchestrator.run(req).await.unwrap();
    let json = serde_json::to_value(&result).unwrap();

    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["original"], "ok.mp4");
    assert_eq!(results[0]["output"], "ok-converted.mp4");
    assert_eq!(results[0]["trimmed"], false);
    assert!(results[0]["fileSize"].is_u64());
    assert!(results[0]["data"].is_string());
    assert_eq!(results[1]["original"], "bad.avi");
    assert_eq!(results[1]["kind"], "validation_error");
    assert!(results[1]["error"].as_str().unwrap().contains(".mov and .mp4"));
}

#[tokio::test]
async fn same_stem_candidates_get_distinct_outputs() {
    let staging = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let mut cfg = test_config(staging.path());
    cfg.encoder.parallelism = 3;
    let h = Harness::new(&cfg);
    let orch = h
        .orchestrator
        .with_output_mode(OutputMode::Directory(out.path().to_path_buf()));

    let req = BatchRequest::new(vec![
        Candidate::from_bytes("clip.mov", "10:1000:40"),
        Candidate::from_bytes("clip.mp4", "10:2000"),
        Candidate::from_bytes("Clip.MP4", "10:3000:20"),
    ]);
    let result = orch.run(req).await.unwrap();
    assert_eq!(result.succeeded(), 3);

    let mut urls = HashSet::new();
    let mut outputs = Vec::new();
    for outcome in &result.results {
        assert_matches!(outcome, ConversionOutcome::Success(file) => {
            let Delivery::DownloadUrl(url) = &file.delivery else {
                panic!("expected a download url, got {:?}", file.delivery);
            };
            assert!(urls.insert(url.clone()), "{url} delivered twice");
            assert_eq!(
                std::fs::metadata(url).unwrap().len(),
                file.file_size
            );
            outputs.push(file.output.clone());
        });
    }
    assert_eq!(
        outputs,
        ["clip-converted.mp4", "clip-converted-1.mp4", "Clip-converted-2.mp4"]
    );
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 3);
}

#[tokio::test]
async fn encoder_crash_fails_only_its_candidate_and_cleans_up() {
    let staging = tempfile::tempdir().unwrap();
    let cfg = test_config(staging.path());
    let probe = Arc::new(FakeProbe::default());
    let transcoder = Arc::new(PanicTranscoder::default());
    let orch = BatchOrchestrator::new(&cfg, probe, transcoder.clone()).unwrap();

    let req = BatchRequest::new(vec![
        Candidate::from_bytes("a.mp4", "5:100"),
        Candidate::from_bytes("b.avi", "5:100"),
        Candidate::from_bytes("c.mov", "5:100"),
    ]);
    let result = orch.run(req).await.unwrap();

    assert_eq!(names(&result), ["a.mp4", "b.avi", "c.mov"]);
    for i in [0, 2] {
        assert_matches!(
            &result.results[i],
            ConversionOutcome::Failure { kind, stage: None, .. } if kind == "internal_error"
        );
    }
    assert_matches!(
        &result.results[1],
        ConversionOutcome::Failure { kind, .. } if kind == "validation_error"
    );
    assert_eq!(transcoder.calls.load(Ordering::SeqCst), 2);
    assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
}
