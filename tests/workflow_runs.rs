// tests/workflow_runs.rs
//
// Full track/export/render workflows through the Engine and the
// coordinator, with fake backends.

mod common;
use crate::common::{
    FakeExporter, FakeSupervisor, ToolConfigBuilder, Workspace, engine_with, has_line,
    init_tracing, log_texts, progress_values, with_timeout,
};

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use sleapbatch::engine::channel::task_channel;
use sleapbatch::engine::{CancelFlag, TaskEvent, TaskOutcome, TaskRunner};
use sleapbatch::types::{Mode, VideoFormat, WorkflowMode};
use sleapbatch::workflow::{WorkflowCoordinator, WorkflowRequest, prepare_workflow};

type TestResult = Result<(), Box<dyn Error>>;

fn request(ws: &Workspace, videos: Vec<PathBuf>, order: WorkflowMode) -> WorkflowRequest {
    WorkflowRequest {
        model: ws.model(),
        videos,
        output_dirs: vec![ws.output_dir("out", false)],
        base_name: "labels.v001".into(),
        mode: Mode::Face,
        frame_rate: 120,
        format: VideoFormat::Mp4,
        order,
    }
}

fn stage_lines(logs: &[String]) -> Vec<String> {
    logs.iter()
        .filter(|l| l.starts_with("[Workflow]"))
        .cloned()
        .collect()
}

#[tokio::test]
async fn interleaved_finishes_each_video_before_the_next() -> TestResult {
    init_tracing();
    let ws = Workspace::new();
    let videos = vec![ws.video("clip_a.mp4"), ws.video("clip_b.mp4")];

    let sup = FakeSupervisor::new().creating_outputs();
    let exporter = FakeExporter::new();
    let engine = engine_with(ToolConfigBuilder::new().build(), &sup, &exporter);

    let handle = engine.submit_workflow(request(&ws, videos, WorkflowMode::Interleaved))?;
    let events = with_timeout(handle.collect()).await;

    match events.last() {
        Some(TaskEvent::Finished(r)) => assert!(r.success, "{r:?}"),
        other => panic!("unexpected {other:?}"),
    }

    let logs = log_texts(&events);
    assert_eq!(
        stage_lines(&logs),
        vec![
            "[Workflow] Video 1/2 (clip_a.mp4): tracking",
            "[Workflow] Video 1/2 (clip_a.mp4): CSV export",
            "[Workflow] Video 1/2 (clip_a.mp4): video rendering",
            "[Workflow] Video 2/2 (clip_b.mp4): tracking",
            "[Workflow] Video 2/2 (clip_b.mp4): CSV export",
            "[Workflow] Video 2/2 (clip_b.mp4): video rendering",
        ]
    );

    assert_eq!(
        sup.programs(),
        vec!["sleap-track", "sleap-render", "sleap-track", "sleap-render"]
    );
    assert_eq!(
        exporter.csv_names(),
        vec![
            "labels.v001.000_clip_a.analysis.csv",
            "labels.v001.000_clip_b.analysis.csv",
        ]
    );

    let progress = progress_values(&events);
    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{progress:?}");
    assert_eq!(progress.last(), Some(&100));
    Ok(())
}

#[tokio::test]
async fn staged_runs_all_tracks_first() -> TestResult {
    init_tracing();
    let ws = Workspace::new();
    let videos = vec![ws.video("clip_a.mp4"), ws.video("clip_b.mp4")];

    let sup = FakeSupervisor::new().creating_outputs();
    let exporter = FakeExporter::new();
    let engine = engine_with(ToolConfigBuilder::new().build(), &sup, &exporter);

    let handle = engine.submit_workflow(request(&ws, videos, WorkflowMode::Staged))?;
    let events = with_timeout(handle.collect()).await;

    assert_eq!(
        sup.programs(),
        vec!["sleap-track", "sleap-track", "sleap-render", "sleap-render"]
    );
    assert_eq!(exporter.calls().len(), 2);
    assert_eq!(
        stage_lines(&log_texts(&events)),
        vec![
            "[Workflow] Stage 1/3: tracking of 2 video(s)",
            "[Workflow] Stage 2/3: CSV export of 2 video(s)",
            "[Workflow] Stage 3/3: video rendering of 2 video(s)",
        ]
    );
    assert_eq!(progress_values(&events).last(), Some(&100));
    Ok(())
}

#[tokio::test]
async fn failed_stage_halts_the_whole_workflow() -> TestResult {
    init_tracing();
    let ws = Workspace::new();
    let videos = vec![ws.video("clip_a.mp4"), ws.video("clip_b.mp4")];

    let sup = FakeSupervisor::new()
        .creating_outputs()
        .failing_when("clip_b.mp4");
    let exporter = FakeExporter::new();
    let engine = engine_with(ToolConfigBuilder::new().build(), &sup, &exporter);

    let handle = engine.submit_workflow(request(&ws, videos, WorkflowMode::Interleaved))?;
    let events = with_timeout(handle.collect()).await;

    let result = match events.last() {
        Some(TaskEvent::Finished(r)) => r.clone(),
        other => panic!("unexpected {other:?}"),
    };
    assert!(!result.success);
    assert!(
        result.message.contains("tracking of video 2/2"),
        "{}",
        result.message
    );

    assert_eq!(sup.programs(), vec!["sleap-track", "sleap-render", "sleap-track"]);
    assert_eq!(exporter.calls().len(), 1);
    assert!(has_line(&log_texts(&events), "Error: Workflow halted"));
    Ok(())
}

#[tokio::test]
async fn coordinator_discards_state_after_failure() -> TestResult {
    init_tracing();
    let ws = Workspace::new();
    let cfg = ToolConfigBuilder::new().build();
    let videos = vec![ws.video("clip_a.mp4")];
    let workflow = prepare_workflow(&request(&ws, videos, WorkflowMode::Interleaved), &cfg)?;

    let sup = FakeSupervisor::new().failing_at(0);
    let runner = TaskRunner::new(
        Arc::new(sup.clone()),
        Arc::new(FakeExporter::new()),
        Arc::new(cfg),
    );
    let mut coordinator = WorkflowCoordinator::new(runner);
    let (reporter, _completion, _rx) = task_channel();

    let outcome = with_timeout(coordinator.run(&workflow, &CancelFlag::new(), &reporter)).await;

    assert!(matches!(outcome, TaskOutcome::Failed(_)), "{outcome:?}");
    assert!(coordinator.state().is_none());
    assert_eq!(sup.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn cancelled_workflow_reports_cancellation() -> TestResult {
    init_tracing();
    let ws = Workspace::new();
    let videos = vec![ws.video("clip_a.mp4"), ws.video("clip_b.mp4")];

    let sup = FakeSupervisor::new().creating_outputs().blocking_at(1);
    let exporter = FakeExporter::new();
    let engine = engine_with(ToolConfigBuilder::new().build(), &sup, &exporter);

    let mut handle = engine.submit_workflow(request(&ws, videos, WorkflowMode::Interleaved))?;
    let mut logs = Vec::new();
    let result = loop {
        match with_timeout(handle.next_event()).await {
            Some(TaskEvent::Log(line)) => {
                if line.text.contains("fake run of Rendering") {
                    handle.cancel();
                }
                logs.push(line.text);
            }
            Some(TaskEvent::Finished(r)) => break r,
            Some(TaskEvent::Progress(_)) => {}
            None => panic!("channel closed without a result"),
        }
    };

    assert!(!result.success);
    assert!(has_line(&logs, "Cancelled: Workflow cancelled"));
    assert_eq!(sup.programs(), vec!["sleap-track", "sleap-render"]);
    assert!(!engine.is_busy());
    Ok(())
}
