// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod labels;
pub mod logging;
pub mod types;
pub mod workflow;

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command, TrackArgs};
use crate::config::{SettingsStore, ToolConfig, load_or_default};
use crate::engine::channel::{LogLine, TaskEvent, TaskHandle};
use crate::engine::validate::{PreparedTask, prepare};
use crate::engine::{Engine, ExportParams, RenderParams, Task, TrackParams};
use crate::exec::{ProgressState, render_invocation, track_invocation};
use crate::labels::{render_output_path, track_output_path};
use crate::types::WorkflowMode;
use crate::workflow::{WorkflowRequest, prepare_workflow};

/// High-level entry point used by `main.rs`.
///
/// Loads the tool config, submits the requested task to an [`Engine`],
/// prints its log until it finishes and returns whether it succeeded.
/// Ctrl-C requests cancellation.
pub async fn run(args: CliArgs) -> Result<bool> {
    let cfg = load_or_default(&args.config)?;
    let settings = SettingsStore::per_user();

    if args.dry_run {
        print_dry_run(&args.command, &cfg, settings.as_ref())?;
        return Ok(true);
    }

    let mut engine = Engine::with_processes(cfg);
    if let Some(store) = settings.clone() {
        engine = engine.with_settings(store);
    }

    let handle = match &args.command {
        Command::Workflow(w) => {
            engine.submit_workflow(workflow_request(w, settings.as_ref()))?
        }
        other => engine.submit(task_from_command(other, settings.as_ref()))?,
    };

    wait_and_print(handle).await
}

async fn wait_and_print(handle: TaskHandle) -> Result<bool> {
    let cancel = handle.cancel_flag();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        info!("Ctrl+C received; cancelling");
        cancel.cancel();
    });

    let mut printer = LogPrinter::default();
    let result = handle
        .wait_with(|event| match event {
            TaskEvent::Log(line) => printer.print(line),
            TaskEvent::Progress(p) => debug!(progress = p, "progress"),
            TaskEvent::Finished(_) => {}
        })
        .await;
    printer.close();

    Ok(result.success)
}

/// Prints channel log lines with a local `[HH:MM:SS]` prefix.
///
/// The last line is left open so a replace-last line can overwrite it with
/// a carriage return.
#[derive(Default)]
struct LogPrinter {
    line_open: bool,
}

impl LogPrinter {
    fn print(&mut self, line: &LogLine) {
        let stamp = chrono::Local::now().format("%H:%M:%S");
        let mut out = std::io::stdout().lock();
        let lead = match (line.replace_last, self.line_open) {
            (true, true) => "\r\x1b[2K",
            (_, true) => "\n",
            (_, false) => "",
        };
        let _ = write!(out, "{lead}[{stamp}] {}", line.text);
        let _ = out.flush();
        self.line_open = true;
    }

    fn close(&mut self) {
        if self.line_open {
            println!();
            self.line_open = false;
        }
    }
}

fn resolve_model(model: Option<&PathBuf>, settings: Option<&SettingsStore>) -> PathBuf {
    model
        .cloned()
        .or_else(|| settings.and_then(|s| s.load().last_model()))
        .unwrap_or_default()
}

fn track_params(args: &TrackArgs, settings: Option<&SettingsStore>) -> TrackParams {
    TrackParams {
        model: resolve_model(args.model.as_ref(), settings),
        videos: args.videos.clone(),
        output_dirs: args.output_dirs.clone(),
        base_name: args.base_name.clone(),
        mode: args.mode,
    }
}

fn workflow_request(args: &cli::WorkflowArgs, settings: Option<&SettingsStore>) -> WorkflowRequest {
    let track = track_params(&args.track, settings);
    WorkflowRequest {
        model: track.model,
        videos: track.videos,
        output_dirs: track.output_dirs,
        base_name: track.base_name,
        mode: track.mode,
        frame_rate: args.frame_rate,
        format: args.format,
        order: if args.staged {
            WorkflowMode::Staged
        } else {
            WorkflowMode::Interleaved
        },
    }
}

fn task_from_command(command: &Command, settings: Option<&SettingsStore>) -> Task {
    match command {
        Command::Track(t) => Task::Track(track_params(t, settings)),
        Command::Render(r) => Task::Render(RenderParams {
            labels: r.labels.clone(),
            output_dirs: r.output_dirs.clone(),
            frame_rate: r.frame_rate,
            format: r.format,
        }),
        Command::Export(e) => Task::Export(ExportParams {
            labels: e.labels.clone(),
            output_dirs: e.output_dirs.clone(),
            videos: e.videos.clone(),
            base_name: e.base_name.clone(),
        }),
        Command::Workflow(w) => Task::Track(track_params(&w.track, settings)),
    }
}

/// Validate the request and print the commands it would run.
fn print_dry_run(
    command: &Command,
    cfg: &ToolConfig,
    settings: Option<&SettingsStore>,
) -> Result<()> {
    println!("sleapbatch dry-run");

    if let Command::Workflow(w) = command {
        let workflow = prepare_workflow(&workflow_request(w, settings), cfg)?;
        println!("workflow ({:?}, {} video(s)):", workflow.order, workflow.items.len());
        for (i, item) in workflow.items.iter().enumerate() {
            let labels = track_output_path(
                &item.output_dir,
                &workflow.base_name,
                &item.video,
                &cfg.batch.labels_extension,
            );
            let track = track_invocation(
                cfg,
                &workflow.model,
                &item.video,
                &labels,
                workflow.mode,
                ProgressState::FULL,
            );
            let render = render_invocation(
                cfg,
                &labels,
                &render_output_path(&labels, workflow.format),
                workflow.frame_rate,
                ProgressState::FULL,
            );
            println!("  - video {}: {}", i + 1, item.video.display());
            println!("      track:  {}", track.command_line());
            println!("      export: {} -> CSV", labels.display());
            println!("      render: {}", render.command_line());
        }
        return Ok(());
    }

    let task = task_from_command(command, settings);
    match prepare(&task, cfg)? {
        PreparedTask::Track {
            model,
            mode,
            base_name,
            pairs,
        } => {
            println!("track ({} video(s)):", pairs.len());
            for (video, output_dir) in &pairs {
                let output =
                    track_output_path(output_dir, &base_name, video, &cfg.batch.labels_extension);
                let inv = track_invocation(cfg, &model, video, &output, mode, ProgressState::FULL);
                println!("  - {}", inv.command_line());
            }
        }
        PreparedTask::Render {
            labels,
            frame_rate,
            format,
        } => {
            println!("render ({} file(s)):", labels.len());
            for labels_path in &labels {
                let output = render_output_path(labels_path, format);
                let inv = render_invocation(cfg, labels_path, &output, frame_rate, ProgressState::FULL);
                println!("  - {}", inv.command_line());
            }
        }
        PreparedTask::Export { labels, .. } => {
            println!("export ({} file(s)):", labels.len());
            for labels_path in &labels {
                println!("  - {}", labels_path.display());
            }
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
