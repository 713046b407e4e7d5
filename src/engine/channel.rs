// src/engine/channel.rs

//! The boundary between a background task and its caller.
//!
//! A task talks to its caller through three signals carried by one ordered
//! channel: progress percentages, log lines, and exactly one terminal
//! [`TaskResult`]. The caller owns a [`TaskHandle`] for the lifetime of the
//! task and uses it to observe events and to request cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Shared cooperative cancellation flag.
///
/// Set by the caller, read by the background task. Once set it stays set.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One line for the caller's log view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub text: String,
    /// Overwrite the most recently appended line instead of appending.
    pub replace_last: bool,
}

impl LogLine {
    pub fn append(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            replace_last: false,
        }
    }

    pub fn replace_last(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            replace_last: true,
        }
    }
}

/// Terminal outcome of one submitted task or workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Progress(u8),
    Log(LogLine),
    Finished(TaskResult),
}

/// Producer side of the task channel, owned by the background task.
///
/// Sends never block and never fail loudly: a caller that dropped its handle
/// simply stops receiving.
#[derive(Debug, Clone)]
pub struct TaskReporter {
    tx: mpsc::UnboundedSender<TaskEvent>,
}

impl TaskReporter {
    pub fn progress(&self, percent: u8) {
        self.send(TaskEvent::Progress(percent.min(100)));
    }

    pub fn log(&self, text: impl Into<String>) {
        self.send(TaskEvent::Log(LogLine::append(text)));
    }

    pub fn log_replace_last(&self, text: impl Into<String>) {
        self.send(TaskEvent::Log(LogLine::replace_last(text)));
    }

    fn send(&self, event: TaskEvent) {
        if self.tx.send(event).is_err() {
            debug!("task channel receiver dropped; event discarded");
        }
    }
}

/// Sends the single terminal event. Consumed on use, so a task cannot finish
/// twice.
#[derive(Debug)]
pub struct Completion {
    tx: mpsc::UnboundedSender<TaskEvent>,
}

impl Completion {
    pub fn finish(self, result: TaskResult) {
        let _ = self.tx.send(TaskEvent::Finished(result));
    }
}

/// Create a connected reporter / completion / receiver triple.
pub fn task_channel() -> (TaskReporter, Completion, mpsc::UnboundedReceiver<TaskEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        TaskReporter { tx: tx.clone() },
        Completion { tx },
        rx,
    )
}

/// Caller-owned handle to a running task.
#[derive(Debug)]
pub struct TaskHandle {
    cancel: CancelFlag,
    events: mpsc::UnboundedReceiver<TaskEvent>,
    join: JoinHandle<()>,
}

impl TaskHandle {
    pub fn new(
        cancel: CancelFlag,
        events: mpsc::UnboundedReceiver<TaskEvent>,
        join: JoinHandle<()>,
    ) -> Self {
        Self {
            cancel,
            events,
            join,
        }
    }

    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Next event in emission order; `None` once the task is gone.
    pub async fn next_event(&mut self) -> Option<TaskEvent> {
        self.events.recv().await
    }

    /// Drain the task, handing every non-terminal event to `on_event`, and
    /// return the terminal result.
    pub async fn wait_with<F>(mut self, mut on_event: F) -> TaskResult
    where
        F: FnMut(&TaskEvent),
    {
        let mut result = None;
        while let Some(event) = self.events.recv().await {
            match event {
                TaskEvent::Finished(r) => {
                    result = Some(r);
                    break;
                }
                other => on_event(&other),
            }
        }

        if let Err(e) = self.join.await {
            debug!(error = %e, "task join failed");
        }

        result.unwrap_or_else(|| TaskResult {
            success: false,
            message: "task ended without reporting a result".to_string(),
        })
    }

    /// Drain the task, collecting every event including the terminal one.
    pub async fn collect(mut self) -> Vec<TaskEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            let done = matches!(event, TaskEvent::Finished(_));
            events.push(event);
            if done {
                break;
            }
        }
        let _ = self.join.await;
        events
    }
}
