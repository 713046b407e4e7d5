// src/exec/monitor.rs

//! Supervision of one external process invocation, end to end.
//!
//! - stdout and stderr are drained by two independent reader tasks feeding
//!   one queue, so a quiet stream never blocks the other;
//! - a poll loop checks liveness, cancellation and the wall-clock ceiling,
//!   forwards captured lines, and emits elapsed-time status and progress;
//! - the child is reaped before `supervise` returns, on every path.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout, timeout_at};
use tracing::{debug, info, warn};

use crate::config::ToolConfig;
use crate::engine::channel::{CancelFlag, TaskReporter};
use crate::errors::SuperviseError;
use crate::exec::command::Invocation;
use crate::exec::progress::{format_elapsed, to_percent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

#[derive(Debug)]
struct OutputLine {
    stream: Stream,
    text: String,
}

/// Supervises external processes. Cheap to copy; holds no per-process state.
#[derive(Debug, Clone, Copy)]
pub struct ProcessMonitor {
    poll_interval: Duration,
    kill_grace: Duration,
}

impl Default for ProcessMonitor {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            kill_grace: Duration::from_millis(500),
        }
    }
}

impl ProcessMonitor {
    pub fn new(poll_interval: Duration, kill_grace: Duration) -> Self {
        Self {
            poll_interval,
            kill_grace,
        }
    }

    pub fn from_config(cfg: &ToolConfig) -> Self {
        Self::new(cfg.poll_interval(), cfg.kill_grace())
    }

    /// Run `inv` to completion, cancellation or timeout.
    ///
    /// Exit code 0 is `Ok`; anything else is `Failed` carrying every stderr
    /// line seen.
    pub async fn supervise(
        &self,
        inv: &Invocation,
        cancel: &CancelFlag,
        reporter: &TaskReporter,
    ) -> Result<(), SuperviseError> {
        info!(
            program = %inv.program,
            description = %inv.description,
            max_wait_secs = inv.max_wait.as_secs(),
            "starting supervised process"
        );
        debug!(cmd = %inv.command_line(), "command line");

        let mut child = spawn(inv)?;
        let (line_tx, mut line_rx) = mpsc::unbounded_channel::<OutputLine>();
        let readers = spawn_readers(&mut child, line_tx);

        let mut session = Session::new(inv, reporter);
        session.publish(inv.progress.base);

        let start = Instant::now();
        let mut last_status = start;

        loop {
            sleep(self.poll_interval).await;
            session.forward(&mut line_rx);

            if let Some(status) = child.try_wait()? {
                self.finish_readers(readers, &mut line_rx, &mut session).await;
                return session.exit(status);
            }

            if cancel.is_cancelled() {
                info!(description = %inv.description, "cancellation requested; stopping process");
                self.terminate(&mut child).await;
                self.finish_readers(readers, &mut line_rx, &mut session).await;
                reporter.log(format!("{}... cancelled", inv.description));
                return Err(SuperviseError::Cancelled);
            }

            let elapsed = start.elapsed();
            if elapsed > inv.max_wait {
                warn!(
                    description = %inv.description,
                    elapsed_secs = elapsed.as_secs(),
                    "process exceeded its time limit; stopping it"
                );
                self.terminate(&mut child).await;
                self.finish_readers(readers, &mut line_rx, &mut session).await;
                reporter.log(format!(
                    "{} timed out after {} and was terminated",
                    inv.description,
                    format_elapsed(inv.max_wait)
                ));
                return Err(SuperviseError::TimedOut {
                    description: inv.description.clone(),
                    limit: inv.max_wait,
                });
            }

            if last_status.elapsed() >= inv.update_interval {
                last_status = Instant::now();
                session.status(elapsed);
            }
        }
    }

    /// Graceful terminate, then a forced kill once the grace period is over.
    /// Always leaves the child reaped.
    async fn terminate(&self, child: &mut Child) {
        let pid = child.id();
        signal_terminate(child);

        match timeout(self.kill_grace, child.wait()).await {
            Ok(Ok(status)) => {
                debug!(?pid, ?status, "process exited after terminate signal");
            }
            Ok(Err(e)) => {
                warn!(?pid, error = %e, "waiting for terminated process failed");
            }
            Err(_) => {
                warn!(?pid, "process ignored terminate signal; killing it");
                if let Some(pid) = pid {
                    signal_group(pid, Signal::Kill);
                }
                if let Err(e) = child.kill().await {
                    warn!(?pid, error = %e, "failed to kill process");
                }
            }
        }
    }

    /// Let the readers hit end-of-stream (bounded by the grace period), then
    /// forward whatever they queued.
    async fn finish_readers(
        &self,
        readers: Vec<JoinHandle<()>>,
        line_rx: &mut mpsc::UnboundedReceiver<OutputLine>,
        session: &mut Session<'_>,
    ) {
        let deadline = Instant::now() + self.kill_grace;
        for reader in readers {
            let abort = reader.abort_handle();
            if timeout_at(deadline, reader).await.is_err() {
                // A grandchild may still hold the pipe open.
                debug!("output reader still busy after process exit; aborting it");
                abort.abort();
            }
        }
        session.forward(line_rx);
    }
}

fn spawn(inv: &Invocation) -> Result<Child, SuperviseError> {
    let mut cmd = Command::new(&inv.program);
    cmd.args(&inv.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Own process group, so termination reaches helpers the tool forks.
    #[cfg(unix)]
    cmd.process_group(0);

    cmd.spawn().map_err(|source| SuperviseError::Spawn {
        program: inv.program.clone(),
        source,
    })
}

fn spawn_readers(child: &mut Child, tx: mpsc::UnboundedSender<OutputLine>) -> Vec<JoinHandle<()>> {
    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(tokio::spawn(pump(stdout, Stream::Stdout, tx.clone())));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(tokio::spawn(pump(stderr, Stream::Stderr, tx)));
    }
    readers
}

async fn pump<R>(reader: R, stream: Stream, tx: mpsc::UnboundedSender<OutputLine>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\r', '\n'])
                    .to_string();
                if tx.send(OutputLine { stream, text }).is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!(?stream, error = %e, "output stream read failed");
                break;
            }
        }
    }
}

/// Per-invocation bookkeeping.
struct Session<'a> {
    inv: &'a Invocation,
    reporter: &'a TaskReporter,
    stderr: Vec<String>,
    published: Option<u8>,
    status_emitted: bool,
}

impl<'a> Session<'a> {
    fn new(inv: &'a Invocation, reporter: &'a TaskReporter) -> Self {
        Self {
            inv,
            reporter,
            stderr: Vec::new(),
            published: None,
            status_emitted: false,
        }
    }

    /// Publish an overall percentage, never going backwards within this
    /// invocation.
    fn publish(&mut self, overall: f64) {
        let percent = to_percent(overall);
        if self.published.is_some_and(|p| percent < p) {
            return;
        }
        self.published = Some(percent);
        self.reporter.progress(percent);
    }

    fn forward(&mut self, rx: &mut mpsc::UnboundedReceiver<OutputLine>) {
        while let Ok(line) = rx.try_recv() {
            if line.text.trim().is_empty() {
                continue;
            }
            match line.stream {
                Stream::Stdout => self.reporter.log(format!("[OUTPUT] {}", line.text)),
                Stream::Stderr => {
                    self.reporter.log(format!("[ERROR] {}", line.text));
                    self.stderr.push(line.text);
                }
            }
        }
    }

    fn status(&mut self, elapsed: Duration) {
        let text = format!(
            "{}... (Elapsed {})",
            self.inv.description,
            format_elapsed(elapsed)
        );
        if self.status_emitted {
            self.reporter.log_replace_last(text);
        } else {
            self.reporter.log(text);
            self.status_emitted = true;
        }

        let sub = self.inv.progress_fn.percent(elapsed);
        self.publish(self.inv.progress.at(sub));
    }

    fn exit(mut self, status: ExitStatus) -> Result<(), SuperviseError> {
        info!(
            description = %self.inv.description,
            exit_code = ?status.code(),
            success = status.success(),
            "supervised process exited"
        );

        if status.success() {
            self.publish(self.inv.progress.end());
            Ok(())
        } else {
            Err(SuperviseError::Failed {
                code: status.code(),
                stderr: self.stderr.join("\n"),
            })
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Signal {
    Term,
    Kill,
}

fn signal_terminate(child: &mut Child) {
    match child.id() {
        Some(pid) => signal_group(pid, Signal::Term),
        None => debug!("process already reaped; nothing to terminate"),
    }

    // No graceful signal off unix; the forced kill is all there is.
    if cfg!(not(unix)) {
        if let Err(e) = child.start_kill() {
            debug!(error = %e, "start_kill failed");
        }
    }
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: Signal) {
    let sig = match signal {
        Signal::Term => libc::SIGTERM,
        Signal::Kill => libc::SIGKILL,
    };
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: plain syscall; the group id is the child's pid because it was
    // spawned with `process_group(0)`.
    let rc = unsafe { libc::kill(-pgid, sig) };
    if rc != 0 {
        debug!(pid, ?signal, "signalling process group failed (already gone?)");
    }
}

#[cfg(not(unix))]
fn signal_group(_pid: u32, _signal: Signal) {}
