// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] builds invocations of the external toolkit programs.
//! - [`monitor`] supervises one invocation: output capture, status lines,
//!   progress, timeout, cancellation and exit-code interpretation.
//! - [`progress`] holds the progress arithmetic.
//! - [`backend`] provides the `ProcessSupervisor` trait the task runner uses,
//!   implemented by `ProcessMonitor` in production and by fakes in tests.

pub mod backend;
pub mod command;
pub mod monitor;
pub mod progress;

pub use backend::{ProcessSupervisor, SuperviseFuture};
pub use command::{Invocation, convert_invocation, render_invocation, track_invocation};
pub use monitor::ProcessMonitor;
pub use progress::{ProgressFn, ProgressState, format_elapsed};
