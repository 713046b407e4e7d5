// src/exec/backend.rs

//! Pluggable supervision backend.
//!
//! The task runner talks to a `ProcessSupervisor` instead of the monitor
//! directly, so tests can swap in a double that records invocations and
//! fakes outcomes without spawning anything.

use std::future::Future;
use std::pin::Pin;

use crate::engine::channel::{CancelFlag, TaskReporter};
use crate::errors::SuperviseError;
use crate::exec::command::Invocation;
use crate::exec::monitor::ProcessMonitor;

pub type SuperviseFuture<'a> = Pin<Box<dyn Future<Output = Result<(), SuperviseError>> + Send + 'a>>;

/// Runs one invocation to a terminal outcome.
pub trait ProcessSupervisor: Send + Sync {
    fn supervise<'a>(
        &'a self,
        invocation: &'a Invocation,
        cancel: &'a CancelFlag,
        reporter: &'a TaskReporter,
    ) -> SuperviseFuture<'a>;
}

impl ProcessSupervisor for ProcessMonitor {
    fn supervise<'a>(
        &'a self,
        invocation: &'a Invocation,
        cancel: &'a CancelFlag,
        reporter: &'a TaskReporter,
    ) -> SuperviseFuture<'a> {
        Box::pin(ProcessMonitor::supervise(self, invocation, cancel, reporter))
    }
}
