// src/workflow/state.rs

//! Pure workflow cursor.
//!
//! `WorkflowState` only knows where the workflow is in its (item, stage)
//! space and how that maps onto the overall progress scale. It performs no
//! IO; the coordinator drives it.

use std::fmt;
use std::path::PathBuf;

use crate::exec::ProgressState;

/// Per-item pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Track,
    Export,
    Render,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Track, Stage::Export, Stage::Render];
    pub const COUNT: usize = 3;

    pub fn ordinal(self) -> usize {
        match self {
            Stage::Track => 0,
            Stage::Export => 1,
            Stage::Render => 2,
        }
    }

    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Track => Some(Stage::Export),
            Stage::Export => Some(Stage::Render),
            Stage::Render => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Track => f.write_str("tracking"),
            Stage::Export => f.write_str("CSV export"),
            Stage::Render => f.write_str("video rendering"),
        }
    }
}

/// One video and where its outputs go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowItem {
    pub video: PathBuf,
    pub output_dir: PathBuf,
}

/// Where an interleaved workflow currently is.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowState {
    items: Vec<WorkflowItem>,
    item_index: usize,
    stage: Stage,
    complete: bool,
}

impl WorkflowState {
    pub fn new(items: Vec<WorkflowItem>) -> Self {
        let complete = items.is_empty();
        Self {
            items,
            item_index: 0,
            stage: Stage::Track,
            complete,
        }
    }

    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    pub fn item_index(&self) -> usize {
        self.item_index
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn items(&self) -> &[WorkflowItem] {
        &self.items
    }

    /// The item being worked on, `None` once the workflow is complete.
    pub fn current_item(&self) -> Option<&WorkflowItem> {
        if self.complete {
            None
        } else {
            self.items.get(self.item_index)
        }
    }

    /// Move past the stage that just succeeded.
    pub fn advance(&mut self) {
        if self.complete {
            return;
        }
        match self.stage.next() {
            Some(stage) => self.stage = stage,
            None if self.item_index + 1 < self.items.len() => {
                self.item_index += 1;
                self.stage = Stage::Track;
            }
            None => self.complete = true,
        }
    }

    /// Progress slice of the current (item, stage).
    pub fn scope(&self) -> ProgressState {
        interleaved_scope(self.items.len(), self.item_index, self.stage)
    }

    /// Overall progress for a stage-internal `sub_percent`.
    pub fn overall_progress(&self, sub_percent: f64) -> f64 {
        self.scope().at(sub_percent)
    }
}

/// `base = (index * 3 + ordinal) / (total * 3) * 100`, `weight = 100 / (total * 3)`.
pub fn interleaved_scope(total_items: usize, item_index: usize, stage: Stage) -> ProgressState {
    let slots = total_items.max(1) * Stage::COUNT;
    ProgressState::FULL.nested(item_index * Stage::COUNT + stage.ordinal(), slots)
}

/// Staged mode gives each stage a third of the scale.
pub fn staged_scope(stage: Stage) -> ProgressState {
    ProgressState::FULL.nested(stage.ordinal(), Stage::COUNT)
}
