// SPDX-License-Identifier: MIT
//! Keeps the serialized and script text surfaces in step with the tree.

pub mod debounce;
pub mod script;
pub mod worker;

use std::time::{Duration, Instant};

use serde_json::Value;

use crate::layout::presets::script_for;
use crate::layout::{Layout, LayoutError};
use debounce::Debouncer;
use worker::ScriptWorker;

pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(DEFAULT_DEBOUNCE_MS);
const RESULT_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("malformed layout text: {0}")]
    MalformedSerializedText(#[from] LayoutError),
    #[error("script evaluation failed: {0}")]
    ScriptEvaluationFailure(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Serialized,
    Script,
}

#[derive(Debug)]
struct TextSurface {
    text: String,
    timer: Debouncer,
    diagnostic: Option<SyncError>,
}

impl TextSurface {
    fn new(text: String, delay: Duration) -> Self {
        Self {
            text,
            timer: Debouncer::new(delay),
            diagnostic: None,
        }
    }

    fn reset(&mut self, text: String) {
        self.text = text;
        self.timer.cancel();
        self.diagnostic = None;
    }
}

/// Converts an evaluated script value into a tree.
///
/// # Errors
///
/// Fails if the value is not an object or does not describe a valid layout.
pub fn layout_from_script(value: Value) -> Result<Layout, SyncError> {
    if !value.is_object() {
        return Err(SyncError::ScriptEvaluationFailure(format!(
            "script must return a layout object, got {}",
            kind_of(&value)
        )));
    }
    Layout::from_value(value).map_err(|e| SyncError::ScriptEvaluationFailure(e.to_string()))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn serialize(layout: &Layout) -> String {
    layout.to_json_pretty().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to serialize layout");
        String::new()
    })
}

fn scripted(layout: &Layout) -> String {
    script_for(layout).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to generate layout script");
        String::new()
    })
}

/// The two text mirrors of the canonical tree and their pending commits.
///
/// The tree itself lives with the caller: [`DualSync::tick`] hands back a
/// replacement tree whenever a surface commits successfully.
pub struct DualSync {
    serialized: TextSurface,
    script: TextSurface,
    worker: Option<ScriptWorker>,
    generation: u64,
    in_flight: Option<u64>,
}

impl DualSync {
    /// Mirrors `tree`. Without a worker the script surface is read-only.
    #[must_use]
    pub fn new(tree: &Layout, delay: Duration, worker: Option<ScriptWorker>) -> Self {
        Self {
            serialized: TextSurface::new(serialize(tree), delay),
            script: TextSurface::new(scripted(tree), delay),
            worker,
            generation: 0,
            in_flight: None,
        }
    }

    #[must_use]
    pub fn script_enabled(&self) -> bool {
        self.worker.is_some()
    }

    #[must_use]
    pub fn text(&self, surface: Surface) -> &str {
        &self.surface(surface).text
    }

    #[must_use]
    pub fn diagnostic(&self, surface: Surface) -> Option<&SyncError> {
        self.surface(surface).diagnostic.as_ref()
    }

    #[must_use]
    pub fn is_pending(&self, surface: Surface) -> bool {
        let pending = self.surface(surface).timer.is_pending();
        match surface {
            Surface::Serialized => pending,
            Surface::Script => pending || self.in_flight.is_some(),
        }
    }

    /// Replaces a surface's text and restarts its quiet period.
    pub fn edit(&mut self, surface: Surface, text: String, now: Instant) {
        if surface == Surface::Script && !self.script_enabled() {
            return;
        }
        let target = self.surface_mut(surface);
        target.text = text;
        target.timer.arm(now);
    }

    /// Re-serializes the tree after a structural edit, discarding any
    /// uncommitted serialized text. A script evaluation still running was
    /// started against the older tree and is abandoned.
    pub fn refresh_from_tree(&mut self, tree: &Layout) {
        self.serialized.reset(serialize(tree));
        if self.in_flight.take().is_some() {
            self.generation += 1;
        }
    }

    /// Rewrites the script surface from the tree. A script evaluation still
    /// running is abandoned.
    pub fn regenerate_script(&mut self, tree: &Layout) {
        self.script.reset(scripted(tree));
        self.generation += 1;
        self.in_flight = None;
    }

    /// How long the event loop may sleep before the next [`tick`](Self::tick)
    /// has work to do.
    #[must_use]
    pub fn next_wake(&self, now: Instant) -> Option<Duration> {
        let polling = self.in_flight.map(|_| RESULT_POLL);
        [
            self.serialized.timer.remaining(now),
            self.script.timer.remaining(now),
            polling,
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Commits due surfaces and collects finished script results. The
    /// serialized commit is applied before any script result, so when both
    /// land in the same tick the script's tree wins.
    pub fn tick(&mut self, now: Instant) -> Option<Layout> {
        let mut adopted = None;

        if self.serialized.timer.fire(now) {
            match Layout::from_json(&self.serialized.text) {
                Ok(tree) => {
                    tracing::debug!(panels = tree.panel_count(), "serialized text committed");
                    self.serialized.diagnostic = None;
                    adopted = Some(tree);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "rejected serialized text");
                    self.serialized.diagnostic = Some(e.into());
                }
            }
        }

        if self.script.timer.fire(now)
            && let Some(worker) = &self.worker
        {
            self.generation += 1;
            self.in_flight = Some(self.generation);
            worker.submit(self.generation, self.script.text.clone());
        }

        while let Some(outcome) = self.worker.as_ref().and_then(ScriptWorker::try_recv) {
            if outcome.generation != self.generation {
                tracing::debug!(generation = outcome.generation, "dropping stale script result");
                continue;
            }
            self.in_flight = None;
            match outcome.result.and_then(layout_from_script) {
                Ok(tree) => {
                    tracing::debug!(panels = tree.panel_count(), "script committed");
                    self.script.diagnostic = None;
                    self.serialized.reset(serialize(&tree));
                    adopted = Some(tree);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "rejected script result");
                    self.script.diagnostic = Some(e);
                }
            }
        }

        adopted
    }

    fn surface(&self, surface: Surface) -> &TextSurface {
        match surface {
            Surface::Serialized => &self.serialized,
            Surface::Script => &self.script,
        }
    }

    fn surface_mut(&mut self, surface: Surface) -> &mut TextSurface {
        match surface {
            Surface::Serialized => &mut self.serialized,
            Surface::Script => &mut self.script,
        }
    }
}
