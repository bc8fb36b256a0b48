// SPDX-License-Identifier: MIT
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use crate::layout::Layout;
use crate::layout::presets::{dashboard_layout, default_layout};
use crate::layout::visibility::Role;
use crate::session::EditorSession;
use crate::sync::script::{DEFAULT_TIMEOUT_MS, ProcessEvaluator, ScriptEvaluator};
use crate::sync::worker::ScriptWorker;
use crate::sync::{DEFAULT_DEBOUNCE_MS, DualSync};

#[derive(Args, Debug, Clone)]
pub struct ScriptArgs {
    /// Interpreter that evaluates the script surface (reads the snippet on
    /// stdin, prints the returned layout as JSON). Defaults to node.
    #[arg(long)]
    pub script_program: Option<String>,
    /// Extra argument for --script-program; repeatable
    #[arg(long = "script-arg", allow_hyphen_values = true)]
    pub script_args: Vec<String>,
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub script_timeout_ms: u64,
    /// Disable the script surface entirely
    #[arg(long)]
    pub no_script: bool,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Layout JSON to open; starts from a preset when omitted
    pub file: Option<PathBuf>,
    /// View as an administrator (shows admin-only panels and the text editors)
    #[arg(long)]
    pub admin: bool,
    /// Start from the dashboard preset instead of the two-panel one
    #[arg(long, conflicts_with = "file")]
    pub dashboard: bool,
    /// Where to write the layout on quit
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[arg(long, default_value_t = DEFAULT_DEBOUNCE_MS)]
    pub debounce_ms: u64,
    #[command(flatten)]
    pub script: ScriptArgs,
    /// Write diagnostics to this file (filter with PANELWRIGHT_LOG)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Settings for the script evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptConfig {
    pub enabled: bool,
    pub program: Option<String>,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl ScriptConfig {
    #[must_use]
    pub fn evaluator(&self) -> Option<ProcessEvaluator> {
        if !self.enabled {
            return None;
        }
        Some(match &self.program {
            Some(program) => ProcessEvaluator::new(program.clone(), self.args.clone(), self.timeout),
            None => ProcessEvaluator::node(self.timeout),
        })
    }
}

impl From<&ScriptArgs> for ScriptConfig {
    fn from(args: &ScriptArgs) -> Self {
        Self {
            enabled: !args.no_script,
            program: args.script_program.clone(),
            args: args.script_args.clone(),
            timeout: Duration::from_millis(args.script_timeout_ms),
        }
    }
}

/// Everything needed to start an interactive editor.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    pub input: Option<PathBuf>,
    pub dashboard: bool,
    pub role: Role,
    pub output: Option<PathBuf>,
    pub debounce: Duration,
    pub script: ScriptConfig,
    pub log_file: Option<PathBuf>,
}

impl From<EditArgs> for EditorConfig {
    fn from(args: EditArgs) -> Self {
        Self {
            script: ScriptConfig::from(&args.script),
            input: args.file,
            dashboard: args.dashboard,
            role: if args.admin { Role::Admin } else { Role::Standard },
            output: args.output,
            debounce: Duration::from_millis(args.debounce_ms),
            log_file: args.log_file,
        }
    }
}

impl EditorConfig {
    /// The tree the editor opens with.
    ///
    /// # Errors
    ///
    /// Returns an error if the input file cannot be read or parsed.
    pub fn initial_layout(&self) -> Result<Layout> {
        match &self.input {
            Some(path) => load_layout(path),
            None if self.dashboard => Ok(dashboard_layout()),
            None => Ok(default_layout()),
        }
    }

    /// Builds the session, spawning the script worker if enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout cannot be loaded or the worker thread
    /// cannot be started.
    pub fn build_session(&self) -> Result<EditorSession> {
        let tree = self.initial_layout()?;
        let worker = match self.script.evaluator() {
            Some(evaluator) => {
                let evaluator: Box<dyn ScriptEvaluator> = Box::new(evaluator);
                Some(ScriptWorker::spawn(evaluator)?)
            }
            None => None,
        };
        let sync = DualSync::new(&tree, self.debounce, worker);
        Ok(EditorSession::new(tree, self.role, sync))
    }
}

/// Reads and validates a layout document.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid layout.
pub fn load_layout(path: &Path) -> Result<Layout> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Layout::from_json(&text).with_context(|| format!("invalid layout in {}", path.display()))
}
