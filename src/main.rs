// SPDX-License-Identifier: MIT
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

mod config;
mod layout;
mod render;
mod session;
mod sync;
mod tui;

use std::fs::OpenOptions;
use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseButton,
    MouseEventKind,
};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;

use crate::config::{EditArgs, EditorConfig, ScriptArgs, ScriptConfig, load_layout};
use crate::layout::ops::{normalize_tree, panel_ids};
use crate::layout::presets::{dashboard_layout, default_layout, script_for};
use crate::layout::visibility::{Role, project};
use crate::sync::layout_from_script;
use crate::sync::script::{DisabledEvaluator, ScriptEvaluator};
use crate::tui::app::App;
use crate::tui::input::{Action, handle_key};
use crate::tui::panes::draw_layout;
use crate::tui::theme::Theme;

const EVENT_POLL_TIMEOUT: Duration = Duration::from_millis(250);
const LOG_ENV: &str = "PANELWRIGHT_LOG";

#[derive(Parser)]
#[command(
    name = "panelwright",
    about = "panelwright: terminal editor for nested resizable panel layouts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit a layout interactively
    Edit(EditArgs),
    /// Draw a layout without a terminal UI and print it
    Render {
        file: PathBuf,
        #[arg(long)]
        admin: bool,
        #[arg(long, default_value = "80")]
        width: u16,
        #[arg(long, default_value = "24")]
        height: u16,
        /// Highlight this panel
        #[arg(long)]
        selected: Option<String>,
    },
    /// Print the layout as a viewer sees it, with every level summing to 100
    Normalize {
        file: PathBuf,
        #[arg(long)]
        admin: bool,
    },
    /// Validate a layout and print a summary
    Check { file: PathBuf },
    /// Evaluate a layout script and print the resulting layout
    Eval {
        file: PathBuf,
        #[command(flatten)]
        script: ScriptArgs,
    },
    /// Print a starter document
    Template {
        #[arg(value_enum, default_value_t = TemplateKind::Layout)]
        kind: TemplateKind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TemplateKind {
    Layout,
    Dashboard,
    Script,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Edit(args) => cmd_edit(&EditorConfig::from(args)),
        Commands::Render {
            file,
            admin,
            width,
            height,
            selected,
        } => {
            setup_stderr_tracing()?;
            cmd_render(&file, role_for(admin), width, height, selected.as_deref())
        }
        Commands::Normalize { file, admin } => {
            setup_stderr_tracing()?;
            cmd_normalize(&file, role_for(admin))
        }
        Commands::Check { file } => {
            setup_stderr_tracing()?;
            cmd_check(&file)
        }
        Commands::Eval { file, script } => {
            setup_stderr_tracing()?;
            cmd_eval(&file, &ScriptConfig::from(&script))
        }
        Commands::Template { kind } => cmd_template(kind),
    }
}

fn role_for(admin: bool) -> Role {
    if admin { Role::Admin } else { Role::Standard }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

fn env_filter(default: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default))
}

/// The editor owns the terminal, so it only logs when given a file.
fn setup_file_tracing(path: &Path) -> Result<()> {
    use tracing_subscriber::prelude::*;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);
    tracing_subscriber::registry()
        .with(env_filter("panelwright=debug"))
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;
    tracing::info!(path = %path.display(), "tracing initialized");
    Ok(())
}

fn setup_stderr_tracing() -> Result<()> {
    use tracing_subscriber::prelude::*;

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);
    tracing_subscriber::registry()
        .with(env_filter("warn"))
        .with(stderr_layer)
        .try_init()
        .context("failed to install tracing subscriber")
}

// ---------------------------------------------------------------------------
// Signal handling
// ---------------------------------------------------------------------------

fn install_signal_handler() -> Result<Arc<AtomicBool>> {
    let shutdown = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&shutdown))
        .context("failed to register SIGINT handler")?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&shutdown))
        .context("failed to register SIGTERM handler")?;
    Ok(shutdown)
}

// ---------------------------------------------------------------------------
// Terminal setup / teardown
// ---------------------------------------------------------------------------

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("failed to create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    crossterm::execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Edit subcommand
// ---------------------------------------------------------------------------

fn cmd_edit(config: &EditorConfig) -> Result<()> {
    if let Some(path) = &config.log_file {
        setup_file_tracing(path)?;
    }
    let shutdown = install_signal_handler()?;
    let session = config.build_session()?;
    tracing::info!(
        role = %config.role,
        panels = session.tree().panel_count(),
        script = session.sync().script_enabled(),
        "starting editor"
    );

    let mut terminal = setup_terminal()?;
    let mut app = App::new(session);
    let result = run_editor_loop(&shutdown, &mut app, &mut terminal);
    restore_terminal(&mut terminal)?;
    result?;

    if let Some(path) = &config.output {
        let json = app.session.tree().to_json_pretty()?;
        std::fs::write(path, format!("{json}\n"))
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "layout saved");
    }
    Ok(())
}

fn run_editor_loop(
    shutdown: &Arc<AtomicBool>,
    app: &mut App,
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
) -> Result<()> {
    loop {
        if shutdown.load(Ordering::Relaxed) || app.should_quit {
            break;
        }

        app.tick(Instant::now());
        terminal
            .draw(|f| app.render(f))
            .context("failed to draw frame")?;

        let poll_timeout = app
            .session
            .sync()
            .next_wake(Instant::now())
            .map_or(EVENT_POLL_TIMEOUT, |wake| wake.min(EVENT_POLL_TIMEOUT));

        if !event::poll(poll_timeout).context("failed to poll events")? {
            continue;
        }
        let action = match event::read().context("failed to read event")? {
            Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(key, app.focus),
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                Action::Click {
                    column: mouse.column,
                    row: mouse.row,
                }
            }
            _ => Action::None,
        };
        app.handle_action(action, Instant::now());
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Headless subcommands
// ---------------------------------------------------------------------------

fn cmd_render(
    path: &Path,
    role: Role,
    width: u16,
    height: u16,
    selected: Option<&str>,
) -> Result<()> {
    if width == 0 || height == 0 {
        bail!("render area must be at least 1x1");
    }
    let tree = load_layout(path)?;
    let area = Rect::new(0, 0, width, height);
    let mut buf = Buffer::empty(area);
    draw_layout(&tree, role, selected, &Theme::default(), area, &mut buf);

    let mut out = io::stdout().lock();
    for line in buffer_lines(&buf) {
        writeln!(out, "{line}").context("failed to write output")?;
    }
    Ok(())
}

/// Plain-text rows of a buffer, trailing blanks trimmed.
fn buffer_lines(buf: &Buffer) -> Vec<String> {
    let area = buf.area;
    (area.y..area.bottom())
        .map(|y| {
            let row: String = (area.x..area.right())
                .filter_map(|x| buf.cell((x, y)).map(ratatui::buffer::Cell::symbol))
                .collect();
            row.trim_end().to_owned()
        })
        .collect()
}

fn cmd_normalize(path: &Path, role: Role) -> Result<()> {
    let tree = load_layout(path)?;
    let visible = normalize_tree(&project(&tree, role));
    println!("{}", visible.to_json_pretty()?);
    Ok(())
}

fn cmd_check(path: &Path) -> Result<()> {
    let tree = load_layout(path)?;
    let ids = panel_ids(&tree);
    let hidden = ids.len() - panel_ids(&project(&tree, Role::Standard)).len();
    println!(
        "{}: ok ({} panels, depth {}, {hidden} hidden from standard viewers)",
        path.display(),
        ids.len(),
        tree.depth(),
    );
    for id in ids {
        println!("  {id}");
    }
    Ok(())
}

fn cmd_eval(path: &Path, script: &ScriptConfig) -> Result<()> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let evaluator: Box<dyn ScriptEvaluator> = match script.evaluator() {
        Some(evaluator) => Box::new(evaluator),
        None => Box::new(DisabledEvaluator),
    };
    let tree = evaluator
        .evaluate(&source)
        .and_then(layout_from_script)
        .with_context(|| format!("failed to evaluate {}", path.display()))?;
    println!("{}", tree.to_json_pretty()?);
    Ok(())
}

fn cmd_template(kind: TemplateKind) -> Result<()> {
    let text = match kind {
        TemplateKind::Layout => default_layout().to_json_pretty()?,
        TemplateKind::Dashboard => dashboard_layout().to_json_pretty()?,
        TemplateKind::Script => script_for(&default_layout())?,
    };
    println!("{}", text.trim_end());
    Ok(())
}
