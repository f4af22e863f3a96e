use std::io::stdout;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::Terminal;

use vantage::app::{App, AppEvent};
use vantage::config::Config;
use vantage::services::auth::{self, HttpAuthGateway};
use vantage::services::realtime_client::HttpPushChannel;
use vantage::services::time_source::RealTimeSource;
use vantage::services::{log_dirs, tracing_setup};

/// Terminal client for the Vantage portal
#[derive(Parser, Debug)]
#[command(name = "vantage")]
#[command(about = "Session console with live change notifications", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Backend base URL (overrides the config file)
    #[arg(long, value_name = "URL")]
    backend_url: Option<String>,

    /// Path to log file for diagnostics (default: local data dir)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Initial route, e.g. an OAuth redirect like "/auth/callback?code=abc"
    #[arg(long, value_name = "ROUTE")]
    route: Option<String>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

/// Raw mode plus alternate screen. Drop restores the terminal, including on
/// the error path out of the main loop.
struct TerminalModes {
    active: bool,
}

impl TerminalModes {
    fn enable() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        stdout()
            .execute(EnterAlternateScreen)
            .context("Failed to enter alternate screen")?;
        Ok(Self { active: true })
    }

    fn undo(&mut self) {
        if self.active {
            emergency_cleanup();
            self.active = false;
        }
    }
}

impl Drop for TerminalModes {
    fn drop(&mut self) {
        self.undo();
    }
}

fn emergency_cleanup() {
    let _ = stdout().execute(LeaveAlternateScreen);
    let _ = disable_raw_mode();
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    // CLI flag overrides config
    if let Some(url) = &args.backend_url {
        config.backend.base_url = url.clone();
    }
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --dump-config early (no terminal setup needed)
    if args.dump_config {
        let config = load_config(&args)?;
        println!(
            "{}",
            serde_json::to_string_pretty(&config).context("Failed to serialize config")?
        );
        return Ok(());
    }

    let log_file = args
        .log_file
        .clone()
        .unwrap_or_else(log_dirs::default_log_path);
    if let Some(parent) = log_file.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if !tracing_setup::init_global(&log_file) {
        eprintln!("Warning: could not open log file {}", log_file.display());
    }
    tracing::info!("Console starting");

    let config = load_config(&args)?;

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        emergency_cleanup();
        original_hook(panic);
    }));

    let request_timeout = config.backend.request_timeout();
    let auth_gateway = Arc::new(HttpAuthGateway::new(
        config.backend.base_url.clone(),
        request_timeout,
    ));
    let push_channel = Arc::new(HttpPushChannel::new(
        config.backend.base_url.clone(),
        request_timeout,
    ));

    let mut app = App::new(
        config.clone(),
        auth_gateway,
        push_channel,
        Arc::new(RealTimeSource),
    )
    .context("Failed to create application")?;

    // Facts watcher feeds the main loop over its own channel.
    let events_tx = app.events_sender();
    let (facts_tx, facts_rx) = std::sync::mpsc::channel();
    auth::spawn_facts_watcher(
        config.backend.base_url.clone(),
        config.session.facts_poll_interval(),
        request_timeout,
        facts_tx,
    );
    std::thread::spawn(move || {
        while let Ok(update) = facts_rx.recv() {
            if events_tx.send(AppEvent::Facts(update)).is_err() {
                return;
            }
        }
    });

    app.activate(args.route.as_deref().unwrap_or("/"));

    let mut terminal_modes = TerminalModes::enable()?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
    terminal.clear().context("Failed to clear terminal")?;

    let result = app.run(&mut terminal);

    terminal_modes.undo();
    tracing::info!("Console exiting");

    result.context("Main loop returned an error")
}
