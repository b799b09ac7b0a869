//! PDK CLI: the command-line entry point for Param Deck.
//!
//! # Usage
//!
//! ```text
//! pdk get IsMetric
//! pdk put-bool IsMetric true
//! pdk watch IsMetric IsRHD
//! pdk status --telemetry /run/telemetry.json
//! pdk send refresh
//! pdk tui
//! ```

use std::error::Error;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use param_deck_core::binding::LiveMirror;
use param_deck_core::config::{resolve_config_dir, AppConfig};
use param_deck_core::panel::catalog::PANELS;
use param_deck_core::panel::PanelBuilder;
use param_deck_core::status::{
    JsonFileTelemetry, Severity, Sidebar, StaticTelemetry, TelemetrySnapshot, TelemetrySource,
};
use param_deck_core::store::{ParamHandle, ParamStore, Params};
use param_deck_core::supervisor::{Command as DeviceCommand, DriveState, Supervisor};
use param_deck_core::watch::ChangeWatcher;
use pdk_tui::{Session, Theme, Tui};


const LOG_ENV: &str = "PDK_LOG";
const LOG_FILE: &str = "pdk.log";

type CliResult<T = ()> = Result<T, Box<dyn Error>>;


#[derive(Parser)]
#[command(name = "pdk")]
#[command(about = "Inspect and edit device parameters", long_about = None)]
struct Cli {
    /// Parameter directory (overrides the config file)
    #[arg(long, global = true)]
    params: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a parameter's value
    Get { key: String },
    /// Set a parameter to a string value
    Put { key: String, value: String },
    /// Set a parameter to a boolean
    PutBool {
        key: String,
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },
    /// Delete a parameter
    Remove { key: String },
    /// Print whether a parameter is present
    Exists { key: String },
    /// Print every parameter
    List,
    /// Print a line each time one of the keys changes
    Watch {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Print the status sidebar for a telemetry snapshot
    Status {
        /// JSON telemetry snapshot (overrides the config file)
        #[arg(long)]
        telemetry: Option<PathBuf>,
    },
    /// Issue a device command: reboot, power-off, uninstall, refresh, reset-calibration
    Send {
        #[arg(value_parser = parse_device_command)]
        command: DeviceCommand,
        /// Skip the disengaged check
        #[arg(long)]
        force: bool,
    },
    /// Print each built-in panel and its visible controls
    Panels,
    /// Open the terminal settings UI
    Tui,
}


fn main() {
    let cli = Cli::parse();

    let config_dir = resolve_config_dir();
    let mut config = match AppConfig::load(&config_dir) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("pdk: {}", e);
            process::exit(1);
        }
    };
    if let Some(dir) = &cli.params {
        config.params_dir = dir.clone();
    }

    init_logging(&config, &config_dir, matches!(cli.command, Commands::Tui));

    if let Err(e) = run(cli.command, &config) {
        eprintln!("pdk: {}", e);
        process::exit(1);
    }
}


/// Logs go to stderr, or to a file in the config dir while the TUI owns
/// the terminal.
fn init_logging(config: &AppConfig, config_dir: &Path, to_file: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if to_file {
        let file = std::fs::create_dir_all(config_dir).and_then(|_| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(config_dir.join(LOG_FILE))
        });
        match file {
            Ok(f) => builder.with_ansi(false).with_writer(Mutex::new(f)).init(),
            Err(_) => builder.with_writer(io::sink).init(),
        }
    } else {
        builder.with_writer(io::stderr).init();
    }
}


fn run(command: Commands, config: &AppConfig) -> CliResult {
    let store = ParamStore::open(&config.params_dir)?;
    debug!("parameter directory {}", store.dir().display());
    let mut out = io::stdout().lock();

    match command {
        Commands::Get { key } => cmd_get(&store, &key, &mut out),
        Commands::Put { key, value } => Ok(store.put(&key, value.as_bytes())?),
        Commands::PutBool { key, value } => Ok(store.put_bool(&key, value)?),
        Commands::Remove { key } => Ok(store.remove(&key)?),
        Commands::Exists { key } => Ok(writeln!(out, "{}", store.exists(&key))?),
        Commands::List => cmd_list(&store, &mut out),
        Commands::Watch { keys } => cmd_watch(&store, config, &keys, &mut out),
        Commands::Status { telemetry } => {
            let path = telemetry.or_else(|| config.telemetry_path.clone());
            let snapshot = poll_telemetry(path.as_deref()).unwrap_or_default();
            print_status(&snapshot, epoch_ns(), &mut out)
        }
        Commands::Send { command, force } => {
            let drive = if force {
                DriveState::Disengaged
            } else {
                DriveState::from_snapshot(poll_telemetry(config.telemetry_path.as_deref()).as_ref())
            };
            let handle: ParamHandle = Arc::new(store);
            cmd_send(handle, command, drive, &mut out)
        }
        Commands::Panels => {
            let handle: ParamHandle = Arc::new(store);
            print_panels(handle, &mut out)
        }
        Commands::Tui => {
            drop(out);
            run_tui(store, config)
        }
    }
}


// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_get(store: &dyn Params, key: &str, out: &mut impl Write) -> CliResult {
    match store.get(key) {
        Some(value) => {
            writeln!(out, "{}", String::from_utf8_lossy(&value))?;
            Ok(())
        }
        None => Err(format!("{} is not set", key).into()),
    }
}


fn cmd_list(store: &ParamStore, out: &mut impl Write) -> CliResult {
    for key in store.keys() {
        if let Some(value) = store.get(&key) {
            writeln!(out, "{} = {}", key, format_value(&value))?;
        }
    }
    Ok(())
}


/// Text values are shown trimmed; binary ones by size.
fn format_value(value: &[u8]) -> String {
    match std::str::from_utf8(value) {
        Ok(text) if !text.contains('\0') => text.trim().to_string(),
        _ => format!("<{} bytes>", value.len()),
    }
}


fn cmd_watch(
    store: &ParamStore,
    config: &AppConfig,
    keys: &[String],
    out: &mut impl Write,
) -> CliResult {
    let watcher = ChangeWatcher::start(store, config.watch_config())?;
    watcher.watch(keys)?;
    info!("watching {} keys in {}", keys.len(), store.dir().display());
    loop {
        report_change(&watcher, store, Duration::from_secs(1), out)?;
    }
}


/// Wait up to `timeout` for one change and print it. Returns whether one
/// arrived.
fn report_change(
    watcher: &ChangeWatcher,
    store: &dyn Params,
    timeout: Duration,
    out: &mut impl Write,
) -> CliResult<bool> {
    let Some(key) = watcher.recv_timeout(timeout) else {
        return Ok(false);
    };
    match store.get(&key) {
        Some(value) => writeln!(out, "{} = {}", key, format_value(&value))?,
        None => writeln!(out, "{} removed", key)?,
    }
    out.flush()?;
    Ok(true)
}


fn poll_telemetry(path: Option<&Path>) -> Option<TelemetrySnapshot> {
    match path {
        Some(p) => JsonFileTelemetry::new(p).poll(),
        None => StaticTelemetry(None).poll(),
    }
}


fn print_status(snapshot: &TelemetrySnapshot, now_ns: u64, out: &mut impl Write) -> CliResult {
    let sidebar = Sidebar::from_snapshot(snapshot, now_ns);
    writeln!(
        out,
        "network      {} {}/5 {} {}",
        sidebar.net_type, sidebar.net_bars, sidebar.connect_name, sidebar.link_detail
    )?;
    if let Some(battery) = &sidebar.battery {
        writeln!(out, "battery      {}", battery)?;
    }
    for (name, item) in [
        ("temperature", &sidebar.thermal),
        ("connectivity", &sidebar.connectivity),
        ("vehicle", &sidebar.vehicle),
    ] {
        writeln!(out, "{:<12} {} ({})", name, item.label, severity_word(item.severity))?;
    }
    Ok(())
}


fn severity_word(severity: Severity) -> &'static str {
    match severity {
        Severity::Good => "good",
        Severity::Warning => "warning",
        Severity::Danger => "danger",
    }
}


/// Run a device command. A pulse is held for its window and then reset
/// before returning.
fn cmd_send(
    store: ParamHandle,
    command: DeviceCommand,
    drive: DriveState,
    out: &mut impl Write,
) -> CliResult {
    let mut supervisor = Supervisor::new(store);
    supervisor.execute(command, drive, Instant::now())?;
    writeln!(out, "{} requested", command)?;
    while let Some(due) = supervisor.next_due() {
        std::thread::sleep(due.saturating_duration_since(Instant::now()));
        for key in supervisor.fire_due(Instant::now()) {
            debug!("reset {}", key);
        }
    }
    Ok(())
}


fn parse_device_command(s: &str) -> Result<DeviceCommand, String> {
    serde_json::from_value(serde_json::Value::String(s.to_string())).map_err(|_| {
        format!(
            "unknown command '{}' (expected reboot, power-off, uninstall, refresh, reset-calibration)",
            s
        )
    })
}


fn print_panels(store: ParamHandle, out: &mut impl Write) -> CliResult {
    let builder = PanelBuilder::new(store, LiveMirror::new());
    for def in PANELS {
        let panel = builder.build(def);
        writeln!(out, "[{}]", panel.name())?;
        for b in panel.bindings() {
            writeln!(out, "  {:<40} {:<12} {}", b.title(), b.display(), b.key())?;
        }
    }
    Ok(())
}


fn run_tui(store: ParamStore, config: &AppConfig) -> CliResult {
    let watcher = match ChangeWatcher::start(&store, config.watch_config()) {
        Ok(w) => Some(w),
        Err(e) => {
            tracing::warn!("live refresh disabled: {}", e);
            None
        }
    };
    let telemetry: Box<dyn TelemetrySource> = match &config.telemetry_path {
        Some(path) => Box::new(JsonFileTelemetry::new(path)),
        None => Box::new(StaticTelemetry(None)),
    };
    let handle: ParamHandle = Arc::new(store);
    let builder = PanelBuilder::new(handle.clone(), LiveMirror::new());
    let session = Session::new(builder, handle, &PANELS, watcher, telemetry);

    let mut tui = Tui::new(session, Theme::by_name(&config.theme), config.tick())?;
    tui.run()?;
    Ok(())
}


fn epoch_ns() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}
