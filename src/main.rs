use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use nickfilter::Plugin;
use nickfilter::command::{CommandResult, help_for};
use nickfilter::config::PluginConfig;
use nickfilter::filter::Output;
use nickfilter::format::{render_default, to_ansi};
use nickfilter::protocol::{Frame, parse_frame};
use nickfilter::store::{MemoryStore, PreferenceStore, TomlFileStore};

/// Terminal host for the mute and nick-color filters.
///
/// Reads `/commands` and `MSG:nick:text` frames from stdin and prints
/// what a chat window would show.
#[derive(Debug, Parser)]
#[command(name = "nickfilter", version, about)]
struct Cli {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Preference file (overrides the config file)
    #[arg(long)]
    prefs: Option<PathBuf>,

    /// Keep preferences in memory only
    #[arg(long, conflicts_with = "prefs")]
    memory: bool,

    /// Preference key prefix
    #[arg(long)]
    name: Option<String>,

    /// Accent color used until one is saved
    #[arg(long)]
    color: Option<String>,

    /// trace, debug, info, warn or error
    #[arg(long)]
    log_level: Option<String>,
}

fn build_config(cli: &Cli) -> Result<PluginConfig> {
    let mut builder = match &cli.config {
        Some(path) => PluginConfig::from_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => PluginConfig::builder().default_prefs_path(),
    };
    if let Some(name) = &cli.name {
        builder = builder.name(name);
    }
    if let Some(color) = &cli.color {
        builder = builder.default_color(color);
    }
    if let Some(path) = &cli.prefs {
        builder = builder.prefs_path(path);
    }
    if let Some(level) = &cli.log_level {
        builder = builder.log_level(level);
    }
    Ok(builder.build())
}

fn open_store(cli: &Cli, config: &PluginConfig) -> Result<Box<dyn PreferenceStore>> {
    match (&config.prefs_path, cli.memory) {
        (Some(path), false) => {
            let store = TomlFileStore::open(path)
                .with_context(|| format!("opening preferences {}", path.display()))?;
            tracing::info!(path = %store.path().display(), "preferences file");
            Ok(Box::new(store))
        }
        _ => {
            tracing::info!("preferences kept in memory");
            Ok(Box::new(MemoryStore::new()))
        }
    }
}

/// Everything one input line produces on screen.
fn handle_line(plugin: &Plugin, line: &str) -> Vec<String> {
    let frame = match parse_frame(line) {
        Ok(frame) => frame,
        Err(e) => return vec![format!("ERROR: {e}")],
    };

    match frame {
        Frame::Command(input) => match plugin.run_command(input) {
            Ok(CommandResult::Reply(lines)) => lines,
            Ok(CommandResult::Help(name)) => help_for(&name)
                .map(|help| help.lines().map(str::to_string).collect())
                .unwrap_or_default(),
            Err(e) => {
                tracing::error!(error = %e, "command failed");
                vec![format!("ERROR: {e}")]
            }
        },
        frame @ Frame::Event { .. } => {
            let Some(event) = frame.into_event(Utc::now()) else {
                return Vec::new();
            };
            plugin
                .dispatch(&event)
                .into_iter()
                .map(|out| match out {
                    Output::Raw(line) => to_ansi(&line),
                    Output::Rendered(event) => to_ansi(&render_default(event.kind, &event.fields)),
                })
                .collect()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    let level: Level = config
        .log_level
        .parse()
        .with_context(|| format!("invalid log level {:?}", config.log_level))?;
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let store = open_store(&cli, &config)?;
    let plugin = Plugin::load(&config, store);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        for shown in handle_line(&plugin, &line) {
            stdout.write_all(shown.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        stdout.flush().await?;
    }

    Ok(())
}
