mod host;
mod script;

use anyhow::{Context, Result, bail};
use bus::{Bus, HostCommand, HostEvent};
use clap::{Parser, ValueEnum};
use host::{Format, Host};
use runtime::{RuntimeConfig, ValidationMode};
use script::Script;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "franken")]
#[command(about = "Headless checkers on the franken render loop")]
struct Cli {
    /// Square to click, as ROW-COL (repeatable, applied in order)
    #[arg(long = "click", value_name = "ROW-COL")]
    clicks: Vec<String>,
    /// TOML file of `[[click]]` entries, applied before any --click
    #[arg(long)]
    script: Option<PathBuf>,
    /// How to print the document
    #[arg(long, value_enum, default_value_t = Format::Html)]
    format: Format,
    /// View validation applied on every render
    #[arg(long, value_enum, default_value_t = Validation::Warn)]
    validation: Validation,
    /// Print the document after every click, not just at the end
    #[arg(long)]
    each: bool,
    /// Read commands from stdin (`5-2`, `fire ID TYPE`, `print`, `quit`)
    #[arg(long)]
    interactive: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Validation {
    Strict,
    Warn,
    Off,
}

impl From<Validation> for ValidationMode {
    fn from(value: Validation) -> Self {
        match value {
            Validation::Strict => ValidationMode::Strict,
            Validation::Warn => ValidationMode::Warn,
            Validation::Off => ValidationMode::Off,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let mut commands = Vec::new();
    if let Some(path) = &cli.script {
        let script = Script::load(path)?;
        if script.is_empty() {
            log::warn!("script {} has no clicks", path.display());
        }
        log::info!("loaded {} clicks from {}", script.len(), path.display());
        commands.extend(script.commands());
    }
    commands.extend(cli.clicks.iter().map(HostCommand::click));
    if cli.each {
        commands = commands
            .into_iter()
            .flat_map(|command| [command, HostCommand::Snapshot])
            .collect();
    }

    let Bus {
        cmd_tx,
        cmd_rx,
        evt_tx,
        evt_rx,
    } = Bus::new();

    let config = RuntimeConfig {
        validation: cli.validation.into(),
    };
    let host = Host::new(config, cli.format).context("failed to mount checkers")?;

    let printer = thread::spawn(move || print_events(evt_rx));
    let producer = spawn_producer(cmd_tx, commands, cli.interactive, cli.each);

    host.run(&cmd_rx, &evt_tx);
    drop(evt_tx);
    if let Some(winner) = host.game().winner {
        log::info!("player {} won", winner.name());
    }

    if producer.join().is_err() {
        bail!("command reader panicked");
    }
    let rejected = printer
        .join()
        .map_err(|_| anyhow::anyhow!("output thread panicked"))?;
    if rejected > 0 {
        bail!("{rejected} commands targeted unknown elements");
    }
    Ok(())
}

/// Feed scripted commands, then stdin when interactive, then a final snapshot
/// and shutdown.
fn spawn_producer(
    tx: Sender<HostCommand>,
    commands: Vec<HostCommand>,
    interactive: bool,
    each: bool,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for command in commands {
            if tx.send(command).is_err() {
                return;
            }
        }
        if interactive {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        log::error!("stdin: {err}");
                        break;
                    }
                };
                match script::parse_line(&line) {
                    Ok(Some(command)) => {
                        let stop = command == HostCommand::Shutdown;
                        if tx.send(command).is_err() || stop {
                            return;
                        }
                    }
                    Ok(None) => {}
                    Err(err) => eprintln!("{err}"),
                }
            }
        }
        if !each && !interactive {
            let _ = tx.send(HostCommand::Snapshot);
        }
        let _ = tx.send(HostCommand::Shutdown);
    })
}

/// Print host output; returns the number of rejected commands.
fn print_events(rx: Receiver<HostEvent>) -> usize {
    let mut rejected = 0;
    for event in rx {
        match event {
            HostEvent::Delivered {
                target,
                event_type,
                listeners,
                mutations,
                render,
            } => {
                log::info!("{event_type} on #{target}: {listeners} listeners, render {render}");
                log::debug!("{mutations} dom mutations");
            }
            HostEvent::Rejected { target, reason } => {
                rejected += 1;
                log::error!("#{target}: {reason}");
            }
            HostEvent::Snapshot { render, html } => {
                log::debug!("snapshot after render {render}");
                println!("{html}");
            }
            HostEvent::Stopped { render } => {
                log::info!("host stopped after {render} renders");
            }
        }
    }
    rejected
}
