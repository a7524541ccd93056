//! vehiclelink - drive the simulator from a terminal
//!
//! Runs the physics and frame clocks on a tokio interval and reads line
//! commands from stdin. Frames go out on a serial adapter, or are only
//! printed with `--loopback`.

mod commands;
mod session;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vehiclelink_core::config::SimConfig;
use vehiclelink_core::protocol::{LoopbackLink, SerialPortLink, SharedLink};

use crate::commands::{parse_command, Command, CommandError};
use crate::session::Session;

#[derive(Parser)]
#[command(name = "vehiclelink")]
#[command(about = "Drive the VehicleLink simulator and send CAN frames over UART")]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Record frames in memory instead of opening a serial port
    #[arg(long)]
    loopback: bool,

    /// Serial port to open instead of auto-discovery
    #[arg(long)]
    port: Option<String>,

    /// Write the default configuration to PATH and exit
    #[arg(long, value_name = "PATH")]
    write_default_config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn open_link(cli: &Cli, config: &mut SimConfig) -> SharedLink {
    if cli.loopback {
        info!("Using loopback link");
        return Arc::new(Mutex::new(LoopbackLink::open()));
    }

    if let Some(port) = &cli.port {
        // reconnects should come back to the same adapter
        config.link.preferred_port_contains = port.clone();
    }
    let mut link = SerialPortLink::new(config.link.clone());
    let opened = match &cli.port {
        Some(port) => link.open_port(port).map(|()| port.clone()),
        None => link.try_open_any_port(),
    };
    match opened {
        Ok(name) => info!("Serial link on {}", name),
        Err(e) => warn!("Serial link not open ({}), retrying in the background", e),
    }
    Arc::new(Mutex::new(link))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("vehiclelink={0},vehiclelink_core={0}", log_level).into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if let Some(path) = &cli.write_default_config {
        SimConfig::default()
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => SimConfig::default(),
    };
    config.validate().context("Invalid configuration")?;

    let link = open_link(&cli, &mut config);
    let mut session = Session::new(config, link);

    let (tx, mut rx) = mpsc::channel::<String>(32);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });

    let mut physics = tokio::time::interval(session.physics_period());
    let mut frame = tokio::time::interval(session.frame_period());
    frame.set_missed_tick_behavior(MissedTickBehavior::Skip);

    println!("Type 'help' for commands");
    loop {
        tokio::select! {
            _ = physics.tick() => session.physics_step(),
            _ = frame.tick() => {
                let report = session.frame();
                for line in &report.sent {
                    println!("> {}", line);
                }
            }
            line = rx.recv() => {
                let Some(line) = line else {
                    info!("Input closed");
                    break;
                };
                match parse_command(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => match session.execute(command) {
                        Ok(Some(text)) => println!("{}", text),
                        Ok(None) => {}
                        Err(e) => println!("error: {:#}", e),
                    },
                    Err(CommandError::Empty) => {}
                    Err(e) => println!("error: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!(
        "Shutting down at {:.1} km/h",
        session.sim().dynamics().forward_speed_kmh()
    );
    Ok(())
}
