// src/main.rs
//! NMEA Logger - serial GNSS position logger with on-demand capture

use anyhow::Context;
use clap::{Parser, Subcommand};
use nmea_logger::{
    capture::SessionLog,
    config::LoggerConfig,
    display::TerminalDisplay,
    gps::{data::CapturedRecord, framer::Ingest},
    monitor::{self, Session, Status, StatusSink},
};
use std::{
    io::{Read, Write},
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(name = "nmea-logger", version, about = "Log GNSS positions from an NMEA serial receiver")]
struct Cli {
    /// Config file (defaults to ~/.config/nmea-logger/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read from the serial receiver and capture points interactively
    Run {
        /// Serial device, e.g. /dev/ttyUSB0
        #[arg(short, long)]
        port: Option<String>,

        /// Baud rate
        #[arg(short, long)]
        baud: Option<u32>,

        /// Directory for session CSV files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// List available serial ports
    ListPorts,
    /// Run a recorded NMEA file through the parser and print every fix
    Replay {
        file: PathBuf,

        /// Print JSON lines instead of CSV
        #[arg(long)]
        json: bool,
    },
    /// Show or save the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the serial settings to the configuration file
    Save {
        #[arg(short, long)]
        port: Option<String>,

        #[arg(short, long)]
        baud: Option<u32>,

        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Log output would scribble over the interactive screen
    let default_filter = match cli.command {
        Command::Run { .. } => "off",
        _ => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config_path = match cli.config {
        Some(path) => path,
        None => LoggerConfig::get_config_path()?,
    };
    let mut config = LoggerConfig::load_from(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    match cli.command {
        Command::Run { port, baud, output_dir } => {
            apply_overrides(&mut config, port, baud, output_dir);
            run_session(&config).await
        }
        Command::ListPorts => Ok(monitor::list_serial_ports()?),
        Command::Replay { file, json } => replay(&file, json, config.read_buffer_size),
        Command::Config { action: ConfigAction::Show } => {
            println!("# {}", config_path.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Config { action: ConfigAction::Save { port, baud, output_dir } } => {
            apply_overrides(&mut config, port, baud, output_dir);
            config
                .save_to(&config_path)
                .with_context(|| format!("saving {}", config_path.display()))?;
            println!("Saved {}", config_path.display());
            Ok(())
        }
    }
}

fn apply_overrides(
    config: &mut LoggerConfig,
    port: Option<String>,
    baud: Option<u32>,
    output_dir: Option<PathBuf>,
) {
    config.update_serial(port, baud);
    if output_dir.is_some() {
        config.output_dir = output_dir;
    }
}

async fn run_session(config: &LoggerConfig) -> anyhow::Result<()> {
    let log = SessionLog::create(&config.output_dir()).context("creating session log")?;
    let log_name = log.file_name();

    let (status_tx, status_rx) = mpsc::unbounded_channel();
    let status: Arc<dyn StatusSink> = Arc::new(status_tx);
    status.notify(Status::SessionLog(log_name.clone()));

    let session = Session::start(config.reader_timing(), Box::new(log), Arc::clone(&status));

    if config.serial_port.is_some() {
        // A missing device is not fatal: the user can retry with 'o'
        let _ = session.connect_serial(config).await;
    }

    let mut display = TerminalDisplay::new(log_name);
    let result = display.run(&session, config, status_rx).await;

    session.shutdown().await;
    result?;

    println!("Shutting down...");
    Ok(())
}

fn replay(file: &Path, json: bool, chunk_size: usize) -> anyhow::Result<()> {
    let mut input =
        std::fs::File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let mut ingest = Ingest::new();
    let mut chunk = vec![0u8; chunk_size.max(1)];
    let mut fixes = 0usize;

    if !json {
        writeln!(out, "{}", nmea_logger::gps::data::RECORD_HEADER)?;
    }

    loop {
        let n = input.read(&mut chunk)?;
        // A final line without a newline is flushed by the synthetic one
        let bytes: &[u8] = if n == 0 { b"\n" } else { &chunk[..n] };

        for pos in ingest.feed_fixes(bytes) {
            let record = CapturedRecord::from(pos);
            if json {
                writeln!(out, "{}", serde_json::to_string(&record)?)?;
            } else {
                writeln!(out, "{}", record)?;
            }
            fixes += 1;
        }

        if n == 0 {
            break;
        }
    }

    log::info!("{} fixes replayed from {}", fixes, file.display());
    Ok(())
}
