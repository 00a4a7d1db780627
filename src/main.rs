//! # Pixelwire CLI
//!
//! Command-line interface for encoding grayscale images and streaming them to
//! an FPGA over a serial port.
//!
//! ## Usage
//!
//! ```bash
//! # List serial devices
//! pixelwire ports
//!
//! # Show the frames for an image (converted to 8-bit grayscale)
//! pixelwire encode --image cat.png
//!
//! # Raw samples need explicit dimensions
//! pixelwire encode --raw cat.gray --width 64 --height 64
//!
//! # Send to the board, 5ms between frames (Ctrl-C stops after the current frame)
//! pixelwire send --port /dev/ttyUSB0 --interval-ms 5 --image cat.png
//!
//! # Run the HTTP API
//! pixelwire serve --listen 0.0.0.0:5000
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pixelwire::{
    PixelGrid, PixelwireError,
    pipeline::{TransmissionLog, TransmissionPipeline},
    protocol,
    server::{self, ServerConfig},
    transport::{self, Parity, SerialConfig, SerialLink, config},
};

/// Pixelwire - grayscale image to FPGA UART utility
#[derive(Parser, Debug)]
#[command(name = "pixelwire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List serial ports on this host
    Ports,

    /// Encode an image and print its frames as hex
    Encode {
        #[command(flatten)]
        input: GridInput,

        /// Print at most this many frames
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Encode an image and transmit it over a serial port
    Send {
        #[command(flatten)]
        input: GridInput,

        /// Serial device (e.g. /dev/ttyUSB0, COM3)
        #[arg(long)]
        port: String,

        #[arg(long, default_value_t = config::DEFAULT_BAUD_RATE)]
        baud: u32,

        #[arg(long, default_value_t = config::DEFAULT_DATA_BITS)]
        data_bits: u8,

        #[arg(long, default_value_t = config::DEFAULT_STOP_BITS)]
        stop_bits: u8,

        /// none, odd or even
        #[arg(long, default_value = "none")]
        parity: Parity,

        /// Pause between frames in milliseconds (0 disables pacing)
        #[arg(long, default_value = "100")]
        interval_ms: u64,
    },

    /// Run the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:5000")]
        listen: String,
    },
}

/// Where the pixel grid comes from.
#[derive(Args, Debug)]
struct GridInput {
    /// Image file, converted to 8-bit grayscale at its own size
    #[arg(long, conflicts_with = "raw")]
    image: Option<PathBuf>,

    /// File of raw 8-bit samples, row-major
    #[arg(long, requires_all = ["width", "height"])]
    raw: Option<PathBuf>,

    /// Grid width for --raw
    #[arg(long)]
    width: Option<usize>,

    /// Grid height for --raw
    #[arg(long)]
    height: Option<usize>,
}

impl GridInput {
    fn load(&self) -> Result<PixelGrid, PixelwireError> {
        if let Some(path) = &self.image {
            let img = image::open(path).map_err(|e| {
                PixelwireError::Image(format!("Failed to open {}: {}", path.display(), e))
            })?;
            let gray = img.to_luma8();
            let (width, height) = gray.dimensions();
            return PixelGrid::new(width as usize, height as usize, gray.into_raw());
        }

        match (&self.raw, self.width, self.height) {
            (Some(path), Some(width), Some(height)) => {
                let samples = std::fs::read(path)?;
                PixelGrid::new(width, height, samples)
            }
            _ => Err(PixelwireError::InvalidGrid(
                "pass --image FILE or --raw FILE --width W --height H".to_string(),
            )),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), PixelwireError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ports => {
            let ports = transport::list_available_ports()?;
            if ports.is_empty() {
                println!("No serial ports found.");
            }
            for port in ports {
                println!(
                    "{:<24} {}",
                    port.device,
                    port.description.as_deref().unwrap_or("")
                );
                if let Some(hwid) = &port.hwid {
                    println!("{:<24} {}", "", hwid);
                }
            }
        }

        Commands::Encode { input, limit } => {
            let grid = input.load()?;
            let stats = grid.stats();
            let frames = protocol::encode(&grid);

            println!(
                "{}x{} pixels, min {} max {} avg {:.1}",
                stats.width, stats.height, stats.min_value, stats.max_value, stats.avg_value
            );
            println!(
                "{} frames (1 meta, {} data)",
                frames.len(),
                frames.len() - 1
            );
            for (i, frame) in frames.iter().take(limit.unwrap_or(usize::MAX)).enumerate() {
                println!("{:>6}  {:<4}  {}", i + 1, frame.kind(), frame);
            }
        }

        Commands::Send {
            input,
            port,
            baud,
            data_bits,
            stop_bits,
            parity,
            interval_ms,
        } => {
            let grid = input.load()?;
            let frames = protocol::encode(&grid);

            let config = SerialConfig {
                port,
                baud_rate: baud,
                data_bits,
                stop_bits,
                parity,
            };
            send(config, frames, Duration::from_millis(interval_ms)).await?;
        }

        Commands::Serve { listen } => {
            server::serve(ServerConfig {
                listen_addr: listen,
            })
            .await?;
        }
    }

    Ok(())
}

/// Connect, run the pipeline on its worker, report progress until done.
async fn send(
    config: SerialConfig,
    frames: Vec<protocol::Frame>,
    pacing: Duration,
) -> Result<(), PixelwireError> {
    let link = Arc::new(SerialLink::new());
    link.connect(&config)?;

    let log = Arc::new(TransmissionLog::new());
    let pipeline = Arc::new(TransmissionPipeline::new(Arc::clone(&link), Arc::clone(&log)));

    let handle = pipeline.start(frames, pacing)?;
    let total = handle.total_frames();
    let cancel = handle.cancel_token();
    let mut join = tokio::task::spawn_blocking(move || handle.join());
    let mut progress = tokio::time::interval(Duration::from_secs(1));

    let result = loop {
        tokio::select! {
            joined = &mut join => {
                break joined.map_err(|e| PixelwireError::Io(std::io::Error::other(e)))??;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, stopping after the current frame");
                cancel.cancel();
            }
            _ = progress.tick() => {
                info!(sent = log.len(), total, "progress");
            }
        }
    };

    link.disconnect();

    println!(
        "Transmission {}: {} succeeded, {} failed, {} of {} frames attempted",
        if result.cancelled { "cancelled" } else { "complete" },
        result.succeeded,
        result.failed,
        result.attempted,
        result.total_frames
    );
    Ok(())
}
