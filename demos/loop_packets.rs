//! Print loop packets from a station or a recorded capture.
//!
//! ```text
//! cargo run --example loop_packets -- [--config station.yaml] [--replay capture.nmea] [--stanza]
//! ```
//!
//! Set `RUST_LOG=nm150=debug` to see every frame as it is read.

use anyhow::{Context, bail};
use futures::StreamExt;
use nm150::{HARDWARE_NAME, Station, StationConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Default)]
struct Args {
    config: Option<PathBuf>,
    replay: Option<PathBuf>,
    stanza: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = Some(iter.next().context("--config needs a file")?.into()),
            "--replay" => args.replay = Some(iter.next().context("--replay needs a capture file")?.into()),
            "--stanza" => args.stanza = true,
            other => bail!("unknown argument: {}", other),
        }
    }

    Ok(args)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = parse_args()?;
    if args.stanza {
        print!("{}", StationConfig::default_stanza());
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => StationConfig::from_file(path)?,
        None => StationConfig::default(),
    };

    let connection = match &args.replay {
        Some(capture) => Station::replay(capture, config).await?,
        None => Station::connect(config).await?,
    };
    info!(hardware = HARDWARE_NAME, source = connection.source(), units = ?connection.units(), "Streaming loop packets");

    let mut packets = connection.subscribe();
    while let Some(packet) = packets.next().await {
        println!("{:?}", packet);
    }

    let summary = connection.close().await?;
    info!(packets = summary.packets, rejected = summary.rejected, "Station stream ended");
    Ok(())
}
