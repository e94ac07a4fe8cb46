mod decode;
mod encode;

use std::io::{stderr, stdout, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use comms::{Apid, Vcid, CFDP_VCID, IDLE_PACKET_APID, NORMAL_APID, PUS_VCID};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a payload into a channel coded TM block, as downlinked by the COBC.
    ///
    /// The payload is wrapped into a single space packet. Packets on the normal
    /// APID are marked as having a secondary header, so the payload has to start
    /// with one.
    TmEncode {
        /// Virtual channel, pus or cfdp.
        #[arg(short, long, default_value = "pus", value_parser = parse_vcid)]
        vcid: Vcid,

        /// APID of the space packet, normal or idle.
        #[arg(short, long, default_value = "normal", value_parser = parse_apid)]
        apid: Apid,

        /// Prefix the block with the attached sync marker.
        #[arg(long, action)]
        cadu: bool,

        /// Output file path, stdout if not given.
        #[arg(short, long, value_name = "path")]
        output: Option<PathBuf>,

        /// Payload of the space packet.
        input: PathBuf,
    },
    /// Encode data into an authenticated, channel coded TC block.
    TcEncode {
        /// Virtual channel, pus or cfdp.
        #[arg(short, long, default_value = "pus", value_parser = parse_vcid)]
        vcid: Vcid,

        /// Wrap the data into a telecommand space packet on this APID instead of
        /// using it as the frame data field as is.
        #[arg(short, long, value_parser = parse_apid)]
        apid: Option<Apid>,

        /// Sequence number of the frame.
        #[arg(short, long, default_value_t = 0)]
        sequence_number: u8,

        /// Output file path, stdout if not given.
        #[arg(short, long, value_name = "path")]
        output: Option<PathBuf>,

        /// Frame data field or packet data.
        input: PathBuf,
    },
    /// Decode a TC block and show the frame and its contents.
    TcDecode {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: decode::Format,

        /// Channel coded TC block.
        input: PathBuf,
    },
}

fn parse_vcid(s: &str) -> Result<Vcid, String> {
    match s {
        "pus" => Ok(PUS_VCID),
        "cfdp" => Ok(CFDP_VCID),
        _ => Err(format!("unknown virtual channel {s:?}, expected pus or cfdp")),
    }
}

fn parse_apid(s: &str) -> Result<Apid, String> {
    match s {
        "normal" => Ok(NORMAL_APID),
        "idle" => Ok(IDLE_PACKET_APID),
        _ => Err(format!("unknown APID {s:?}, expected normal or idle")),
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {path:?}"))
}

fn write_output(output: Option<&Path>, data: &[u8]) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, data).with_context(|| format!("failed to write {path:?}"))?;
            info!("wrote {} bytes to {path:?}", data.len());
            Ok(())
        }
        None => stdout().write_all(data).context("writing to stdout"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_env("COMMS_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::TmEncode {
            vcid,
            apid,
            cadu,
            output,
            input,
        } => {
            let payload = read_input(input)?;
            if payload.is_empty() {
                bail!("{input:?} is empty");
            }
            let encoded = encode::tm_block(*vcid, *apid, &payload, *cadu)?;
            write_output(output.as_deref(), &encoded)
        }
        Commands::TcEncode {
            vcid,
            apid,
            sequence_number,
            output,
            input,
        } => {
            let data = read_input(input)?;
            let block = encode::tc_block(*vcid, *apid, *sequence_number, &data)?;
            write_output(output.as_deref(), &block)
        }
        Commands::TcDecode { format, input } => {
            let data = read_input(input)?;
            decode::decode(&data, format)
        }
    }
}
