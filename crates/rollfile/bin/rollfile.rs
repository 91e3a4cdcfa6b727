//! rollfile binary entry point.
//!
//! A thin wrapper around the rollfile library that:
//! 1. Parses command-line arguments
//! 2. Initializes logging (to stderr, never into the managed files)
//! 3. Either copies stdin into a rotating log, or forces a rotation
//!
//! ```text
//! my-service 2>&1 | rollfile write --prefix /var/log/my-service/app --max-size 50
//! rollfile rotate --prefix /var/log/my-service/app
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rollfile::{RotatingWriter, WriterConfig};
use std::io::{self, BufRead};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "rollfile",
    about = "Size-rotated log files with compressed archival",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Copy stdin line by line into a rotating log file
    Write(WriterArgs),
    /// Rotate the active file and archive every backup
    Rotate(WriterArgs),
}

#[derive(Debug, Args)]
struct WriterArgs {
    /// Log file prefix; the active file is `{prefix}.log`
    #[arg(long, env = "ROLLFILE_PREFIX")]
    prefix: PathBuf,

    /// Maximum active file size in MiB (0 selects the default of 100)
    #[arg(long, env = "ROLLFILE_MAX_SIZE", default_value_t = rollfile::DEFAULT_MAX_SIZE)]
    max_size: u64,

    /// Date backups and archives in local time instead of UTC
    #[arg(long, env = "ROLLFILE_LOCAL_TIME")]
    local_time: bool,
}

impl WriterArgs {
    fn open(&self) -> Result<RotatingWriter> {
        let config = WriterConfig::new(&self.prefix)
            .with_max_size(self.max_size)
            .with_local_time(self.local_time);

        RotatingWriter::new(config)
            .with_context(|| format!("Failed to set up writer for {}", self.prefix.display()))
    }
}

fn copy_stdin(writer: &RotatingWriter) -> Result<u64> {
    let mut input = io::stdin().lock();
    let mut line = Vec::new();
    let mut total = 0;

    loop {
        line.clear();
        let read = input
            .read_until(b'\n', &mut line)
            .context("Failed to read stdin")?;
        if read == 0 {
            break;
        }

        writer
            .write(&line)
            .with_context(|| format!("Failed to write to {}", writer.filename().display()))?;
        total += read as u64;
    }

    writer.close().context("Failed to close log file")?;
    Ok(total)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Write(args) => {
            let writer = args.open()?;
            let total = copy_stdin(&writer)?;
            let stats = writer.stats();
            tracing::info!(
                "Wrote {total} bytes to {} ({} rotations)",
                writer.filename().display(),
                stats.rotations
            );
        }
        Command::Rotate(args) => {
            let writer = args.open()?;
            let summary = writer.rotate().context("Rotation failed")?;
            tracing::info!(
                "Archived {} files into {}",
                summary.entries.len(),
                summary.container.display()
            );
            println!("{}", summary.container.display());
        }
    }

    Ok(())
}
