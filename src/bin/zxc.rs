//! Thin CLI front-end exercising the public API: `compress`, `decompress`,
//! `bound`, and `info`. No path validation or progress UI beyond what
//! `anyhow` and `clap` give for free.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "zxc", about = "Lossless asymmetric block compressor")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compress a file.
    Compress {
        input: PathBuf,
        output: PathBuf,
        /// Compression level, 1 (fastest) through 5 (smallest).
        #[arg(short = 'l', long, default_value_t = 3)]
        level: u8,
        /// Worker thread count (0 = auto-detect).
        #[arg(short = 'w', long, default_value_t = 0)]
        workers: usize,
        /// Disable the per-block/footer checksum.
        #[arg(long)]
        no_checksum: bool,
    },
    /// Decompress a file.
    Decompress {
        input: PathBuf,
        output: PathBuf,
        #[arg(short = 'w', long, default_value_t = 0)]
        workers: usize,
    },
    /// Print the worst-case compressed size for an input of `size` bytes.
    Bound { size: u64 },
    /// Print the decompressed size recorded in an archive's footer.
    Info { input: PathBuf },
}

fn workers_or_auto(workers: usize) -> usize {
    if workers == 0 {
        num_cpus::get().max(1)
    } else {
        workers
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Compress { input, output, level, workers, no_checksum } => {
            if !(1..=5).contains(&level) {
                bail!("level must be between 1 and 5, got {level}");
            }
            let reader = BufReader::new(File::open(&input).with_context(|| format!("opening {}", input.display()))?);
            let writer =
                BufWriter::new(File::create(&output).with_context(|| format!("creating {}", output.display()))?);
            let opts = zxc::StreamOptions {
                workers: workers_or_auto(workers),
                level,
                checksum: !no_checksum,
                ..Default::default()
            };
            let written = zxc::stream_compress(reader, writer, opts).context("compression failed")?;
            println!("{written} bytes written to {}", output.display());
            Ok(())
        }
        Command::Decompress { input, output, workers } => {
            let reader = BufReader::new(File::open(&input).with_context(|| format!("opening {}", input.display()))?);
            let writer =
                BufWriter::new(File::create(&output).with_context(|| format!("creating {}", output.display()))?);
            let opts = zxc::StreamOptions { workers: workers_or_auto(workers), ..Default::default() };
            let written = zxc::stream_decompress(reader, writer, opts).context("decompression failed")?;
            println!("{written} bytes written to {}", output.display());
            Ok(())
        }
        Command::Bound { size } => {
            println!("{}", zxc::compress_bound(size));
            Ok(())
        }
        Command::Info { input } => {
            let bytes = std::fs::read(&input).with_context(|| format!("reading {}", input.display()))?;
            match zxc::decompressed_size(&bytes) {
                Some(size) => {
                    println!("{size}");
                    Ok(())
                }
                None => bail!("{}: not a valid zxc archive", input.display()),
            }
        }
    }
}

fn main() -> Result<()> {
    run(Cli::parse())
}
