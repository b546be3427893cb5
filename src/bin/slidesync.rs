//! slidesync command-line interface
//!
//! Logging goes through env_logger; `RUST_LOG=debug` shows every tool
//! invocation.

use clap::Parser;
use log::error;
use slidesync::{convert, ConvertOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Build a timecode-synchronized slideshow video from a .tar.gz archive
#[derive(Debug, Parser)]
#[command(name = "slidesync", version, about)]
struct Cli {
    /// Archive holding img/, audio.mp3 or audio.wav, and timecodes.txt
    archive: PathBuf,

    /// Output video (defaults to <archive base>.mp4 in the current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of clips to encode concurrently
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    jobs: u16,

    /// Path to the ffmpeg executable
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Path to the lame executable
    #[arg(long)]
    lame: Option<PathBuf>,

    /// Kill any external tool running longer than this many seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// MP3 bitrate in kbps when the narration has to be re-encoded
    #[arg(long, default_value_t = slidesync::plan::DEFAULT_AUDIO_BITRATE_KBPS)]
    bitrate: u32,

    /// Validate the archive and print the assembly plan without encoding
    ///
    /// An archive shipping only audio.mp3 still runs lame to measure its length.
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let options = ConvertOptions {
        output_path: cli.output,
        ffmpeg_path: cli.ffmpeg,
        lame_path: cli.lame,
        jobs: cli.jobs as usize,
        tool_timeout: cli.timeout.map(Duration::from_secs),
        audio_bitrate_kbps: cli.bitrate,
        dry_run: cli.dry_run,
    };

    match convert(&cli.archive, &options) {
        Ok(report) => {
            if report.dry_run {
                println!("{}", report.plan);
            } else {
                println!("{}", report.output.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
