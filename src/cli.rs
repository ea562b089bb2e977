use std::path::PathBuf;

use clap::{Parser, Subcommand};

use songsim::artists::ListeningEntry;
use songsim::recommend::parse_count;

#[derive(Parser)]
#[command(name = "songsim", about = "Content-based song recommendations from audio features")]
pub struct Cli {
    /// Suppress stderr output (progress, log messages).
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output results as JSON lines (NDJSON).
    #[arg(long, global = true)]
    pub json: bool,

    /// Song catalog CSV (defaults to `<data dir>/songsim/data.csv`).
    #[arg(long, global = true, env = "SONGSIM_CATALOG")]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Find songs that sound like a reference song.
    Similar {
        /// Reference song id.
        song_id: String,

        /// Number of results.
        #[arg(short, default_value = "10", value_parser = count_arg, allow_hyphen_values = true)]
        n: usize,
    },

    /// Match a listening profile against the known artists.
    Artists {
        /// Listening entries as `ARTIST=FREQ`.
        entries: Vec<ListeningEntry>,

        /// JSON file with `[{"artist": ..., "freq": ...}]` entries.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Artist table CSV; artists are taken from the catalog when omitted.
        #[arg(long, env = "SONGSIM_ARTISTS")]
        table: Option<PathBuf>,
    },

    /// Show a summary of the catalog.
    Stats,
}

fn count_arg(raw: &str) -> Result<usize, String> {
    parse_count(raw).map_err(|e| e.to_string())
}
