#![deny(clippy::all, clippy::pedantic)]
#![deny(warnings)]
#![allow(clippy::module_name_repetitions)]

mod cli;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Command};
use songsim::artists::{ArtistDirectory, ListeningEntry};
use songsim::models::Recommendation;
use songsim::recommend::{SimilarityRanker, catalog_profile};
use songsim::{Catalog, load};

fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let result = run(cli);

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

fn default_catalog_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("songsim")
        .join("data.csv")
}

fn open_catalog(path: Option<&Path>, quiet: bool) -> Result<Catalog> {
    let path = path.map_or_else(default_catalog_path, Path::to_path_buf);
    load::load_catalog(&path, quiet)
        .with_context(|| format!("failed to load catalog {}", path.display()))
}

fn run(cli: Cli) -> Result<i32> {
    let catalog = open_catalog(cli.catalog.as_deref(), cli.quiet)?;
    match cli.command {
        Command::Similar { song_id, n } => cmd_similar(&catalog, &song_id, n, cli.json),
        Command::Artists {
            entries,
            file,
            table,
        } => cmd_artists(&catalog, entries, file.as_deref(), table.as_deref(), cli.json),
        Command::Stats => cmd_stats(&catalog, cli.json),
    }
}

fn cmd_similar(catalog: &Catalog, song_id: &str, n: usize, json: bool) -> Result<i32> {
    let ranker = SimilarityRanker::new(catalog);
    let results = ranker.rank_detailed(song_id, n)?;
    if results.is_empty() {
        return Ok(2);
    }
    output_results(&results, json);
    Ok(0)
}

fn cmd_artists(
    catalog: &Catalog,
    mut entries: Vec<ListeningEntry>,
    file: Option<&Path>,
    table: Option<&Path>,
    json: bool,
) -> Result<i32> {
    if let Some(file) = file {
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        let from_file: Vec<ListeningEntry> = serde_json::from_str(&text)
            .with_context(|| format!("invalid listening profile {}", file.display()))?;
        entries.extend(from_file);
    }
    if entries.is_empty() {
        eprintln!("Give ARTIST=FREQ entries or --file");
        return Ok(1);
    }

    let directory = match table {
        Some(path) => {
            load::load_artist_table(path)
                .with_context(|| format!("failed to load artist table {}", path.display()))?
                .0
        }
        None => ArtistDirectory::from_catalog(catalog),
    };

    let profile = directory.resolve(&entries);

    if json {
        println!("{}", serde_json::to_string(&profile)?);
    } else {
        for m in &profile.matched {
            let songs = directory.get(m.id).map_or(0, |a| a.song_count);
            println!("{}\t{}\t{}\t{}", m.id, m.name, m.freq, songs);
        }
        for name in &profile.unmatched {
            eprintln!("Unmatched artist: {name}");
        }
    }

    if profile.matched.is_empty() {
        return Ok(2);
    }
    Ok(0)
}

fn cmd_stats(catalog: &Catalog, json: bool) -> Result<i32> {
    let profile = catalog_profile(catalog);

    if json {
        println!("{}", serde_json::to_string(&profile)?);
    } else {
        eprintln!(
            "Catalog: {} songs ({} without features)\n",
            profile.total_songs, profile.degenerate_songs
        );

        eprintln!("Top Artists:");
        for (artist, count) in &profile.top_artists {
            eprintln!("  {artist}: {count}");
        }

        eprintln!("\nDecades:");
        for (decade, count) in &profile.decades {
            eprintln!("  {decade}: {count}");
        }

        eprintln!("\nFeature Means:");
        for (feature, mean) in &profile.feature_means {
            eprintln!("  {feature}: {mean:.4}");
        }
    }

    Ok(0)
}

fn output_results(results: &[Recommendation], json: bool) {
    for r in results {
        if json {
            if let Ok(j) = serde_json::to_string(r) {
                println!("{j}");
            }
        } else {
            println!("{}", r.to_tsv());
        }
    }
}
