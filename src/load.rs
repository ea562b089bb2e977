use std::fs::File;
use std::io::Read;
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing::{info, warn};

use crate::artists::{ArtistDirectory, IngestWarning};
use crate::catalog::Catalog;
use crate::error::{CatalogError, CatalogResult};
use crate::features::{FEATURE_NAMES, FeatureVector};
use crate::models::{Song, SongId};

// Required song columns; each entry lists accepted spellings, preferred first.
const SONG_COLUMNS: &[&[&str]] = &[
    &["id", "song_id"],
    &["name"],
    &["danceability"],
    &["energy"],
    &["valence"],
    &["speechiness"],
    &["instrumentalness"],
    &["acousticness"],
];

const ARTIST_COLUMNS: &[&[&str]] = &[&["name", "artists", "genres"]];

/// One row of a song table such as the Spotify `data.csv`. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct SongRecord {
    id: String,
    name: String,
    #[serde(default)]
    artists: String,
    #[serde(default)]
    year: Option<i32>,
    danceability: f32,
    energy: f32,
    valence: f32,
    speechiness: f32,
    instrumentalness: f32,
    acousticness: f32,
}

impl SongRecord {
    fn into_song(self, row: usize) -> CatalogResult<Song> {
        let features = FeatureVector::new([
            self.danceability,
            self.energy,
            self.valence,
            self.speechiness,
            self.instrumentalness,
            self.acousticness,
        ]);
        if let Some(idx) = features.first_non_finite() {
            return Err(CatalogError::InvalidFeature {
                row,
                feature: FEATURE_NAMES[idx],
            });
        }
        Ok(Song {
            id: SongId::new(self.id.trim()),
            name: self.name,
            artists: parse_artist_list(&self.artists),
            year: self.year,
            features,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ArtistRecord {
    name: String,
}

/// Parse an artist list literal such as `['Frank Sinatra', "Guns N' Roses"]`.
///
/// Quoted items are taken verbatim, so commas and apostrophes inside a name
/// survive. A value without quotes is a single name.
#[must_use]
pub fn parse_artist_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);

    let mut names = Vec::new();
    let mut saw_quote = false;
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\'' && c != '"' {
            continue;
        }
        saw_quote = true;
        let mut name = String::new();
        while let Some(ch) = chars.next() {
            if ch == '\\' {
                if let Some(escaped) = chars.next() {
                    name.push(escaped);
                }
                continue;
            }
            if ch == c {
                break;
            }
            name.push(ch);
        }
        let name = name.trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }

    if !saw_quote && !inner.trim().is_empty() {
        names.push(inner.trim().to_string());
    }
    names
}

/// Clean one artist-table cell: surrounding brackets and quotes are removed.
#[must_use]
pub fn clean_table_name(raw: &str) -> String {
    let mut name = raw.trim();
    if let Some(inner) = name.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        name = inner.trim();
    }
    for quote in ['\'', '"'] {
        if let Some(inner) = name.strip_prefix(quote).and_then(|s| s.strip_suffix(quote)) {
            name = inner.trim();
        }
    }
    name.to_string()
}

fn progress(quiet: bool, what: &'static str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} [{elapsed_precise}] {pos} rows {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(what);
    pb
}

fn open(path: &Path) -> CatalogResult<File> {
    File::open(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Map each column group onto one header, taking the first spelling present.
///
/// The chosen header is renamed to the canonical spelling and every other
/// spelling of the group is renamed out of the way, so a row never carries
/// the same field twice.
fn select_columns(
    headers: &csv::StringRecord,
    columns: &[&[&str]],
) -> CatalogResult<csv::StringRecord> {
    let mut names: Vec<String> = headers.iter().map(str::to_string).collect();
    for alternatives in columns {
        let Some(chosen) = alternatives
            .iter()
            .find_map(|col| headers.iter().position(|h| h == *col))
        else {
            return Err(CatalogError::MissingColumn(alternatives[0].to_string()));
        };
        for (idx, header) in headers.iter().enumerate() {
            if idx != chosen && alternatives.contains(&header) {
                names[idx] = format!("~{header}");
            }
        }
        names[chosen] = alternatives[0].to_string();
    }
    Ok(csv::StringRecord::from(names))
}

fn read_songs<R: Read>(reader: R, pb: &ProgressBar) -> CatalogResult<Catalog> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);

    let headers = select_columns(rdr.headers()?, SONG_COLUMNS)?;
    rdr.set_headers(headers);

    let mut songs = Vec::new();
    for (idx, record) in rdr.deserialize::<SongRecord>().enumerate() {
        pb.inc(1);
        songs.push(record?.into_song(idx + 1)?);
    }
    Catalog::from_songs(songs)
}

/// Read a song catalog from CSV data with a header row.
pub fn read_catalog<R: Read>(reader: R) -> CatalogResult<Catalog> {
    read_songs(reader, &ProgressBar::hidden())
}

/// Load a song catalog from a CSV file.
pub fn load_catalog(path: impl AsRef<Path>, quiet: bool) -> CatalogResult<Catalog> {
    let path = path.as_ref();
    let pb = progress(quiet, "Loading songs");
    let catalog = read_songs(open(path)?, &pb)?;
    pb.finish_and_clear();

    let degenerate = catalog.songs().iter().filter(|s| s.features.is_zero()).count();
    if degenerate > 0 {
        warn!(
            count = degenerate,
            "songs with all-zero features cannot be used as a reference"
        );
    }
    info!(path = %path.display(), songs = catalog.len(), "loaded catalog");
    Ok(catalog)
}

/// Read an artist table from CSV data.
///
/// Names come from the `name` column, else `artists`, else `genres`.
pub fn read_artist_table<R: Read>(reader: R) -> CatalogResult<(ArtistDirectory, Vec<IngestWarning>)> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);
    let headers = select_columns(rdr.headers()?, ARTIST_COLUMNS)?;
    rdr.set_headers(headers);

    let mut names = Vec::new();
    for record in rdr.deserialize::<ArtistRecord>() {
        names.push(clean_table_name(&record?.name));
    }
    Ok(ArtistDirectory::from_names(names))
}

/// Load an artist table from a CSV file.
pub fn load_artist_table(
    path: impl AsRef<Path>,
) -> CatalogResult<(ArtistDirectory, Vec<IngestWarning>)> {
    let path = path.as_ref();
    let (dir, warnings) = read_artist_table(open(path)?)?;
    info!(
        path = %path.display(),
        artists = dir.len(),
        warnings = warnings.len(),
        "loaded artist table"
    );
    Ok((dir, warnings))
}
