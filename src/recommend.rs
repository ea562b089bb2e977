use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::{RankError, RankResult};
use crate::features::{FEATURE_DIM, FEATURE_NAMES, FeatureVector, cosine_distance, normalize};
use crate::models::Recommendation;

/// Default number of recommendations.
pub const DEFAULT_COUNT: usize = 10;

const TOP_ARTISTS: usize = 15;

/// Ranks catalog songs by acoustic similarity to a reference song.
///
/// Normalized feature vectors are computed once in [`SimilarityRanker::new`]
/// and never change afterwards, so a ranker can be shared between threads.
pub struct SimilarityRanker<'a> {
    catalog: &'a Catalog,
    normalized: Vec<FeatureVector>,
}

impl<'a> SimilarityRanker<'a> {
    #[must_use]
    pub fn new(catalog: &'a Catalog) -> Self {
        let normalized = catalog.songs().iter().map(|s| normalize(&s.features)).collect();
        Self { catalog, normalized }
    }

    /// Names of the `n` songs closest to `song_id`, most similar first.
    pub fn rank(&self, song_id: &str, n: usize) -> RankResult<Vec<String>> {
        Ok(self
            .rank_detailed(song_id, n)?
            .into_iter()
            .map(|r| r.name)
            .collect())
    }

    /// Like [`rank`](Self::rank), keeping distance and song details.
    ///
    /// Candidates are ordered by ascending cosine distance, ties by ascending
    /// song id. Asking for more than the catalog holds returns every other song.
    ///
    /// Zero feature vectors are handled asymmetrically: a zero reference fails
    /// with [`RankError::DegenerateVector`], while a zero candidate is scored at
    /// [`MAX_COSINE_DISTANCE`](crate::features::MAX_COSINE_DISTANCE) and so sorts after every non-zero candidate.
    pub fn rank_detailed(&self, song_id: &str, n: usize) -> RankResult<Vec<Recommendation>> {
        let Some(query_pos) = self.catalog.position(song_id) else {
            return Err(RankError::NotFound(song_id.to_string()));
        };
        let query = &self.normalized[query_pos];
        if query.is_zero() {
            return Err(RankError::DegenerateVector(song_id.to_string()));
        }
        if n == 0 {
            return Ok(Vec::new());
        }

        let songs = self.catalog.songs();
        let mut scored: Vec<(f32, usize)> = self
            .normalized
            .iter()
            .enumerate()
            .filter(|&(pos, _)| pos != query_pos)
            .map(|(pos, cand)| (cosine_distance(query, cand), pos))
            .collect();

        let by_distance_then_id = |a: &(f32, usize), b: &(f32, usize)| -> Ordering {
            a.0.total_cmp(&b.0)
                .then_with(|| songs[a.1].id.cmp(&songs[b.1].id))
        };

        if n < scored.len() {
            scored.select_nth_unstable_by(n - 1, by_distance_then_id);
            scored.truncate(n);
        }
        scored.sort_by(by_distance_then_id);

        debug!(
            song_id,
            candidates = self.catalog.len() - 1,
            returned = scored.len(),
            "ranked similar songs"
        );

        Ok(scored
            .into_iter()
            .map(|(distance, pos)| {
                let song = &songs[pos];
                Recommendation {
                    distance,
                    song_id: song.id.clone(),
                    name: song.name.clone(),
                    artists: song.artists.clone(),
                    year: song.year,
                }
            })
            .collect())
    }
}

/// Parse a user-supplied result count.
pub fn parse_count(raw: &str) -> RankResult<usize> {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(v) if v < 0 => Err(RankError::InvalidArgument(format!(
            "result count must be non-negative, got {v}"
        ))),
        Ok(v) => usize::try_from(v)
            .map_err(|_| RankError::InvalidArgument(format!("result count {v} is too large"))),
        Err(_) => Err(RankError::InvalidArgument(format!(
            "result count must be an integer, got `{trimmed}`"
        ))),
    }
}

/// Summary statistics over a catalog.
#[derive(Debug, Serialize)]
pub struct CatalogProfile {
    pub total_songs: usize,
    pub degenerate_songs: usize,
    pub top_artists: Vec<(String, usize)>,
    pub decades: Vec<(String, usize)>,
    pub feature_means: Vec<(&'static str, f32)>,
}

/// Generate a profile summary of the catalog.
#[must_use]
pub fn catalog_profile(catalog: &Catalog) -> CatalogProfile {
    let mut artist_counts: HashMap<&str, usize> = HashMap::new();
    let mut decade_counts: HashMap<i32, usize> = HashMap::new();
    let mut sums = [0.0f64; FEATURE_DIM];
    let mut degenerate_songs = 0;

    for song in catalog.songs() {
        for artist in &song.artists {
            if !artist.is_empty() {
                *artist_counts.entry(artist.as_str()).or_default() += 1;
            }
        }
        if let Some(year) = song.year.filter(|&y| y > 0) {
            *decade_counts.entry((year / 10) * 10).or_default() += 1;
        }
        if song.features.is_zero() {
            degenerate_songs += 1;
        }
        for (sum, &v) in sums.iter_mut().zip(song.features.as_array()) {
            *sum += f64::from(v);
        }
    }

    let mut top_artists: Vec<(String, usize)> = artist_counts
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    top_artists.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_artists.truncate(TOP_ARTISTS);

    let mut decades: Vec<_> = decade_counts.into_iter().collect();
    decades.sort_by_key(|&(decade, _)| decade);
    let decades = decades
        .into_iter()
        .map(|(decade, count)| (format!("{decade}s"), count))
        .collect();

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let feature_means = FEATURE_NAMES
        .iter()
        .zip(sums)
        .map(|(&name, sum)| {
            let mean = if catalog.is_empty() {
                0.0
            } else {
                (sum / catalog.len() as f64) as f32
            };
            (name, mean)
        })
        .collect();

    CatalogProfile {
        total_songs: catalog.len(),
        degenerate_songs,
        top_artists,
        decades,
        feature_means,
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::models::Song;

    fn song(id: &str, features: [f32; 6]) -> Song {
        Song::new(id, format!("name-{id}"), FeatureVector::new(features))
    }

    fn catalog(songs: Vec<Song>) -> Catalog {
        Catalog::from_songs(songs).unwrap()
    }

    fn random_catalog(seed: u64, size: usize) -> Catalog {
        let mut rng = StdRng::seed_from_u64(seed);
        let songs = (0..size)
            .map(|i| {
                let mut f = [0.0f32; 6];
                for v in &mut f {
                    *v = rng.gen_range(0.0..1.0);
                }
                song(&format!("s{i:03}"), f)
            })
            .collect();
        catalog(songs)
    }

    #[test]
    fn test_near_identical_ranks_before_orthogonal() {
        let cat = catalog(vec![
            song("A", [1.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            song("B", [0.0, 1.0, 0.0, 0.0, 0.0, 0.0]),
            song("C", [1.0, 0.0, 0.0, 0.0, 0.0, 0.0001]),
        ]);
        let ranker = SimilarityRanker::new(&cat);
        let names = ranker.rank("A", 2).unwrap();
        assert_eq!(names, vec!["name-C", "name-B"]);

        let detailed = ranker.rank_detailed("A", 2).unwrap();
        assert!(detailed[0].distance < 1e-6);
        assert!((detailed[1].distance - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_huge_features_rank_normally() {
        let cat = catalog(vec![
            song("A", [1e20, 0.0, 0.0, 0.0, 0.0, 0.0]),
            song("B", [0.0, 1e20, 0.0, 0.0, 0.0, 0.0]),
            song("C", [1e20, 0.0, 0.0, 0.0, 0.0, 1e16]),
        ]);
        let ranker = SimilarityRanker::new(&cat);
        assert_eq!(ranker.rank("A", 2).unwrap(), vec!["name-C", "name-B"]);
    }

    #[test]
    fn test_tiny_features_rank_normally() {
        let cat = catalog(vec![
            song("A", [1e-25, 0.0, 0.0, 0.0, 0.0, 0.0]),
            song("B", [0.0, 1e-25, 0.0, 0.0, 0.0, 0.0]),
            song("C", [1e-25, 0.0, 0.0, 0.0, 0.0, 0.0]),
        ]);
        let ranker = SimilarityRanker::new(&cat);
        let detailed = ranker.rank_detailed("A", 2).unwrap();
        assert_eq!(detailed[0].song_id.as_str(), "C");
        assert!(detailed[0].distance < 1e-6);
        assert_eq!(detailed[1].song_id.as_str(), "B");
        assert!((detailed[1].distance - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_tie_broken_by_lower_id() {
        // "b-song" is inserted first but "a-song" has the lower id
        let cat = catalog(vec![
            song("ref", [1.0, 1.0, 0.0, 0.0, 0.0, 0.0]),
            song("b-song", [1.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            song("a-song", [0.0, 1.0, 0.0, 0.0, 0.0, 0.0]),
        ]);
        let ranker = SimilarityRanker::new(&cat);
        let names = ranker.rank("ref", 2).unwrap();
        assert_eq!(names, vec!["name-a-song", "name-b-song"]);
        let names = ranker.rank("ref", 1).unwrap();
        assert_eq!(names, vec!["name-a-song"]);
    }

    #[test]
    fn test_self_excluded() {
        let cat = random_catalog(7, 40);
        let ranker = SimilarityRanker::new(&cat);
        for song in cat.songs() {
            let results = ranker.rank_detailed(song.id.as_str(), 10).unwrap();
            assert!(results.iter().all(|r| r.song_id != song.id));
        }
    }

    #[test]
    fn test_duplicate_name_not_deduplicated() {
        let cat = catalog(vec![
            Song::new("1", "Summertime", FeatureVector::new([0.5, 0.5, 0.1, 0.0, 0.0, 0.9])),
            Song::new("2", "Summertime", FeatureVector::new([0.5, 0.4, 0.1, 0.0, 0.0, 0.9])),
        ]);
        let names = SimilarityRanker::new(&cat).rank("1", 5).unwrap();
        assert_eq!(names, vec!["Summertime"]);
    }

    #[test]
    fn test_deterministic() {
        let cat = random_catalog(42, 100);
        let ranker = SimilarityRanker::new(&cat);
        let first = ranker.rank("s010", 20).unwrap();
        let second = ranker.rank("s010", 20).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, SimilarityRanker::new(&cat).rank("s010", 20).unwrap());
    }

    #[test]
    fn test_clamped_to_catalog() {
        let cat = random_catalog(3, 25);
        let ranker = SimilarityRanker::new(&cat);
        let results = ranker.rank_detailed("s000", 1000).unwrap();
        assert_eq!(results.len(), 24);
        let mut ids: Vec<&str> = results.iter().map(|r| r.song_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 24);
        assert!(!ids.contains(&"s000"));

        let exact = ranker.rank_detailed("s000", 24).unwrap();
        assert_eq!(exact.len(), 24);
    }

    #[test]
    fn test_monotonic_ordering() {
        let cat = random_catalog(11, 200);
        let ranker = SimilarityRanker::new(&cat);
        let results = ranker.rank_detailed("s050", 60).unwrap();
        for pair in results.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
            if pair[0].distance == pair[1].distance {
                assert!(pair[0].song_id < pair[1].song_id);
            }
        }
    }

    #[test]
    fn test_prefix_matches_full_ranking() {
        let cat = random_catalog(5, 150);
        let ranker = SimilarityRanker::new(&cat);
        let full = ranker.rank("s007", 149).unwrap();
        let top = ranker.rank("s007", 12).unwrap();
        assert_eq!(&full[..12], top.as_slice());
    }

    #[test]
    fn test_zero_count() {
        let cat = random_catalog(1, 10);
        let ranker = SimilarityRanker::new(&cat);
        assert!(ranker.rank("s001", 0).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_id() {
        let cat = random_catalog(1, 10);
        let ranker = SimilarityRanker::new(&cat);
        assert_eq!(
            ranker.rank("does-not-exist", 5).unwrap_err(),
            RankError::NotFound("does-not-exist".to_string())
        );
    }

    #[test]
    fn test_single_song_catalog() {
        let cat = catalog(vec![song("only", [0.3; 6])]);
        assert!(SimilarityRanker::new(&cat).rank("only", 5).unwrap().is_empty());
    }

    #[test]
    fn test_degenerate_reference_rejected() {
        let cat = catalog(vec![
            song("silent", [0.0; 6]),
            song("loud", [0.9, 0.9, 0.5, 0.1, 0.0, 0.1]),
        ]);
        let ranker = SimilarityRanker::new(&cat);
        assert_eq!(
            ranker.rank("silent", 3).unwrap_err(),
            RankError::DegenerateVector("silent".to_string())
        );
    }

    #[test]
    fn test_degenerate_candidates_rank_last() {
        let cat = catalog(vec![
            song("ref", [1.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            song("0-zero", [0.0; 6]),
            song("far", [0.0, 0.0, 0.0, 0.0, 0.0, 1.0]),
            song("near", [0.9, 0.1, 0.0, 0.0, 0.0, 0.0]),
        ]);
        let results = SimilarityRanker::new(&cat).rank_detailed("ref", 3).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.song_id.as_str()).collect();
        assert_eq!(ids, vec!["near", "far", "0-zero"]);
        assert!((results[2].distance - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_ranker_shared_across_threads() {
        let cat = random_catalog(9, 80);
        let ranker = SimilarityRanker::new(&cat);
        let expected = ranker.rank("s020", 10).unwrap();
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| ranker.rank("s020", 10).unwrap()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("5"), Ok(5));
        assert_eq!(parse_count(" 0 "), Ok(0));
        assert!(matches!(parse_count("-1"), Err(RankError::InvalidArgument(_))));
        assert!(matches!(parse_count("ten"), Err(RankError::InvalidArgument(_))));
    }

    #[test]
    fn test_catalog_profile() {
        let cat = catalog(vec![
            song("1", [0.2, 0.4, 0.0, 0.0, 0.0, 1.0])
                .with_artists(["Ella Fitzgerald", "Louis Armstrong"])
                .with_year(1956),
            song("2", [0.4, 0.0, 0.0, 0.0, 0.0, 0.0])
                .with_artists(["Ella Fitzgerald"])
                .with_year(1961),
            song("3", [0.0; 6]).with_artists(["Lil Wayne"]).with_year(2008),
        ]);
        let profile = catalog_profile(&cat);
        assert_eq!(profile.total_songs, 3);
        assert_eq!(profile.degenerate_songs, 1);
        assert_eq!(profile.top_artists[0], ("Ella Fitzgerald".to_string(), 2));
        assert_eq!(profile.top_artists[1], ("Lil Wayne".to_string(), 1));
        assert_eq!(
            profile.decades,
            vec![
                ("1950s".to_string(), 1),
                ("1960s".to_string(), 1),
                ("2000s".to_string(), 1)
            ]
        );
        assert_eq!(profile.feature_means[0].0, "danceability");
        assert!((profile.feature_means[0].1 - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_catalog_profile_empty() {
        let profile = catalog_profile(&Catalog::default());
        assert_eq!(profile.total_songs, 0);
        assert!(profile.feature_means.iter().all(|&(_, m)| m == 0.0));
    }
}
