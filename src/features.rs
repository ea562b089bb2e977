use serde::{Deserialize, Serialize};

/// Number of acoustic attributes per song.
pub const FEATURE_DIM: usize = 6;

/// Attribute names, in vector order.
pub const FEATURE_NAMES: [&str; FEATURE_DIM] = [
    "danceability",
    "energy",
    "valence",
    "speechiness",
    "instrumentalness",
    "acousticness",
];

/// Cosine distance of two opposite vectors, and of anything compared with a zero vector.
pub const MAX_COSINE_DISTANCE: f32 = 2.0;

/// The acoustic descriptor of a song.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector([f32; FEATURE_DIM]);

impl FeatureVector {
    #[must_use]
    pub const fn new(values: [f32; FEATURE_DIM]) -> Self {
        Self(values)
    }

    #[must_use]
    pub const fn as_array(&self) -> &[f32; FEATURE_DIM] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        is_zero_vec(&self.0)
    }

    /// Index of the first non-finite attribute, if any.
    #[must_use]
    pub fn first_non_finite(&self) -> Option<usize> {
        self.0.iter().position(|v| !v.is_finite())
    }
}

#[must_use]
pub fn is_zero_vec(vec: &[f32]) -> bool {
    vec.iter().all(|&v| v == 0.0)
}

// Accumulated in f64: squaring an f32 attribute overflows above ~1e19 and
// flushes to zero below ~1e-19.
fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum()
}

fn norm(a: &[f32]) -> f64 {
    dot(a, a).sqrt()
}

/// L2-normalize a feature vector. A zero vector stays zero.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn normalize(vec: &FeatureVector) -> FeatureVector {
    let mut out = *vec;
    let norm = norm(&out.0);
    if norm > 0.0 {
        for v in &mut out.0 {
            *v = (f64::from(*v) / norm) as f32;
        }
    }
    out
}

/// Cosine distance `1 - a·b / (|a||b|)`, clamped to `[0, 2]`.
///
/// Inputs need not be unit length. When either side has zero norm the
/// pair is treated as maximally dissimilar.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn cosine_distance(a: &FeatureVector, b: &FeatureVector) -> f32 {
    let norm_a = norm(&a.0);
    let norm_b = norm(&b.0);
    if norm_a == 0.0 || norm_b == 0.0 {
        return MAX_COSINE_DISTANCE;
    }
    let similarity = dot(&a.0, &b.0) / (norm_a * norm_b);
    ((1.0 - similarity) as f32).clamp(0.0, MAX_COSINE_DISTANCE)
}
