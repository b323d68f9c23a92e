use ndarray::{Array1, Array2, Axis};
use serde::Deserialize;
use std::{str::FromStr, sync::Arc};

use crate::{
    error::{AppError, AppResult},
    models::{Method, Query, ScoredMovie},
    services::{
        estimator::{sort_ranked, Estimator},
        rating_matrix::RatingMatrix,
    },
};

/// Total similarity weight below which a movie is considered unrelated
const MIN_WEIGHT: f64 = 1e-12;

/// How two movie rating columns are compared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Similarity {
    /// Cosine of the raw rating columns, unrated cells as 0
    #[default]
    Cosine,
    /// Cosine of the columns after subtracting each movie's mean rating
    Pearson,
}

impl FromStr for Similarity {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(Similarity::Cosine),
            "pearson" => Ok(Similarity::Pearson),
            other => Err(AppError::InvalidArgument(format!(
                "unsupported similarity '{}', expected cosine or pearson",
                other
            ))),
        }
    }
}

/// Item-based neighborhood estimator
///
/// Each movie is represented by its rating column across all historical
/// users. A candidate's predicted rating is the similarity-weighted mean of
/// the query ratings:
///
/// pred(item) = Σ sim(item, q) · r_q / Σ |sim(item, q)|
///
/// with `sim` the configured [`Similarity`] of the two rating columns.
pub struct NeighborhoodEstimator {
    matrix: Arc<RatingMatrix>,
    similarity: Similarity,
    /// Users × movies, unrated cells as 0 (centred first for Pearson)
    item_vectors: Array2<f64>,
    /// L2 norm of every movie column
    norms: Array1<f64>,
}

impl NeighborhoodEstimator {
    /// Cosine-based estimator
    pub fn new(matrix: Arc<RatingMatrix>) -> Self {
        Self::with_similarity(matrix, Similarity::Cosine)
    }

    pub fn with_similarity(matrix: Arc<RatingMatrix>, similarity: Similarity) -> Self {
        let item_vectors = match similarity {
            Similarity::Cosine => matrix.filled(),
            Similarity::Pearson => centred_columns(&matrix),
        };
        let norms = item_vectors.map_axis(Axis(0), |col| col.dot(&col).sqrt());

        Self {
            matrix,
            similarity,
            item_vectors,
            norms,
        }
    }

    pub fn similarity(&self) -> Similarity {
        self.similarity
    }

    /// Cosine similarity of every movie against the movie in column `col`
    ///
    /// Movies without any rating have a zero vector and get similarity 0.
    fn similarities_to(&self, col: usize) -> Array1<f64> {
        let dots = self.item_vectors.t().dot(&self.item_vectors.column(col));
        let anchor = self.norms[col];

        let mut sims = dots;
        for (sim, &norm) in sims.iter_mut().zip(self.norms.iter()) {
            let denom = norm * anchor;
            *sim = if denom > 0.0 {
                (*sim / denom).clamp(-1.0, 1.0)
            } else {
                0.0
            };
        }
        sims
    }
}

/// Known ratings minus their column mean; unrated cells stay 0
fn centred_columns(matrix: &RatingMatrix) -> Array2<f64> {
    let mask = matrix.known_mask();
    let mut values = matrix.filled();

    let counts = mask.sum_axis(Axis(0));
    let sums = values.sum_axis(Axis(0));

    for (col, mut column) in values.axis_iter_mut(Axis(1)).enumerate() {
        if counts[col] == 0.0 {
            continue;
        }
        let mean = sums[col] / counts[col];
        for (value, known) in column.iter_mut().zip(mask.column(col)) {
            if *known > 0.0 {
                *value -= mean;
            }
        }
    }
    values
}

impl Estimator for NeighborhoodEstimator {
    fn method(&self) -> Method {
        Method::Neighborhood
    }

    fn score(&self, query: &Query) -> AppResult<Vec<ScoredMovie>> {
        if query.is_empty() {
            return Err(AppError::InvalidQuery(
                "neighborhood scoring needs at least one rated movie".to_string(),
            ));
        }

        let n_items = self.matrix.n_items();
        let mut weighted = Array1::<f64>::zeros(n_items);
        let mut weights = Array1::<f64>::zeros(n_items);

        for (movie_id, rating) in query.iter() {
            let col = self
                .matrix
                .column_of(movie_id)
                .ok_or(AppError::UnknownItem(movie_id))?;
            let sims = self.similarities_to(col);

            weighted.scaled_add(rating, &sims);
            weights += &sims.mapv(f64::abs);
        }

        let mut candidates: Vec<ScoredMovie> = self
            .matrix
            .item_ids()
            .iter()
            .enumerate()
            .filter(|(_, &movie_id)| !query.contains(movie_id))
            .filter(|(col, _)| weights[*col] > MIN_WEIGHT)
            .map(|(col, &movie_id)| ScoredMovie::new(movie_id, weighted[col] / weights[col]))
            .collect();

        sort_ranked(&mut candidates);

        tracing::debug!(
            similarity = ?self.similarity,
            query_size = query.len(),
            scored = candidates.len(),
            skipped = n_items - query.len() - candidates.len(),
            "Neighborhood scoring done"
        );

        Ok(candidates)
    }
}
