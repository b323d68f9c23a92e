use ndarray::{Array1, Array2, Axis};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Method, Query, ScoredMovie},
    services::{
        estimator::{sort_ranked, Estimator},
        rating_matrix::RatingMatrix,
    },
};

/// Keeps multiplicative updates away from 0/0
const EPSILON: f64 = 1e-9;

/// Tuning for the nonnegative matrix factorization
#[derive(Debug, Clone, PartialEq)]
pub struct FactorizationConfig {
    /// Latent dimension r
    pub rank: usize,
    /// Multiplicative update rounds when fitting U and V
    pub iterations: usize,
    /// Update rounds when projecting a query onto V
    pub projection_iterations: usize,
    /// Seed for the factor initialisation
    pub seed: u64,
}

impl Default for FactorizationConfig {
    fn default() -> Self {
        Self {
            rank: 8,
            iterations: 300,
            projection_iterations: 500,
            seed: 42,
        }
    }
}

/// Fitted nonnegative factors M ≈ U · Vᵀ
#[derive(Debug, Clone)]
pub struct NmfModel {
    /// Users × r
    user_factors: Array2<f64>,
    /// Movies × r
    item_factors: Array2<f64>,
    /// RMSE over the known cells after the last update
    reconstruction_error: f64,
}

impl NmfModel {
    /// Fits U and V on the known cells of `matrix` only
    ///
    /// Uses weighted Lee-Seung multiplicative updates. Unknown cells carry
    /// zero weight, so they neither pull predictions towards 0 nor count in
    /// the error. The initial factors come from a seeded RNG, which makes the
    /// fit reproducible for a given config.
    pub fn fit(matrix: &RatingMatrix, config: &FactorizationConfig) -> AppResult<Self> {
        if config.rank == 0 {
            return Err(AppError::InvalidArgument(
                "factorization rank must be at least 1".to_string(),
            ));
        }

        let weights = matrix.known_mask();
        let ratings = matrix.filled();
        let known = weights.sum();
        let mean = if known > 0.0 {
            ratings.sum() / known
        } else {
            0.0
        };

        // Start near a constant reconstruction of the mean rating
        let scale = (mean.max(EPSILON) / config.rank as f64).sqrt();
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut user_factors = Array2::from_shape_fn((matrix.n_users(), config.rank), |_| {
            scale * (0.5 + rng.gen::<f64>())
        });
        let mut item_factors = Array2::from_shape_fn((matrix.n_items(), config.rank), |_| {
            scale * (0.5 + rng.gen::<f64>())
        });

        for _ in 0..config.iterations {
            let approx = &weights * &user_factors.dot(&item_factors.t());
            let numer = ratings.dot(&item_factors);
            let denom = approx.dot(&item_factors) + EPSILON;
            user_factors *= &(numer / denom);

            let approx = &weights * &user_factors.dot(&item_factors.t());
            let numer = ratings.t().dot(&user_factors);
            let denom = approx.t().dot(&user_factors) + EPSILON;
            item_factors *= &(numer / denom);
        }

        let residual = &weights * &(&ratings - &user_factors.dot(&item_factors.t()));
        let reconstruction_error = if known > 0.0 {
            (residual.mapv(|r| r * r).sum() / known).sqrt()
        } else {
            0.0
        };

        tracing::info!(
            rank = config.rank,
            iterations = config.iterations,
            users = matrix.n_users(),
            movies = matrix.n_items(),
            "Factorization model fitted"
        );
        tracing::debug!(reconstruction_error, "Factorization fit error");

        Ok(Self {
            user_factors,
            item_factors,
            reconstruction_error,
        })
    }

    pub fn rank(&self) -> usize {
        self.item_factors.ncols()
    }

    pub fn reconstruction_error(&self) -> f64 {
        self.reconstruction_error
    }

    pub fn user_factors(&self) -> &Array2<f64> {
        &self.user_factors
    }

    pub fn item_factors(&self) -> &Array2<f64> {
        &self.item_factors
    }

    /// Fits a latent row for a new user while holding V fixed
    ///
    /// Solves min ‖q − V_Q h‖² subject to h ≥ 0, where V_Q are the rows of
    /// the rated movies, with the same multiplicative rule used for U. A
    /// query of all zeros drives h to zero, which scores every movie alike.
    pub fn project(&self, columns: &[usize], ratings: &[f64], iterations: usize) -> Array1<f64> {
        let rated = self.item_factors.select(Axis(0), columns);
        let q = Array1::from_vec(ratings.to_vec());

        let numer = rated.t().dot(&q);
        let gram = rated.t().dot(&rated);

        let mut latent = Array1::from_elem(self.rank(), 1.0);
        for _ in 0..iterations {
            let denom = gram.dot(&latent) + EPSILON;
            latent = latent * &numer / denom;
        }
        latent
    }

    /// Predicted score of every movie for a latent row
    pub fn predict(&self, latent: &Array1<f64>) -> Array1<f64> {
        self.item_factors.dot(latent)
    }

    /// Reconstructed rating row of a historical user
    pub fn reconstruct_row(&self, row: usize) -> Array1<f64> {
        self.item_factors.dot(&self.user_factors.row(row))
    }
}

/// Latent-factor estimator
///
/// The factors are fitted once at startup; each request only projects the
/// query onto the item factors.
pub struct FactorizationEstimator {
    matrix: Arc<RatingMatrix>,
    model: Arc<NmfModel>,
    projection_iterations: usize,
}

impl FactorizationEstimator {
    /// Fits the model; a one-time blocking step before serving requests
    pub fn fit(matrix: Arc<RatingMatrix>, config: &FactorizationConfig) -> AppResult<Self> {
        let model = NmfModel::fit(&matrix, config)?;
        Ok(Self::with_model(matrix, Arc::new(model), config.projection_iterations))
    }

    pub fn with_model(
        matrix: Arc<RatingMatrix>,
        model: Arc<NmfModel>,
        projection_iterations: usize,
    ) -> Self {
        Self {
            matrix,
            model,
            projection_iterations,
        }
    }

    pub fn model(&self) -> &NmfModel {
        &self.model
    }
}

impl Estimator for FactorizationEstimator {
    fn method(&self) -> Method {
        Method::Factorization
    }

    fn score(&self, query: &Query) -> AppResult<Vec<ScoredMovie>> {
        if query.is_empty() {
            return Err(AppError::InvalidQuery(
                "factorization scoring needs at least one rated movie".to_string(),
            ));
        }

        let mut columns = Vec::with_capacity(query.len());
        let mut ratings = Vec::with_capacity(query.len());
        for (movie_id, rating) in query.iter() {
            let col = self
                .matrix
                .column_of(movie_id)
                .ok_or(AppError::UnknownItem(movie_id))?;
            columns.push(col);
            ratings.push(rating);
        }

        let latent = self
            .model
            .project(&columns, &ratings, self.projection_iterations);
        let predicted = self.model.predict(&latent);

        let mut candidates: Vec<ScoredMovie> = self
            .matrix
            .item_ids()
            .iter()
            .zip(predicted.iter())
            .filter(|(movie_id, _)| !query.contains(**movie_id))
            .map(|(&movie_id, &score)| ScoredMovie::new(movie_id, score))
            .collect();

        sort_ranked(&mut candidates);

        tracing::debug!(
            query_size = query.len(),
            latent_norm = latent.dot(&latent).sqrt(),
            "Factorization scoring done"
        );

        Ok(candidates)
    }
}
