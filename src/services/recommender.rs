use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::{
    catalog::CatalogStore,
    error::{AppError, AppResult},
    models::{is_valid_rating, Method, Query, RatingRecord, ScoredMovie},
    services::{
        estimator::{sort_ranked, Estimator},
        factorization::{FactorizationConfig, FactorizationEstimator},
        neighborhood::{NeighborhoodEstimator, Similarity},
        rating_matrix::RatingMatrix,
    },
};

/// Recommendation engine
///
/// Validates a query against the catalog, dispatches it to the estimator
/// registered for the requested method, and returns the top-k unseen movies.
/// Holds only shared read-only state; `recommend` is a pure function of its
/// arguments.
#[derive(Clone)]
pub struct Recommender {
    catalog: Arc<CatalogStore>,
    estimators: BTreeMap<Method, Arc<dyn Estimator>>,
}

impl Recommender {
    /// Creates an engine with no estimators registered
    pub fn new(catalog: Arc<CatalogStore>) -> Self {
        Self {
            catalog,
            estimators: BTreeMap::new(),
        }
    }

    /// Registers an estimator under its own method, replacing any previous one
    pub fn with_estimator(mut self, estimator: Arc<dyn Estimator>) -> Self {
        self.estimators.insert(estimator.method(), estimator);
        self
    }

    /// Builds the rating matrix and both estimators from historical ratings
    ///
    /// Fitting the factorization model blocks; call this before serving.
    pub fn build(
        catalog: Arc<CatalogStore>,
        ratings: &[RatingRecord],
        similarity: Similarity,
        config: &FactorizationConfig,
    ) -> AppResult<Self> {
        let matrix = Arc::new(RatingMatrix::build(&catalog, ratings)?);

        let neighborhood = NeighborhoodEstimator::with_similarity(matrix.clone(), similarity);
        let factorization = FactorizationEstimator::fit(matrix, config)?;

        Ok(Self::new(catalog)
            .with_estimator(Arc::new(neighborhood))
            .with_estimator(Arc::new(factorization)))
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    /// Another handle on the catalog this engine validates against
    pub fn shared_catalog(&self) -> Arc<CatalogStore> {
        Arc::clone(&self.catalog)
    }

    /// Methods with a registered estimator
    pub fn methods(&self) -> Vec<Method> {
        self.estimators.keys().copied().collect()
    }

    /// Returns at most `k` movies not in `query`, best first
    ///
    /// Validation happens before any estimator work:
    /// - empty query, unknown movie ids, or ratings outside [0, 5] fail with
    ///   `InvalidQuery`
    /// - `k == 0` or a method without an estimator fails with
    ///   `InvalidArgument`
    pub fn recommend(&self, query: &Query, method: Method, k: usize) -> AppResult<Vec<ScoredMovie>> {
        let start = Instant::now();

        if let Err(err) = self.validate(query, k) {
            tracing::warn!(method = %method, k, error = %err, "Rejected recommendation query");
            return Err(err);
        }

        let estimator = self.estimators.get(&method).ok_or_else(|| {
            AppError::InvalidArgument(format!("no estimator registered for method {}", method))
        })?;

        let candidates = estimator.score(query)?;
        let recommendations = top_k(candidates, query, k);

        tracing::info!(
            method = %method,
            query_size = query.len(),
            k,
            returned = recommendations.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Recommendations computed"
        );

        Ok(recommendations)
    }

    fn validate(&self, query: &Query, k: usize) -> AppResult<()> {
        if query.is_empty() {
            return Err(AppError::InvalidQuery(
                "query must rate at least one movie".to_string(),
            ));
        }

        if let Some(movie_id) = query.movie_ids().find(|id| !self.catalog.contains(*id)) {
            return Err(AppError::InvalidQuery(format!(
                "movie {} is not in the catalog",
                movie_id
            )));
        }

        if let Some((movie_id, rating)) = query.iter().find(|(_, r)| !is_valid_rating(*r)) {
            return Err(AppError::InvalidQuery(format!(
                "rating {} for movie {} is outside [0, 5]",
                rating, movie_id
            )));
        }

        if k < 1 {
            return Err(AppError::InvalidArgument(
                "k must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Drops rated and non-finite candidates, orders them, keeps the first `k`
fn top_k(candidates: Vec<ScoredMovie>, query: &Query, k: usize) -> Vec<ScoredMovie> {
    let mut kept: Vec<ScoredMovie> = candidates
        .into_iter()
        .filter(|c| !query.contains(c.movie_id) && c.score.is_finite())
        .collect();

    sort_ranked(&mut kept);
    kept.truncate(k);
    kept
}
