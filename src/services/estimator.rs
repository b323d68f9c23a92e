use crate::{
    error::AppResult,
    models::{Method, Query, ScoredMovie},
};

/// A strategy that turns one pseudo-user's ratings into movie scores
///
/// Implementations hold only read-only model state, so a single instance
/// serves concurrent requests.
#[cfg_attr(test, mockall::automock)]
pub trait Estimator: Send + Sync {
    /// Method this estimator answers for
    fn method(&self) -> Method;

    /// Scores every movie the model can rank that is not already in `query`
    ///
    /// The result is ordered by [`sort_ranked`] but not truncated; movies the
    /// model has no basis to score are omitted instead of getting a
    /// placeholder score.
    fn score(&self, query: &Query) -> AppResult<Vec<ScoredMovie>>;
}

/// Orders by descending score, ties broken by ascending movie id
pub fn sort_ranked(candidates: &mut [ScoredMovie]) {
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.movie_id.cmp(&b.movie_id))
    });
}
