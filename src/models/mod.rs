use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use crate::error::AppError;

pub mod movie;

pub use movie::{Movie, MovieDetails};

/// Catalog-wide movie identifier
pub type MovieId = u64;

/// Identifier of a user in the historical rating set
pub type UserId = u64;

/// Lowest rating a user can give ("watched, disliked")
pub const MIN_RATING: f64 = 0.0;
/// Highest rating a user can give
pub const MAX_RATING: f64 = 5.0;

/// Returns true when `rating` is a finite value inside [MIN_RATING, MAX_RATING]
pub fn is_valid_rating(rating: f64) -> bool {
    rating.is_finite() && (MIN_RATING..=MAX_RATING).contains(&rating)
}

/// One historical rating, as found in the ratings dataset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: f64,
}

impl RatingRecord {
    pub fn new(user_id: UserId, movie_id: MovieId, rating: f64) -> Self {
        Self {
            user_id,
            movie_id,
            rating,
        }
    }
}

/// Ratings submitted by one ephemeral pseudo-user
///
/// Keys are kept ordered so every pass over the query visits movies in the
/// same order, which keeps floating point accumulation reproducible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Query {
    ratings: BTreeMap<MovieId, f64>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets (or replaces) the rating for a movie
    pub fn insert(&mut self, movie_id: MovieId, rating: f64) {
        self.ratings.insert(movie_id, rating);
    }

    pub fn get(&self, movie_id: MovieId) -> Option<f64> {
        self.ratings.get(&movie_id).copied()
    }

    pub fn contains(&self, movie_id: MovieId) -> bool {
        self.ratings.contains_key(&movie_id)
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// Iterates `(movie_id, rating)` pairs in ascending movie id order
    pub fn iter(&self) -> impl Iterator<Item = (MovieId, f64)> + '_ {
        self.ratings.iter().map(|(&id, &rating)| (id, rating))
    }

    pub fn movie_ids(&self) -> impl Iterator<Item = MovieId> + '_ {
        self.ratings.keys().copied()
    }
}

impl FromIterator<(MovieId, f64)> for Query {
    fn from_iter<T: IntoIterator<Item = (MovieId, f64)>>(iter: T) -> Self {
        Self {
            ratings: iter.into_iter().collect(),
        }
    }
}

/// Estimation strategy used to answer a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Cosine similarity between item rating vectors
    Neighborhood,
    /// Projection onto nonnegative latent factors
    Factorization,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Neighborhood => "neighborhood",
            Method::Factorization => "factorization",
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Method {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "neighbors" | "neighborhood" | "nearest_neighbors" => Ok(Method::Neighborhood),
            "nmf" | "factorization" => Ok(Method::Factorization),
            other => Err(AppError::InvalidArgument(format!(
                "unsupported method '{}', expected one of: neighbors, nmf",
                other
            ))),
        }
    }
}

/// One ranked recommendation
///
/// The score only orders results; on the factorization path it is not
/// guaranteed to stay on the rating scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredMovie {
    pub movie_id: MovieId,
    pub score: f64,
}

impl ScoredMovie {
    pub fn new(movie_id: MovieId, score: f64) -> Self {
        Self { movie_id, score }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_aliases() {
        assert_eq!("neighbors".parse::<Method>().unwrap(), Method::Neighborhood);
        assert_eq!(
            "Nearest_Neighbors".parse::<Method>().unwrap(),
            Method::Neighborhood
        );
        assert_eq!("nmf".parse::<Method>().unwrap(), Method::Factorization);
        assert_eq!(
            "factorization".parse::<Method>().unwrap(),
            Method::Factorization
        );
    }

    #[test]
    fn test_unsupported_method_is_invalid_argument() {
        let err = "svd".parse::<Method>().unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[test]
    fn test_method_serialization() {
        let json = serde_json::to_string(&Method::Factorization).unwrap();
        assert_eq!(json, "\"factorization\"");
    }

    #[test]
    fn test_query_iterates_in_id_order() {
        let query: Query = [(30, 1.0), (10, 5.0), (20, 3.0)].into_iter().collect();
        let ids: Vec<MovieId> = query.movie_ids().collect();
        assert_eq!(ids, vec![10, 20, 30]);
        assert_eq!(query.get(10), Some(5.0));
        assert!(!query.contains(40));
    }

    #[test]
    fn test_query_deserializes_from_json_object() {
        let query: Query = serde_json::from_str(r#"{"12": 4.5, "7": 0}"#).unwrap();
        assert_eq!(query.len(), 2);
        assert_eq!(query.get(7), Some(0.0));
        assert_eq!(query.get(12), Some(4.5));
    }

    #[test]
    fn test_rating_bounds() {
        assert!(is_valid_rating(0.0));
        assert!(is_valid_rating(5.0));
        assert!(!is_valid_rating(5.5));
        assert!(!is_valid_rating(-0.1));
        assert!(!is_valid_rating(f64::NAN));
    }
}
