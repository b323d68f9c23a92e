use axum::{
    extract::{Path, Query as UrlQuery, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{Method, Movie, MovieDetails, MovieId, Query, ScoredMovie, MAX_RATING},
};

use super::AppState;

/// Movies offered for rating when the request does not say how many
const DEFAULT_TO_RATE: usize = 10;

// Request/Response types

#[derive(Debug, Serialize)]
pub struct MovieSummary {
    pub movie_id: MovieId,
    pub title: String,
    pub year: Option<i32>,
    pub imdb_rating: Option<f64>,
}

impl From<&Movie> for MovieSummary {
    fn from(movie: &Movie) -> Self {
        Self {
            movie_id: movie.movie_id,
            title: movie.title.clone(),
            year: movie.year,
            imdb_rating: movie.imdb_rating,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LookupParams {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct ToRateParams {
    pub count: Option<usize>,
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ToRateResponse {
    /// Echoed so a client can replay the same prompt
    pub seed: u64,
    pub movies: Vec<MovieSummary>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub ratings: Query,
    pub method: String,
    pub k: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct FavouritesRequest {
    pub titles: Vec<String>,
    pub method: String,
    pub k: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RecommendedMovie {
    pub movie_id: MovieId,
    pub score: f64,
    pub movie: MovieDetails,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub method: Method,
    pub recommendations: Vec<RecommendedMovie>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// All catalog movies, ordered by title
pub async fn list_movies(State(state): State<AppState>) -> Json<Vec<MovieSummary>> {
    let movies = state
        .catalog
        .sorted_by_title()
        .into_iter()
        .map(MovieSummary::from)
        .collect();
    Json(movies)
}

pub async fn get_movie(
    State(state): State<AppState>,
    Path(movie_id): Path<MovieId>,
) -> AppResult<Json<MovieDetails>> {
    let movie = state.catalog.get(movie_id)?;
    Ok(Json(MovieDetails::from(movie)))
}

pub async fn lookup_movie(
    State(state): State<AppState>,
    UrlQuery(params): UrlQuery<LookupParams>,
) -> AppResult<Json<MovieDetails>> {
    let movie = state
        .catalog
        .find_by_title(&params.title)
        .ok_or_else(|| AppError::NotFound(format!("no movie titled '{}'", params.title)))?;
    Ok(Json(MovieDetails::from(movie)))
}

/// Random sample of well rated movies for a new user to rate
pub async fn movies_to_rate(
    State(state): State<AppState>,
    UrlQuery(params): UrlQuery<ToRateParams>,
) -> Json<ToRateResponse> {
    let seed = params.seed.unwrap_or_else(rand::random);
    let count = params.count.unwrap_or(DEFAULT_TO_RATE);

    let movies = state
        .catalog
        .sample_to_rate(count, state.settings.rate_pool_size, seed)
        .into_iter()
        .map(MovieSummary::from)
        .collect();

    Json(ToRateResponse { seed, movies })
}

/// Recommendations from explicit ratings
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    let method: Method = request.method.parse()?;
    let k = resolve_k(request.k, state.settings.default_recommendations)?;

    tracing::info!(
        request_id = %request_id,
        method = %method,
        rated = request.ratings.len(),
        k,
        "Recommendation request"
    );

    run_recommendation(state, request.ratings, method, k).await
}

/// Recommendations from a list of favourite titles, each treated as a 5
pub async fn recommend_favourites(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<FavouritesRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    let method: Method = request.method.parse()?;
    let k = resolve_k(request.k, state.settings.default_recommendations)?;

    let mut query = Query::new();
    for title in &request.titles {
        let movie = state.catalog.find_by_title(title).ok_or_else(|| {
            AppError::InvalidQuery(format!("no movie titled '{}'", title))
        })?;
        query.insert(movie.movie_id, MAX_RATING);
    }

    tracing::info!(
        request_id = %request_id,
        method = %method,
        favourites = query.len(),
        k,
        "Favourites recommendation request"
    );

    run_recommendation(state, query, method, k).await
}

/// Scores on the blocking pool and attaches display records
async fn run_recommendation(
    state: AppState,
    query: Query,
    method: Method,
    k: usize,
) -> AppResult<Json<RecommendationResponse>> {
    let recommender = state.recommender.clone();
    let scored: Vec<ScoredMovie> =
        tokio::task::spawn_blocking(move || recommender.recommend(&query, method, k))
            .await
            .map_err(|e| AppError::Internal(format!("recommendation task failed: {}", e)))??;

    let recommendations = scored
        .into_iter()
        .map(|s| {
            let movie = state.catalog.get(s.movie_id)?;
            Ok(RecommendedMovie {
                movie_id: s.movie_id,
                score: s.score,
                movie: MovieDetails::from(movie),
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(Json(RecommendationResponse {
        method,
        recommendations,
    }))
}

/// Falls back to the configured default; anything below 1 is rejected
fn resolve_k(requested: Option<i64>, default: usize) -> AppResult<usize> {
    match requested {
        None => Ok(default),
        Some(k) if k >= 1 => usize::try_from(k)
            .map_err(|_| AppError::InvalidArgument(format!("k {} is too large", k))),
        Some(k) => Err(AppError::InvalidArgument(format!(
            "k must be at least 1, got {}",
            k
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_k() {
        assert_eq!(resolve_k(None, 5).unwrap(), 5);
        assert_eq!(resolve_k(Some(3), 5).unwrap(), 3);
        assert!(matches!(
            resolve_k(Some(0), 5),
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            resolve_k(Some(-2), 5),
            Err(AppError::InvalidArgument(_))
        ));
    }
}
