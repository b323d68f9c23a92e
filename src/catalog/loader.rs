use serde::Deserialize;
use std::{fs::File, io::Read, path::Path};

use crate::{
    error::{AppError, AppResult},
    models::{Movie, MovieId, RatingRecord},
};

/// Raw row of the movie catalog CSV
#[derive(Debug, Deserialize)]
struct MovieRow {
    movie_id: Option<MovieId>,
    title: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    year: Option<i32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    imdb_rating: Option<f64>,
    genre: Option<String>,
    director: Option<String>,
    cast: Option<String>,
    plot: Option<String>,
    url: Option<String>,
    cover_url: Option<String>,
}

impl From<(MovieId, MovieRow)> for Movie {
    fn from((movie_id, row): (MovieId, MovieRow)) -> Self {
        Movie {
            movie_id,
            title: row.title.map(|t| t.trim().to_string()).unwrap_or_default(),
            year: row.year,
            imdb_rating: row.imdb_rating,
            genres: split_list(row.genre.as_deref()),
            directors: split_list(row.director.as_deref()),
            cast: split_list(row.cast.as_deref()),
            plot: row.plot.filter(|p| !p.trim().is_empty()),
            url: row.url,
            cover_url: row.cover_url,
        }
    }
}

/// Splits a `|`-separated list column ("Action | Drama", "Nolan|Thomas")
fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split('|')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Loads the movie catalog from a CSV file
pub fn load_catalog<P: AsRef<Path>>(path: P) -> AppResult<Vec<Movie>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let movies = read_catalog(file)?;

    tracing::info!(path = %path.display(), movies = movies.len(), "Catalog loaded");

    Ok(movies)
}

/// Reads catalog rows from any CSV source
///
/// A row without a movie_id is invalid input and aborts the load.
pub fn read_catalog<R: Read>(source: R) -> AppResult<Vec<Movie>> {
    let mut reader = csv::Reader::from_reader(source);
    let mut movies = Vec::new();

    for (index, row) in reader.deserialize::<MovieRow>().enumerate() {
        let row = row?;
        // Header is line 1
        let line = index + 2;

        let movie_id = row.movie_id.ok_or_else(|| {
            AppError::DataIntegrity(format!("catalog row on line {} has no movie_id", line))
        })?;

        movies.push(Movie::from((movie_id, row)));
    }

    Ok(movies)
}

/// Loads the historical ratings from a CSV file
pub fn load_ratings<P: AsRef<Path>>(path: P) -> AppResult<Vec<RatingRecord>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let ratings = read_ratings(file)?;

    tracing::info!(path = %path.display(), ratings = ratings.len(), "Ratings loaded");

    Ok(ratings)
}

/// Reads `user_id,movie_id,rating` rows from any CSV source
pub fn read_ratings<R: Read>(source: R) -> AppResult<Vec<RatingRecord>> {
    let mut reader = csv::Reader::from_reader(source);
    reader
        .deserialize::<RatingRecord>()
        .map(|row| row.map_err(AppError::from))
        .collect()
}
