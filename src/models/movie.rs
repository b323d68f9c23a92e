use serde::Serialize;
use url::Url;

use super::MovieId;

/// Number of cast members shown on a display record
const CAST_PREVIEW_LEN: usize = 10;

/// A catalog movie with its display metadata
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Movie {
    pub movie_id: MovieId,
    pub title: String,
    pub year: Option<i32>,
    /// IMDB rating on a 0-10 scale
    pub imdb_rating: Option<f64>,
    pub genres: Vec<String>,
    pub directors: Vec<String>,
    pub cast: Vec<String>,
    pub plot: Option<String>,
    pub url: Option<String>,
    pub cover_url: Option<String>,
}

impl Movie {
    /// Creates a movie with only an id and a title
    pub fn new(movie_id: MovieId, title: impl Into<String>) -> Self {
        Self {
            movie_id,
            title: title.into(),
            year: None,
            imdb_rating: None,
            genres: Vec::new(),
            directors: Vec::new(),
            cast: Vec::new(),
            plot: None,
            url: None,
            cover_url: None,
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_imdb_rating(mut self, rating: f64) -> Self {
        self.imdb_rating = Some(rating);
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }
}

/// Presentation-ready view of a movie
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MovieDetails {
    pub movie_id: MovieId,
    /// "Title (Year)", only when both are known
    pub heading: Option<String>,
    /// "8.1/10"
    pub imdb_rating: Option<String>,
    pub genres: Vec<String>,
    pub directors: Vec<String>,
    pub cast: Vec<String>,
    /// True when `cast` was cut short
    pub more_cast: bool,
    pub plot: Option<String>,
    pub imdb_link: Option<String>,
    pub cover_url: Option<String>,
}

impl From<&Movie> for MovieDetails {
    fn from(movie: &Movie) -> Self {
        let heading = match (movie.title.is_empty(), movie.year) {
            (false, Some(year)) => Some(format!("{} ({})", movie.title, year)),
            _ => None,
        };

        Self {
            movie_id: movie.movie_id,
            heading,
            imdb_rating: movie.imdb_rating.map(|r| format!("{}/10", r)),
            genres: movie.genres.clone(),
            directors: movie.directors.clone(),
            cast: movie.cast.iter().take(CAST_PREVIEW_LEN).cloned().collect(),
            more_cast: movie.cast.len() > CAST_PREVIEW_LEN,
            plot: movie.plot.clone(),
            imdb_link: web_link(movie.url.as_deref()),
            cover_url: web_link(movie.cover_url.as_deref()),
        }
    }
}

/// Keeps a link only if it parses as an absolute http(s) URL
fn web_link(raw: Option<&str>) -> Option<String> {
    let parsed = Url::parse(raw?.trim()).ok()?;
    matches!(parsed.scheme(), "http" | "https").then(|| parsed.to_string())
}
