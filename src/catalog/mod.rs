//! Fixed, read-only set of recommendable movies.
//!
//! The store is built once at startup and shared behind an `Arc`; nothing
//! mutates it afterwards, so concurrent readers need no locking.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::{
    error::{AppError, AppResult},
    models::{Movie, MovieId},
};

pub mod loader;

pub use loader::{load_catalog, load_ratings, read_catalog, read_ratings};

/// Immutable movie catalog keyed by movie id
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    movies: BTreeMap<MovieId, Movie>,
}

impl CatalogStore {
    /// Builds the store, rejecting duplicate movie ids
    pub fn new<I>(records: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = Movie>,
    {
        let mut movies = BTreeMap::new();

        for movie in records {
            let movie_id = movie.movie_id;
            if movies.insert(movie_id, movie).is_some() {
                return Err(AppError::DataIntegrity(format!(
                    "duplicate movie_id {} in catalog",
                    movie_id
                )));
            }
        }

        Ok(Self { movies })
    }

    pub fn get(&self, movie_id: MovieId) -> AppResult<&Movie> {
        self.movies
            .get(&movie_id)
            .ok_or_else(|| AppError::NotFound(format!("movie {} not in catalog", movie_id)))
    }

    pub fn contains(&self, movie_id: MovieId) -> bool {
        self.movies.contains_key(&movie_id)
    }

    pub fn all_ids(&self) -> BTreeSet<MovieId> {
        self.movies.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Movies in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &Movie> {
        self.movies.values()
    }

    /// All movies ordered by title, then id
    pub fn sorted_by_title(&self) -> Vec<&Movie> {
        let mut movies: Vec<&Movie> = self.movies.values().collect();
        movies.sort_by(|a, b| a.title.cmp(&b.title).then(a.movie_id.cmp(&b.movie_id)));
        movies
    }

    /// Finds a movie by exact title; the lowest id wins when titles repeat
    pub fn find_by_title(&self, title: &str) -> Option<&Movie> {
        self.movies.values().find(|m| m.title == title)
    }

    /// The `limit` best movies by IMDB rating, unrated movies last
    pub fn top_rated(&self, limit: usize) -> Vec<&Movie> {
        let mut movies: Vec<&Movie> = self.movies.values().collect();
        movies.sort_by(|a, b| {
            match (a.imdb_rating, b.imdb_rating) {
                (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
            .then(a.movie_id.cmp(&b.movie_id))
        });
        movies.truncate(limit);
        movies
    }

    /// Picks `count` distinct movies to prompt a rating for
    ///
    /// Draws without replacement from the `pool_size` top rated movies. The
    /// same seed always yields the same selection.
    pub fn sample_to_rate(&self, count: usize, pool_size: usize, seed: u64) -> Vec<&Movie> {
        let pool = self.top_rated(pool_size);
        let mut rng = StdRng::seed_from_u64(seed);

        pool.choose_multiple(&mut rng, count.min(pool.len()))
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> CatalogStore {
        CatalogStore::new(vec![
            Movie::new(3, "Heat").with_imdb_rating(8.3),
            Movie::new(1, "Alien").with_imdb_rating(8.5),
            Movie::new(2, "Cats"),
            Movie::new(4, "Alien").with_imdb_rating(6.0),
            Movie::new(5, "Brazil").with_imdb_rating(7.9),
        ])
        .unwrap()
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = CatalogStore::new(vec![Movie::new(1, "A"), Movie::new(1, "B")]);
        assert!(matches!(result, Err(AppError::DataIntegrity(_))));
    }

    #[test]
    fn test_get_and_not_found() {
        let catalog = catalog();
        assert_eq!(catalog.get(3).unwrap().title, "Heat");
        assert!(matches!(catalog.get(99), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_all_ids() {
        let ids: Vec<MovieId> = catalog().all_ids().into_iter().collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_sorted_by_title_breaks_ties_by_id() {
        let catalog = catalog();
        let ids: Vec<MovieId> = catalog.sorted_by_title().iter().map(|m| m.movie_id).collect();
        assert_eq!(ids, vec![1, 4, 5, 2, 3]);
    }

    #[test]
    fn test_find_by_title_prefers_lowest_id() {
        let catalog = catalog();
        assert_eq!(catalog.find_by_title("Alien").unwrap().movie_id, 1);
        assert!(catalog.find_by_title("alien").is_none());
    }

    #[test]
    fn test_top_rated_puts_unrated_last() {
        let catalog = catalog();
        let ids: Vec<MovieId> = catalog.top_rated(10).iter().map(|m| m.movie_id).collect();
        assert_eq!(ids, vec![1, 3, 5, 4, 2]);
        assert_eq!(catalog.top_rated(2).len(), 2);
    }

    #[test]
    fn test_sample_to_rate_is_seeded() {
        let catalog = catalog();
        let first: Vec<MovieId> = catalog
            .sample_to_rate(3, 4, 7)
            .iter()
            .map(|m| m.movie_id)
            .collect();
        let second: Vec<MovieId> = catalog
            .sample_to_rate(3, 4, 7)
            .iter()
            .map(|m| m.movie_id)
            .collect();

        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        // Cats is unrated and falls outside the 4-movie pool
        assert!(!first.contains(&2));

        let unique: BTreeSet<MovieId> = first.iter().copied().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_sample_to_rate_caps_at_pool() {
        let catalog = catalog();
        assert_eq!(catalog.sample_to_rate(50, 3, 1).len(), 3);
    }
}
