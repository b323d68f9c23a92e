use ndarray::{Array1, Array2, ArrayView2};
use std::collections::{BTreeSet, HashMap};

use crate::{
    catalog::CatalogStore,
    error::{AppError, AppResult},
    models::{is_valid_rating, MovieId, RatingRecord, UserId},
};

/// Marks a (user, movie) cell nobody rated.
///
/// A rating of 0 means "watched, disliked" and must stay distinguishable.
pub const UNRATED: f64 = f64::NAN;

/// Returns true when a matrix cell holds an actual rating
#[inline]
pub fn is_rated(value: f64) -> bool {
    !value.is_nan()
}

/// Users × movies matrix of historical ratings
///
/// Columns cover every catalog movie in ascending id order, so every
/// recommendable movie has a column even if nobody rated it. Built once at
/// startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RatingMatrix {
    values: Array2<f64>,
    user_ids: Vec<UserId>,
    item_ids: Vec<MovieId>,
    user_index: HashMap<UserId, usize>,
    item_index: HashMap<MovieId, usize>,
}

impl RatingMatrix {
    /// Builds the matrix from the historical rating records
    ///
    /// Fails with `DataIntegrity` on out-of-range ratings, repeated
    /// (user, movie) pairs, and movies the catalog does not know.
    pub fn build(catalog: &CatalogStore, ratings: &[RatingRecord]) -> AppResult<Self> {
        let item_ids: Vec<MovieId> = catalog.all_ids().into_iter().collect();
        let user_ids: Vec<UserId> = ratings
            .iter()
            .map(|r| r.user_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let item_index: HashMap<MovieId, usize> = item_ids
            .iter()
            .enumerate()
            .map(|(idx, &id)| (id, idx))
            .collect();
        let user_index: HashMap<UserId, usize> = user_ids
            .iter()
            .enumerate()
            .map(|(idx, &id)| (id, idx))
            .collect();

        let mut values = Array2::from_elem((user_ids.len(), item_ids.len()), UNRATED);

        for record in ratings {
            if !is_valid_rating(record.rating) {
                return Err(AppError::DataIntegrity(format!(
                    "rating {} by user {} for movie {} is outside [0, 5]",
                    record.rating, record.user_id, record.movie_id
                )));
            }

            let col = *item_index.get(&record.movie_id).ok_or_else(|| {
                AppError::DataIntegrity(format!(
                    "rating by user {} references movie {} missing from catalog",
                    record.user_id, record.movie_id
                ))
            })?;
            let row = user_index[&record.user_id];

            let cell = &mut values[[row, col]];
            if is_rated(*cell) {
                return Err(AppError::DataIntegrity(format!(
                    "user {} rated movie {} more than once",
                    record.user_id, record.movie_id
                )));
            }
            *cell = record.rating;
        }

        let cells = user_ids.len() * item_ids.len();
        let density = if cells == 0 {
            0.0
        } else {
            ratings.len() as f64 / cells as f64
        };
        tracing::info!(
            users = user_ids.len(),
            movies = item_ids.len(),
            ratings = ratings.len(),
            density,
            "Rating matrix built"
        );

        Ok(Self {
            values,
            user_ids,
            item_ids,
            user_index,
            item_index,
        })
    }

    pub fn n_users(&self) -> usize {
        self.user_ids.len()
    }

    pub fn n_items(&self) -> usize {
        self.item_ids.len()
    }

    /// Movie id of every column, ascending
    pub fn item_ids(&self) -> &[MovieId] {
        &self.item_ids
    }

    /// User id of every row, ascending
    pub fn user_ids(&self) -> &[UserId] {
        &self.user_ids
    }

    pub fn column_of(&self, movie_id: MovieId) -> Option<usize> {
        self.item_index.get(&movie_id).copied()
    }

    pub fn row_of(&self, user_id: UserId) -> Option<usize> {
        self.user_index.get(&user_id).copied()
    }

    /// Rating column of a movie across all users, unrated cells read as 0
    pub fn vector_for(&self, movie_id: MovieId) -> AppResult<Array1<f64>> {
        let col = self
            .column_of(movie_id)
            .ok_or(AppError::UnknownItem(movie_id))?;

        Ok(self
            .values
            .column(col)
            .mapv(|v| if is_rated(v) { v } else { 0.0 }))
    }

    /// Raw matrix, with `UNRATED` in every empty cell
    pub fn as_dense(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// 1.0 where a rating is known, 0.0 elsewhere
    pub fn known_mask(&self) -> Array2<f64> {
        self.values.mapv(|v| if is_rated(v) { 1.0 } else { 0.0 })
    }

    /// Matrix with unrated cells replaced by 0
    pub fn filled(&self) -> Array2<f64> {
        self.values.mapv(|v| if is_rated(v) { v } else { 0.0 })
    }

    /// Known ratings of one historical user, ascending by movie id
    pub fn user_ratings(&self, user_id: UserId) -> Option<Vec<(MovieId, f64)>> {
        let row = self.row_of(user_id)?;
        Some(
            self.values
                .row(row)
                .iter()
                .zip(&self.item_ids)
                .filter(|(v, _)| is_rated(**v))
                .map(|(&v, &id)| (id, v))
                .collect(),
        )
    }

    pub fn rating_count(&self) -> usize {
        self.values.iter().filter(|v| is_rated(**v)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Movie;

    fn catalog() -> CatalogStore {
        CatalogStore::new((1..=4).map(|id| Movie::new(id * 10, format!("Movie {}", id)))).unwrap()
    }

    fn ratings() -> Vec<RatingRecord> {
        vec![
            RatingRecord::new(7, 10, 5.0),
            RatingRecord::new(7, 30, 0.0),
            RatingRecord::new(3, 10, 4.0),
            RatingRecord::new(3, 20, 2.5),
        ]
    }

    #[test]
    fn test_build_shapes_and_order() {
        let matrix = RatingMatrix::build(&catalog(), &ratings()).unwrap();
        assert_eq!(matrix.n_users(), 2);
        assert_eq!(matrix.n_items(), 4);
        assert_eq!(matrix.user_ids(), &[3, 7]);
        assert_eq!(matrix.item_ids(), &[10, 20, 30, 40]);
        assert_eq!(matrix.rating_count(), 4);
    }

    #[test]
    fn test_zero_rating_is_not_unrated() {
        let matrix = RatingMatrix::build(&catalog(), &ratings()).unwrap();
        let dense = matrix.as_dense();
        let row = matrix.row_of(7).unwrap();

        assert_eq!(dense[[row, matrix.column_of(30).unwrap()]], 0.0);
        assert!(!is_rated(dense[[row, matrix.column_of(20).unwrap()]]));

        let mask = matrix.known_mask();
        assert_eq!(mask[[row, matrix.column_of(30).unwrap()]], 1.0);
        assert_eq!(mask[[row, matrix.column_of(20).unwrap()]], 0.0);
    }

    #[test]
    fn test_vector_for_fills_unrated_with_zero() {
        let matrix = RatingMatrix::build(&catalog(), &ratings()).unwrap();
        assert_eq!(matrix.vector_for(10).unwrap().to_vec(), vec![4.0, 5.0]);
        assert_eq!(matrix.vector_for(40).unwrap().to_vec(), vec![0.0, 0.0]);
        assert!(matches!(
            matrix.vector_for(99),
            Err(AppError::UnknownItem(99))
        ));
    }

    #[test]
    fn test_user_ratings() {
        let matrix = RatingMatrix::build(&catalog(), &ratings()).unwrap();
        assert_eq!(
            matrix.user_ratings(7).unwrap(),
            vec![(10, 5.0), (30, 0.0)]
        );
        assert!(matrix.user_ratings(99).is_none());
    }

    #[test]
    fn test_out_of_range_rating_rejected() {
        let mut bad = ratings();
        bad.push(RatingRecord::new(1, 20, 6.0));
        assert!(matches!(
            RatingMatrix::build(&catalog(), &bad),
            Err(AppError::DataIntegrity(_))
        ));
    }

    #[test]
    fn test_duplicate_rating_rejected() {
        let mut bad = ratings();
        bad.push(RatingRecord::new(3, 20, 1.0));
        assert!(matches!(
            RatingMatrix::build(&catalog(), &bad),
            Err(AppError::DataIntegrity(_))
        ));
    }

    #[test]
    fn test_unknown_movie_rejected() {
        let mut bad = ratings();
        bad.push(RatingRecord::new(3, 55, 1.0));
        assert!(matches!(
            RatingMatrix::build(&catalog(), &bad),
            Err(AppError::DataIntegrity(_))
        ));
    }
}
