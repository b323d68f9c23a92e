pub mod estimator;
pub mod factorization;
pub mod neighborhood;
pub mod rating_matrix;
pub mod recommender;

pub use estimator::Estimator;
pub use factorization::{FactorizationConfig, FactorizationEstimator, NmfModel};
pub use neighborhood::{NeighborhoodEstimator, Similarity};
pub use rating_matrix::RatingMatrix;
pub use recommender::Recommender;
