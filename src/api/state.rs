use std::sync::Arc;

use crate::{catalog::CatalogStore, config::Config, services::Recommender};

/// Request-level defaults exposed through the HTTP surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiSettings {
    /// k used when a request omits it
    pub default_recommendations: usize,
    /// Size of the top rated pool the rating prompt samples from
    pub rate_pool_size: usize,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            default_recommendations: 5,
            rate_pool_size: 100,
        }
    }
}

impl From<&Config> for ApiSettings {
    fn from(config: &Config) -> Self {
        Self {
            default_recommendations: config.default_recommendations,
            rate_pool_size: config.rate_pool_size,
        }
    }
}

/// Shared application state
///
/// Everything here is read-only after startup, so handlers share it without
/// locking.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogStore>,
    pub recommender: Arc<Recommender>,
    pub settings: ApiSettings,
}

impl AppState {
    /// Creates the state around an already built engine
    pub fn new(recommender: Recommender, settings: ApiSettings) -> Self {
        Self {
            catalog: recommender.shared_catalog(),
            recommender: Arc::new(recommender),
            settings,
        }
    }
}
