use serde::Deserialize;

use crate::services::{FactorizationConfig, Similarity};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Movie catalog CSV
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Historical ratings CSV (user_id,movie_id,rating)
    #[serde(default = "default_ratings_path")]
    pub ratings_path: String,

    /// Item similarity for the neighborhood estimator (cosine or pearson)
    #[serde(default)]
    pub similarity: Similarity,

    /// Latent dimension of the factorization model
    #[serde(default = "default_nmf_rank")]
    pub nmf_rank: usize,

    /// Update rounds for the factorization fit
    #[serde(default = "default_nmf_iterations")]
    pub nmf_iterations: usize,

    /// Seed for the factorization initialisation
    #[serde(default = "default_nmf_seed")]
    pub nmf_seed: u64,

    /// Update rounds when projecting a query
    #[serde(default = "default_projection_iterations")]
    pub projection_iterations: usize,

    /// k used when a request does not name one
    #[serde(default = "default_recommendations")]
    pub default_recommendations: usize,

    /// How many top rated movies the rating prompt samples from
    #[serde(default = "default_rate_pool_size")]
    pub rate_pool_size: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_catalog_path() -> String {
    "./data/movies_imdb.csv".to_string()
}

fn default_ratings_path() -> String {
    "./data/ratings.csv".to_string()
}

fn default_nmf_rank() -> usize {
    8
}

fn default_nmf_iterations() -> usize {
    300
}

fn default_nmf_seed() -> u64 {
    42
}

fn default_projection_iterations() -> usize {
    500
}

fn default_recommendations() -> usize {
    5
}

fn default_rate_pool_size() -> usize {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            catalog_path: default_catalog_path(),
            ratings_path: default_ratings_path(),
            similarity: Similarity::default(),
            nmf_rank: default_nmf_rank(),
            nmf_iterations: default_nmf_iterations(),
            nmf_seed: default_nmf_seed(),
            projection_iterations: default_projection_iterations(),
            default_recommendations: default_recommendations(),
            rate_pool_size: default_rate_pool_size(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from explicit key/value pairs
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        if config.default_recommendations == 0 {
            anyhow::bail!("DEFAULT_RECOMMENDATIONS must be at least 1");
        }

        Ok(config)
    }

    /// Factorization settings derived from this config
    pub fn factorization(&self) -> FactorizationConfig {
        FactorizationConfig {
            rank: self.nmf_rank,
            iterations: self.nmf_iterations,
            projection_iterations: self.projection_iterations,
            seed: self.nmf_seed,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(Vec::new()).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.catalog_path, "./data/movies_imdb.csv");
        assert_eq!(config.similarity, Similarity::Cosine);
        assert_eq!(config.factorization(), FactorizationConfig::default());
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_vars(vars(&[
            ("PORT", "8080"),
            ("NMF_RANK", "4"),
            ("NMF_SEED", "9"),
            ("SIMILARITY", "pearson"),
            ("RATINGS_PATH", "/tmp/r.csv"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.ratings_path, "/tmp/r.csv");
        assert_eq!(config.similarity, Similarity::Pearson);
        let factorization = config.factorization();
        assert_eq!(factorization.rank, 4);
        assert_eq!(factorization.seed, 9);
    }

    #[test]
    fn test_invalid_number_rejected() {
        assert!(Config::from_vars(vars(&[("PORT", "not-a-port")])).is_err());
    }

    #[test]
    fn test_zero_default_recommendations_rejected() {
        assert!(Config::from_vars(vars(&[("DEFAULT_RECOMMENDATIONS", "0")])).is_err());
    }
}
