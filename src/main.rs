use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use movie_recommender::{
    api::{create_router, ApiSettings, AppState},
    catalog::{load_catalog, load_ratings, CatalogStore},
    config::Config,
    services::Recommender,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movie_recommender=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // Load data and fit models before accepting traffic
    let movies = load_catalog(&config.catalog_path)?;
    let ratings = load_ratings(&config.ratings_path)?;
    let catalog = Arc::new(CatalogStore::new(movies)?);

    let similarity = config.similarity;
    let factorization = config.factorization();
    let recommender = tokio::task::spawn_blocking(move || {
        Recommender::build(catalog, &ratings, similarity, &factorization)
    })
    .await??;

    let state = AppState::new(recommender, ApiSettings::from(&config));
    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
