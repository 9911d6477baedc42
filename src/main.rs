use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use marquee_api::{
    create_router,
    services::{
        providers::{OpenAiCompletion, TmdbCatalog},
        CatalogProvider, RecommendationService,
    },
    AppState, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let catalog: Arc<dyn CatalogProvider> = Arc::new(TmdbCatalog::new(
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
    ));
    let completion = Arc::new(OpenAiCompletion::new(
        config.openai_api_key.clone(),
        config.openai_api_url.clone(),
        config.openai_model.clone(),
    ));
    let recommender =
        RecommendationService::new(catalog.clone(), completion, config.pipeline_settings());

    let app = create_router(Arc::new(AppState::new(catalog, recommender)));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        address = %address,
        model = %config.openai_model,
        "Server listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
