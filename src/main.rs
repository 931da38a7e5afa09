use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use reco_api::{
    create_router,
    db::{
        create_pool, create_redis_client, run_migrations, Cache, CacheWriterHandle,
        CachedMarketplaceStore, FallbackMarketplaceStore, InMemoryMarketplaceStore,
        MarketplaceStore, PgMarketplaceStore,
    },
    services::{PersonaClassifier, Pipeline, ScoringPolicy},
    AppState, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let policy = ScoringPolicy::default();
    let classifier = PersonaClassifier::from_paths(
        policy.classifier.clone(),
        &config.rules_path,
        &config.playbook_dir,
    );
    let pipeline = Pipeline::new(classifier, &policy)
        .with_max_recommendations(config.max_recommendations);
    tracing::info!(
        rules = pipeline.classifier().has_rules(),
        retrieval = pipeline.classifier().has_retriever(),
        "Persona classifier ready"
    );

    let (store, cache_handle) = build_store(&config).await?;
    tracing::info!(store = store.name(), "Marketplace store ready");

    let app = create_router(AppState::new(pipeline, store, config.seller_fetch_limit));

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!("Server running on http://{}", config.bind_address());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }

    Ok(())
}

/// Postgres, optionally behind Redis, with the sample catalog as fallback
async fn build_store(
    config: &Config,
) -> anyhow::Result<(Arc<dyn MarketplaceStore>, Option<CacheWriterHandle>)> {
    let sample: Arc<dyn MarketplaceStore> = Arc::new(InMemoryMarketplaceStore::with_sample_data());

    if config.use_sample_data {
        return Ok((sample, None));
    }

    let pool = match create_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(error = %e, "Database unavailable, serving sample data");
            return Ok((sample, None));
        }
    };
    run_migrations(&pool).await?;

    let mut primary: Arc<dyn MarketplaceStore> = Arc::new(PgMarketplaceStore::new(pool));
    let mut cache_handle = None;

    if let Some(redis_url) = &config.redis_url {
        let (cache, handle) = Cache::new(create_redis_client(redis_url)?).await;
        primary = Arc::new(CachedMarketplaceStore::new(
            primary,
            cache,
            config.cache_ttl_secs,
        ));
        cache_handle = Some(handle);
    }

    let store: Arc<dyn MarketplaceStore> =
        Arc::new(FallbackMarketplaceStore::new(primary, sample));
    Ok((store, cache_handle))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
