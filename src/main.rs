//! Storefront Catalog - admin catalog service

use anyhow::Result;
use std::sync::Arc;
use storefront_catalog::{
    api::{self, AppState},
    config::AppConfig,
    media::{CloudinaryImageStore, ImageStore, InMemoryImageStore},
    store::{memory::InMemoryDocumentStore, postgres::PgDocumentStore, DocumentStore},
    Catalog,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = AppConfig::from_env()?;

    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(url) => {
            let pg = PgDocumentStore::connect(url, config.max_connections).await?;
            pg.migrate().await?;
            Arc::new(pg)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, documents are kept in memory");
            Arc::new(InMemoryDocumentStore::new())
        }
    };
    let images: Arc<dyn ImageStore> = match config.cloudinary.clone() {
        Some(cloudinary) => Arc::new(CloudinaryImageStore::new(cloudinary)),
        None => {
            tracing::warn!("Cloudinary not configured, images are kept in memory");
            Arc::new(InMemoryImageStore::new())
        }
    };
    let nats = match &config.nats_url {
        Some(url) => async_nats::connect(url.as_str()).await.map_err(|e| tracing::warn!(error = %e, "NATS unavailable, events are not published")).ok(),
        None => None,
    };

    let state = AppState { catalog: Catalog::new(store, images), nats, vnpay: config.vnpay.clone() };
    let app = api::router(state);

    tracing::info!("🚀 Storefront Catalog listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?, app).await?;
    Ok(())
}
