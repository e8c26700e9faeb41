use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use cliptide_api::state::{AppStateInner, AuthConfig};
use cliptide_api::storage::AssetStore;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cliptide=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let host = env_or("CLIPTIDE_HOST", "0.0.0.0");
    let port: u16 = env_or("CLIPTIDE_PORT", "3000").parse()?;
    let db_path = env_or("CLIPTIDE_DB_PATH", "cliptide.db");
    let asset_dir = env_or("CLIPTIDE_ASSET_DIR", "uploads");
    let auth = AuthConfig {
        access_secret: env_or("CLIPTIDE_ACCESS_TOKEN_SECRET", "dev-access-change-me"),
        refresh_secret: env_or("CLIPTIDE_REFRESH_TOKEN_SECRET", "dev-refresh-change-me"),
        access_ttl_secs: env_or("CLIPTIDE_ACCESS_TOKEN_TTL_SECS", "900").parse()?,
        refresh_ttl_secs: env_or("CLIPTIDE_REFRESH_TOKEN_TTL_SECS", "864000").parse()?,
    };

    // Init database and blob store
    let db = cliptide_db::Database::open(&PathBuf::from(&db_path))?;
    let assets = AssetStore::init(&PathBuf::from(&asset_dir)).await?;
    let asset_root = assets.dir().to_path_buf();

    let state = Arc::new(AppStateInner { db, assets, auth });

    let app = Router::new()
        .nest("/api/v1", cliptide_api::router(state))
        .nest_service("/assets", ServeDir::new(asset_root))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Cliptide server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
