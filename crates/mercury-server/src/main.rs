use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use mercury_server::{AppStateInner, app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mercury_server=debug,mercury_db=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("MERCURY_DB_PATH").unwrap_or_else(|_| "mercury.db".into());
    let host = std::env::var("MERCURY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("MERCURY_PORT")
        .unwrap_or_else(|_| "8000".into())
        .parse()?;

    // Init database
    let db = mercury_db::Database::open(&PathBuf::from(&db_path))?;

    let state = Arc::new(AppStateInner { db });

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Mercury server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
