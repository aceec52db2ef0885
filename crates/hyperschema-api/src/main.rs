//! # hyperschema-server: Binary Entry Point
//!
//! Serves the schema resource for a schema directory.
//! Binds to configurable port (default 8080).

use hyperschema_api::HyperMedia;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let hypermedia = HyperMedia::from_env();
    tracing::info!(
        schema_path = %hypermedia.store().schema_path().display(),
        schema_uri = %hypermedia.config().schema_uri,
        cache_capacity = hypermedia.store().cache_capacity(),
        "schema store configured"
    );

    let app = hyperschema_api::app(hypermedia);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("hyperschema listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
