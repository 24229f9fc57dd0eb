//! Liveness endpoint for hosting platforms that probe an HTTP port.

mod routes;

pub use routes::{create_router, HEALTH_BODY};

use std::net::SocketAddr;

/// Serve the liveness router on `0.0.0.0:port` until the process exits.
pub async fn serve_health(port: u16) -> anyhow::Result<()> {
    let app = create_router();

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Health endpoint listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
