use std::env;
use std::sync::Arc;

use handwave::pose::{self, PoseStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    handwave::init_logger!();

    let db = env::var("HANDWAVE_POSE_DB").unwrap_or_else(|_| "poses.db".to_string());
    let port = match env::var("HANDWAVE_POSE_PORT") {
        Ok(port) => port.parse()?,
        Err(_) => pose::DEFAULT_PORT,
    };

    let store = Arc::new(PoseStore::open(&db)?);
    let app = pose::router(store);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    log::info!("pose server running on port {port}, storing to {db}");
    axum::serve(listener, app).await?;
    Ok(())
}
