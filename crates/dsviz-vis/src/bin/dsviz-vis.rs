//! Data-structure visualizer server
//!
//! Start a session and serve the control API.

use dsviz_vis::{VisConfig, VisServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dsviz_vis=info,dsviz_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Usage: dsviz-vis [structure] [port]
    let config = VisConfig::from_env()?;

    println!("Data Structure Visualizer");
    println!("=========================");
    println!();
    println!("  Structure: {}", config.structure);
    println!("  Speed:     {}x", config.speed.multiplier());
    println!();
    println!("Starting visualization server on http://localhost:{}", config.port);
    println!();

    let server = VisServer::new(&config);
    server.serve(config.port).await?;

    Ok(())
}
