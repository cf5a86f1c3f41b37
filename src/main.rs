//! hellod - A Minimal Concurrent Greeting Server
//!
//! Entry point. Port and worker count are fixed; there are no flags.

use hellod::{Server, ServerConfig};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> anyhow::Result<()> {
    // Set up logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    info!("hellod v{}", hellod::VERSION);

    let config = ServerConfig::default();
    let server = match Server::new(config) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "Failed to start server");
            return Err(e.into());
        }
    };

    server.run();
    Ok(())
}
