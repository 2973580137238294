//! ftquery CLI
//!
//! Run with: cargo run -- <search|aggregate|decode> <file.json>
//!
//! - `search` / `aggregate`: read a request (`index`, `filter`, `options`)
//!   and print the compiled command without sending it
//! - `decode`: read a JSON-encoded reply and print the decoded rows
//!
//! Environment variables:
//! - FTQUERY_INDEX: Index used when the request names none
//! - FTQUERY_DEFAULT_LIMIT: Page size before any limit option (default: 10000)
//! - FTQUERY_POOL_BUFFERS: Idle compile buffers kept (default: 64)
//! - FTQUERY_POOL_CAPACITY: Largest buffer returned to the pool (default: 16384)
//! - RUST_LOG: Log level (default: info)

use ftquery::cli::{self, Action};
use ftquery::config::ClientConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout stays pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ftquery=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env()?;
    config.apply_pool_limits();

    let action = Action::parse(std::env::args().skip(1))?;
    tracing::debug!(?action, index = ?config.index, "running");

    let output = cli::run(&action, &config)?;
    println!("{}", output);
    Ok(())
}
