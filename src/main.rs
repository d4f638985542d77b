use anyhow::Result;
use tracing::{info, warn};

use scentmatch::app::{app_api_loop, AppState};
use scentmatch::environment::Config;
use scentmatch::logging::configure_logging;

#[tokio::main]
async fn main() -> Result<()> {
    configure_logging();

    let config = Config::from_env();
    info!(
        "Starting {} {} (model {}, database {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.model,
        config.database_path.display()
    );

    if !config.database_path.exists() {
        warn!(
            "Perfume database {} does not exist yet, every analysis will report it as missing",
            config.database_path.display()
        );
    }

    let state = AppState::new(config);
    app_api_loop(state).await
}
