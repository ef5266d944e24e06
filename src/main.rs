use sheet_crm::{Config, app};

/// Entry point: read configuration, then serve the API.
///
/// Configuration comes from the environment exactly once, here; a missing
/// value aborts startup instead of surfacing as per-request errors.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = Config::from_env()?;
    app::run(config).await
}
