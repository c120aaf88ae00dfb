use anyhow::Result;
use tokenward::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; real deployments use the environment directly
    dotenvy::dotenv().ok();

    let action = cli::start()?;

    let result = action.execute().await;

    cli::telemetry::shutdown_tracer();

    result
}
