use dotenvy::dotenv;

use mysql_chat::config::AppConfig;
use mysql_chat::{cli, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    telemetry::init_tracing()?;

    let config = AppConfig::from_env()?;

    cli::run(config).await
}
