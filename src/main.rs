// --- Servicio de auditoría de requisitos - Archivo principal ---

use degreeaudit::config::AppConfig;
use degreeaudit::run_server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = AppConfig::from_env();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    run_server(config).await
}
