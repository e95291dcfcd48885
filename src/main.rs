mod analysis;
mod config;
mod handlers;
mod models;
mod server;
mod services;

use std::sync::Arc;

use anyhow::Result;
use dotenv::dotenv;

use config::AppConfig;
use handlers::AnalysisHandler;
use server::{create_router, AppState};
use services::{AzureVisionClient, OpenRouterClient, ResultStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    // Load environment variables
    dotenv().ok();

    log::info!("🚀 Starting FoodHack analysis backend...");

    let config = AppConfig::from_env()?;

    std::fs::create_dir_all(&config.upload_dir)?;
    log::info!("✅ Upload directory ready: {}", config.upload_dir.display());

    let vision = Arc::new(AzureVisionClient::new(
        config.vision_endpoint.clone(),
        config.vision_key.clone(),
        config.ocr_poll,
    ));
    log::info!("✅ Vision service initialized");

    let llm = Arc::new(OpenRouterClient::new(
        config.openrouter_api_key.clone(),
        config.openrouter_model.clone(),
    ));
    log::info!(
        "✅ OpenRouter service initialized with model: {}",
        config.openrouter_model
    );

    let handler = AnalysisHandler::new(vision, llm, ResultStore::new(&config.results_dir));
    log::info!("✅ Analysis handler initialized");

    let state = Arc::new(AppState {
        handler,
        upload_dir: config.upload_dir.clone(),
    });
    let app = create_router(state);

    log::info!("🌐 Server listening on http://{}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
