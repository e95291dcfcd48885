use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::services::PollPolicy;

/// Runtime configuration, collected from the environment once at startup
/// and handed to each component at construction time. Secrets never live
/// in source.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub upload_dir: PathBuf,
    pub results_dir: PathBuf,
    pub vision_endpoint: String,
    pub vision_key: String,
    pub openrouter_api_key: String,
    pub openrouter_model: String,
    pub ocr_poll: PollPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let vision_endpoint = env::var("AZURE_VISION_ENDPOINT")
            .context("AZURE_VISION_ENDPOINT must be set")?;
        let vision_key =
            env::var("AZURE_VISION_KEY").context("AZURE_VISION_KEY must be set")?;
        let openrouter_api_key =
            env::var("OPENROUTER_API_KEY").context("OPENROUTER_API_KEY must be set")?;

        let openrouter_model = env::var("OPENROUTER_MODEL")
            .unwrap_or_else(|_| "meta-llama/llama-4-scout:free".to_string());

        let defaults = PollPolicy::default();
        let ocr_poll = PollPolicy {
            max_attempts: parse_var("OCR_POLL_ATTEMPTS", defaults.max_attempts)?,
            interval: Duration::from_millis(parse_var(
                "OCR_POLL_INTERVAL_MS",
                defaults.interval.as_millis() as u64,
            )?),
        };

        Ok(Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            upload_dir: env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "uploads".to_string())
                .into(),
            results_dir: env::var("RESULTS_DIR")
                .unwrap_or_else(|_| "results".to_string())
                .into(),
            vision_endpoint,
            vision_key,
            openrouter_api_key,
            openrouter_model,
            ocr_poll,
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow!("{} must be a number, got '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}
