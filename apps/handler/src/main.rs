//! Loglake event handler runtime.
//!
//! Reads one routed audit event (from the path given as the first argument, or
//! stdin), provisions its log pipeline against the platform state file and prints
//! the invocation response as JSON.

#![forbid(unsafe_code)]

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use loglake_application::{LogEnablementHandler, ProvisioningService, RetryPolicy};
use loglake_core::{AppError, AppResult};
use loglake_infrastructure::{InMemoryPlatform, platform_ports};
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct HandlerConfig {
    state_file: PathBuf,
    retry_max_attempts: u8,
    retry_backoff_ms: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = HandlerConfig::load()?;
    let event = read_event(env::args().nth(1)).await?;

    let platform = Arc::new(InMemoryPlatform::load(&config.state_file).await?);
    let (provisioning_ports, _) = platform_ports(&platform);
    let handler = LogEnablementHandler::new(ProvisioningService::new(
        provisioning_ports,
        RetryPolicy::new(config.retry_max_attempts, config.retry_backoff_ms),
    ));

    let response = handler.handle(event).await;
    platform.save(&config.state_file).await?;

    info!(
        status_code = response.status_code,
        state_file = %config.state_file.display(),
        "event handled"
    );

    let rendered = serde_json::to_string(&response)
        .map_err(|error| AppError::Internal(format!("failed to render response: {error}")))?;
    println!("{rendered}");

    Ok(())
}

impl HandlerConfig {
    fn load() -> AppResult<Self> {
        let state_file = env::var("LOGLAKE_STATE_FILE")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "loglake-state.json".to_owned());
        let retry_max_attempts = parse_env_u8("LOGLAKE_RETRY_MAX_ATTEMPTS", 5)?;
        let retry_backoff_ms = parse_env_u64("LOGLAKE_RETRY_BACKOFF_MS", 500)?;

        if retry_max_attempts == 0 {
            return Err(AppError::Validation(
                "LOGLAKE_RETRY_MAX_ATTEMPTS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            state_file: PathBuf::from(state_file),
            retry_max_attempts,
            retry_backoff_ms,
        })
    }
}

async fn read_event(path: Option<String>) -> AppResult<Value> {
    let contents = match path {
        Some(path) => tokio::fs::read_to_string(&path).await.map_err(|error| {
            AppError::Validation(format!("failed to read event file '{path}': {error}"))
        })?,
        None => {
            let mut contents = String::new();
            tokio::io::stdin()
                .read_to_string(&mut contents)
                .await
                .map_err(|error| AppError::Internal(format!("failed to read stdin: {error}")))?;
            contents
        }
    };

    serde_json::from_str(&contents)
        .map_err(|error| AppError::Validation(format!("event is not valid JSON: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn parse_env_u8(name: &str, default: u8) -> AppResult<u8> {
    match env::var(name) {
        Ok(value) => value.parse::<u8>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
