use std::env;
use std::path::{Path, PathBuf};

use loglake_application::{DistributionOrigin, HandlerDeployment, RetryPolicy};
use loglake_core::{AccountId, AppError, AppResult, Region};
use loglake_domain::RoutingTopology;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Process configuration read from the environment.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub account_id: AccountId,
    pub state_file: PathBuf,
    pub retry: RetryPolicy,
}

impl AdminConfig {
    pub fn load() -> AppResult<Self> {
        let account_id = AccountId::new(required_env("LOGLAKE_ACCOUNT_ID")?)
            .map_err(|error| error.context("LOGLAKE_ACCOUNT_ID"))?;
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
            account_id,
            state_file: PathBuf::from(state_file),
            retry: RetryPolicy::new(retry_max_attempts, retry_backoff_ms),
        })
    }
}

/// Deployment document for the routing topology.
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentDocument {
    pub central_region: Region,
    pub source_regions: Vec<Region>,
    #[serde(default)]
    pub handler_function_name: Option<String>,
    pub handler_artifact: String,
}

impl DeploymentDocument {
    pub fn topology(&self) -> AppResult<RoutingTopology> {
        RoutingTopology::new(self.central_region.clone(), self.source_regions.clone())
    }

    pub fn handler(&self) -> AppResult<HandlerDeployment> {
        if self.handler_artifact.trim().is_empty() {
            return Err(AppError::Validation(
                "handler_artifact must not be empty".to_owned(),
            ));
        }

        let function_name = self
            .handler_function_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned);

        Ok(HandlerDeployment::new(
            function_name,
            self.handler_artifact.trim(),
        ))
    }
}

/// Resources known to the platform before enrollment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InventoryDocument {
    pub load_balancers: Vec<String>,
    pub web_acls: Vec<String>,
    pub distributions: Vec<DistributionInventory>,
}

/// Distribution and its origins.
#[derive(Debug, Clone, Deserialize)]
pub struct DistributionInventory {
    pub id: String,
    #[serde(default)]
    pub origins: Vec<DistributionOrigin>,
}

pub async fn read_document<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let contents = tokio::fs::read_to_string(path).await.map_err(|error| {
        AppError::Validation(format!("failed to read '{}': {error}", path.display()))
    })?;

    parse_document(&contents).map_err(|error| error.context(path.display()))
}

pub fn parse_document<T: DeserializeOwned>(contents: &str) -> AppResult<T> {
    serde_yaml::from_str(contents)
        .map_err(|error| AppError::Validation(format!("invalid document: {error}")))
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
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
