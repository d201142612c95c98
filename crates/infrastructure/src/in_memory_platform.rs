use std::path::Path;
use std::sync::Arc;

use loglake_application::{
    DistributionConfig, DistributionOrigin, ProvisioningPorts, RoutingPorts,
    VersionedDistributionConfig,
};
use loglake_core::{AppError, AppResult, Region};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

mod provisioning;
mod routing;
mod state;

pub use state::{
    ContainerState, DatabaseState, LoadBalancerState, PlatformState, QueryJobState, TableState,
    WebAclState,
};

/// In-memory cloud platform implementing every provisioning and routing port.
///
/// State can be restored from and written to a JSON snapshot so separate process
/// invocations observe each other's changes.
#[derive(Debug, Default)]
pub struct InMemoryPlatform {
    state: RwLock<PlatformState>,
}

impl InMemoryPlatform {
    /// Creates an empty platform.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a platform from previously captured state.
    #[must_use]
    pub fn from_state(state: PlatformState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Loads a snapshot file, starting empty when the file does not exist.
    pub async fn load(path: &Path) -> AppResult<Self> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "state file not found, starting with empty platform");
                return Ok(Self::new());
            }
            Err(error) => {
                return Err(AppError::Internal(format!(
                    "failed to read state file '{}': {error}",
                    path.display()
                )));
            }
        };

        let state = serde_json::from_str::<PlatformState>(&contents).map_err(|error| {
            AppError::Validation(format!(
                "state file '{}' is not a valid platform snapshot: {error}",
                path.display()
            ))
        })?;
        debug!(path = %path.display(), "platform state loaded");

        Ok(Self::from_state(state))
    }

    /// Writes the current state to a snapshot file.
    pub async fn save(&self, path: &Path) -> AppResult<()> {
        let contents = serde_json::to_string_pretty(&self.snapshot().await).map_err(|error| {
            AppError::Internal(format!("failed to serialize platform state: {error}"))
        })?;

        tokio::fs::write(path, contents).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to write state file '{}': {error}",
                path.display()
            ))
        })?;
        debug!(path = %path.display(), "platform state saved");

        Ok(())
    }

    /// Returns a copy of the current state.
    pub async fn snapshot(&self) -> PlatformState {
        self.state.read().await.clone()
    }

    /// Registers a load balancer with no logging attributes.
    pub async fn register_load_balancer(&self, region: Region, arn: impl Into<String>) {
        self.state.write().await.load_balancers.insert(
            arn.into(),
            LoadBalancerState {
                region,
                attributes: Default::default(),
            },
        );
    }

    /// Registers a web ACL without a logging configuration.
    pub async fn register_web_acl(&self, region: Region, arn: impl Into<String>) {
        self.state.write().await.web_acls.insert(
            arn.into(),
            WebAclState {
                region,
                log_destinations: Vec::new(),
            },
        );
    }

    /// Registers a distribution with logging disabled.
    pub async fn register_distribution(
        &self,
        distribution_id: impl Into<String>,
        origins: Vec<DistributionOrigin>,
    ) {
        self.state.write().await.distributions.insert(
            distribution_id.into(),
            VersionedDistributionConfig {
                config: DistributionConfig {
                    logging: Default::default(),
                    origins,
                },
                version_tag: new_version_tag(),
            },
        );
    }
}

/// Port bundles backed by one shared platform.
pub fn platform_ports(platform: &Arc<InMemoryPlatform>) -> (ProvisioningPorts, RoutingPorts) {
    (
        ProvisioningPorts::from_platform(Arc::clone(platform)),
        RoutingPorts::from_platform(Arc::clone(platform)),
    )
}

fn new_version_tag() -> String {
    Uuid::new_v4().simple().to_string().to_uppercase()
}
