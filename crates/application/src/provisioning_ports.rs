use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use async_trait::async_trait;
use loglake_core::{AppResult, Region};
use loglake_domain::PolicyDocument;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ensure::EnsurePresent;

/// Regional storage container receiving log records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageContainer {
    /// Region hosting the container.
    pub region: Region,
    /// Container name.
    pub name: String,
}

impl Display for StorageContainer {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "storage container {} ({})", self.name, self.region)
    }
}

/// Object ownership mode applied together with the log delivery ACL.
pub const LOG_DELIVERY_OBJECT_OWNERSHIP: &str = "BucketOwnerPreferred";
/// Canned ACL granting the log delivery group write access.
pub const LOG_DELIVERY_CANNED_ACL: &str = "log-delivery-write";

/// Access a log delivery service needs on a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccessGrant {
    /// Ownership override plus the log delivery canned ACL.
    LogDeliveryAcl {
        /// Object ownership mode.
        object_ownership: String,
        /// Canned ACL name.
        canned_acl: String,
    },
    /// Container resource policy.
    ResourcePolicy {
        /// Policy document.
        document: PolicyDocument,
    },
}

impl AccessGrant {
    /// Grant required by distributions delivering standard logs.
    #[must_use]
    pub fn log_delivery_acl() -> Self {
        Self::LogDeliveryAcl {
            object_ownership: LOG_DELIVERY_OBJECT_OWNERSHIP.to_owned(),
            canned_acl: LOG_DELIVERY_CANNED_ACL.to_owned(),
        }
    }
}

/// Access policy applied to a storage container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerAccessPolicy {
    /// Region hosting the container.
    pub region: Region,
    /// Container name.
    pub container: String,
    /// Requested grant.
    pub grant: AccessGrant,
}

impl Display for ContainerAccessPolicy {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let kind = match self.grant {
            AccessGrant::LogDeliveryAcl { .. } => "log delivery ACL",
            AccessGrant::ResourcePolicy { .. } => "resource policy",
        };
        write!(formatter, "{kind} on {} ({})", self.container, self.region)
    }
}

/// Regional catalog database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogDatabase {
    /// Region hosting the catalog.
    pub region: Region,
    /// Database name.
    pub name: String,
}

impl Display for CatalogDatabase {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "catalog database {} ({})", self.name, self.region)
    }
}

/// Port for catalog table lookups.
#[async_trait]
pub trait CatalogTables: Send + Sync {
    /// Returns whether `table` exists in `database`; the name is compared exactly.
    async fn table_exists(&self, region: &Region, database: &str, table: &str) -> AppResult<bool>;
}

/// Asynchronous catalog query submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryJobRequest {
    /// Statement to execute.
    pub query: String,
    /// Location for query results.
    pub output_location: String,
}

/// Lifecycle state of a submitted query job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum QueryJobStatus {
    /// Waiting for capacity.
    Queued,
    /// Executing.
    Running,
    /// Finished successfully.
    Succeeded,
    /// Finished with an error.
    Failed(String),
    /// Cancelled before completion.
    Cancelled,
}

/// Port for the regional query engine.
#[async_trait]
pub trait QueryJobs: Send + Sync {
    /// Submits a query and returns the job identifier.
    async fn start_query(&self, region: &Region, request: QueryJobRequest) -> AppResult<String>;

    /// Returns the status of a submitted job.
    async fn query_status(&self, region: &Region, job_id: &str) -> AppResult<QueryJobStatus>;
}

/// Key/value attribute of a load balancer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerAttribute {
    /// Attribute key, e.g. `access_logs.s3.enabled`.
    pub key: String,
    /// Attribute value.
    pub value: String,
}

impl LoadBalancerAttribute {
    /// Creates an attribute.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Standard logging block of a distribution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionLogging {
    /// Whether standard logging is on.
    pub enabled: bool,
    /// Whether cookies are included in log records.
    pub include_cookies: bool,
    /// Storage endpoint host, e.g. `bucket.s3.amazonaws.com`.
    pub bucket: String,
    /// Key prefix.
    pub prefix: String,
}

/// One origin of a distribution.
///
/// Origins served over a private network carry neither configuration shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionOrigin {
    /// Origin identifier.
    pub id: String,
    /// Custom (HTTP) origin configuration, if any.
    #[serde(default)]
    pub custom_origin_config: Option<Value>,
    /// Storage origin configuration, if any.
    #[serde(default)]
    pub s3_origin_config: Option<Value>,
}

impl DistributionOrigin {
    /// Returns whether the origin is reachable only through a private network.
    #[must_use]
    pub fn is_private_network_only(&self) -> bool {
        self.custom_origin_config.is_none() && self.s3_origin_config.is_none()
    }
}

/// Mutable configuration of a distribution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionConfig {
    /// Standard logging block.
    pub logging: DistributionLogging,
    /// Configured origins.
    pub origins: Vec<DistributionOrigin>,
}

/// Distribution configuration plus the version tag required to update it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedDistributionConfig {
    /// Current configuration.
    pub config: DistributionConfig,
    /// Optimistic concurrency tag.
    pub version_tag: String,
}

/// Port for the per-resource calls that turn log delivery on.
#[async_trait]
pub trait LogDeliveryPlatform: Send + Sync {
    /// Returns the attributes of a load balancer keyed by attribute name.
    async fn load_balancer_attributes(
        &self,
        region: &Region,
        load_balancer_arn: &str,
    ) -> AppResult<BTreeMap<String, String>>;

    /// Applies attribute changes to a load balancer.
    async fn modify_load_balancer_attributes(
        &self,
        region: &Region,
        load_balancer_arn: &str,
        attributes: Vec<LoadBalancerAttribute>,
    ) -> AppResult<()>;

    /// Returns the log destinations of a web ACL.
    ///
    /// Fails with `NotFound` when the web ACL has no logging configuration.
    async fn web_acl_log_destinations(
        &self,
        region: &Region,
        web_acl_arn: &str,
    ) -> AppResult<Vec<String>>;

    /// Replaces the log destinations of a web ACL.
    async fn put_web_acl_log_destinations(
        &self,
        region: &Region,
        web_acl_arn: &str,
        destinations: Vec<String>,
    ) -> AppResult<()>;

    /// Returns a distribution configuration.
    async fn distribution_config(&self, distribution_id: &str)
    -> AppResult<VersionedDistributionConfig>;

    /// Replaces a distribution configuration if `version_tag` is current.
    async fn update_distribution_config(
        &self,
        distribution_id: &str,
        config: DistributionConfig,
        version_tag: &str,
    ) -> AppResult<()>;
}

/// Platform capabilities used by the provisioning service.
#[derive(Clone)]
pub struct ProvisioningPorts {
    /// Storage containers.
    pub containers: Arc<dyn EnsurePresent<StorageContainer>>,
    /// Container access policies.
    pub access_policies: Arc<dyn EnsurePresent<ContainerAccessPolicy>>,
    /// Catalog databases.
    pub catalog_databases: Arc<dyn EnsurePresent<CatalogDatabase>>,
    /// Catalog table lookups.
    pub catalog_tables: Arc<dyn CatalogTables>,
    /// Query engine.
    pub query_jobs: Arc<dyn QueryJobs>,
    /// Per-resource log delivery settings.
    pub log_delivery: Arc<dyn LogDeliveryPlatform>,
}

impl ProvisioningPorts {
    /// Builds the port set from one adapter implementing every capability.
    #[must_use]
    pub fn from_platform<P>(platform: Arc<P>) -> Self
    where
        P: EnsurePresent<StorageContainer>
            + EnsurePresent<ContainerAccessPolicy>
            + EnsurePresent<CatalogDatabase>
            + CatalogTables
            + QueryJobs
            + LogDeliveryPlatform
            + 'static,
    {
        Self {
            containers: platform.clone(),
            access_policies: platform.clone(),
            catalog_databases: platform.clone(),
            catalog_tables: platform.clone(),
            query_jobs: platform.clone(),
            log_delivery: platform,
        }
    }
}
