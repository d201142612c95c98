use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use loglake_application::{
    BusPolicy, DeliveryRole, EventBus, HandlerFunction, InvokePermission, QueryJobStatus,
    RoutingRule, VersionedDistributionConfig,
};
use loglake_core::Region;
use loglake_domain::PolicyDocument;
use serde::{Deserialize, Serialize};

/// Serializable platform state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformState {
    /// Storage containers by name.
    pub containers: BTreeMap<String, ContainerState>,
    /// Catalog databases keyed by region, then database name.
    pub catalogs: BTreeMap<String, BTreeMap<String, DatabaseState>>,
    /// Submitted query jobs by id.
    pub query_jobs: BTreeMap<String, QueryJobState>,
    /// Load balancers by ARN.
    pub load_balancers: BTreeMap<String, LoadBalancerState>,
    /// Web ACLs by ARN.
    pub web_acls: BTreeMap<String, WebAclState>,
    /// Distributions by id.
    pub distributions: BTreeMap<String, VersionedDistributionConfig>,
    /// Identity roles by name.
    pub roles: BTreeMap<String, DeliveryRole>,
    /// Functions keyed by `region/name`.
    pub functions: BTreeMap<String, HandlerFunction>,
    /// Event buses keyed by `region/name`.
    pub buses: BTreeMap<String, EventBus>,
    /// Bus policies keyed by `region/bus`.
    pub bus_policies: BTreeMap<String, BusPolicy>,
    /// Rules keyed by `region/bus/name`.
    pub rules: BTreeMap<String, RoutingRule>,
    /// Invoke permissions keyed by `region/function/statement`.
    pub invoke_permissions: BTreeMap<String, InvokePermission>,
}

/// Storage container with its access settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerState {
    /// Hosting region.
    pub region: Region,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Object ownership mode, when overridden.
    #[serde(default)]
    pub object_ownership: Option<String>,
    /// Canned ACL, when applied.
    #[serde(default)]
    pub canned_acl: Option<String>,
    /// Resource policy, when attached.
    #[serde(default)]
    pub policy: Option<PolicyDocument>,
}

/// Catalog database and its tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseState {
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Tables by lower-cased name.
    #[serde(default)]
    pub tables: BTreeMap<String, TableState>,
}

/// Catalog table created by a DDL statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableState {
    /// Statement that created the table.
    pub ddl: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Submitted query job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryJobState {
    /// Region the job ran in.
    pub region: Region,
    /// Statement text.
    pub query: String,
    /// Result location.
    pub output_location: String,
    /// Final status.
    pub status: QueryJobStatus,
    /// Submission time.
    pub submitted_at: DateTime<Utc>,
}

/// Load balancer and its attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadBalancerState {
    /// Hosting region.
    pub region: Region,
    /// Attribute values by key.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// Web ACL and its logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebAclState {
    /// Hosting region.
    pub region: Region,
    /// Log destination ARNs; empty when logging is not configured.
    #[serde(default)]
    pub log_destinations: Vec<String>,
}
