use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Audit-trail event as delivered by the event router.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuditEventEnvelope {
    /// Emitting service, e.g. `aws.wafv2`.
    #[serde(default)]
    pub source: Option<String>,
    /// Router detail type.
    #[serde(rename = "detail-type", default)]
    pub detail_type: Option<String>,
    /// Router delivery time.
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    /// Audit record of the API call.
    pub detail: AuditEventDetail,
}

/// API call record carried by an [`AuditEventEnvelope`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEventDetail {
    /// Name of the API call.
    pub event_name: String,
    /// Region the call was made in.
    pub aws_region: String,
    /// Account owning the resource.
    pub recipient_account_id: String,
    /// Time of the call.
    #[serde(default)]
    pub event_time: Option<DateTime<Utc>>,
    /// Call parameters, shape depends on `event_name`.
    #[serde(default)]
    pub request_parameters: Value,
    /// Call response, shape depends on `event_name`.
    #[serde(default)]
    pub response_elements: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LoadBalancerRequest {
    #[serde(default)]
    pub load_balancer_arn: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct LoadBalancerResponse {
    #[serde(default)]
    pub attributes: Vec<AttributeEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct AttributeEntry {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WebAclRequest {
    #[serde(default)]
    pub logging_configuration: WebAclLoggingConfiguration,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WebAclLoggingConfiguration {
    #[serde(default)]
    pub resource_arn: Option<String>,
    #[serde(default)]
    pub log_destination_configs: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DistributionRequest {
    #[serde(default)]
    pub distribution_config: DistributionConfigRequest,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct DistributionConfigRequest {
    #[serde(default)]
    pub logging: DistributionLoggingRequest,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DistributionLoggingRequest {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub prefix: String,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct DistributionResponse {
    #[serde(default)]
    pub distribution: Option<DistributionSummary>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct DistributionSummary {
    #[serde(default)]
    pub id: Option<String>,
}
