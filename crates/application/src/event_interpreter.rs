//! Turns audit-trail envelopes into log enablement descriptors.
//!
//! Every function here returns `None` for events that do not enable logging, including
//! envelopes whose payload does not have the expected shape.

use loglake_core::{AccountId, Region};
use loglake_domain::{
    Destination, LogEnablementDescriptor, LogEnablementDescriptorInput, LogVariant, ResourceKind,
    container_from_storage_arn, container_from_storage_host, resource_name_from_identifier,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

mod envelope;

pub use envelope::{AuditEventDetail, AuditEventEnvelope};

use envelope::{
    DistributionRequest, DistributionResponse, LoadBalancerRequest, LoadBalancerResponse,
    WebAclRequest,
};

const ACCESS_BUCKET_ATTRIBUTE: &str = "access_logs.s3.bucket";
const ACCESS_PREFIX_ATTRIBUTE: &str = "access_logs.s3.prefix";

/// Logging details extracted from one event before validation.
struct EnabledLogging {
    identity: String,
    reference: String,
    destination: Destination,
    variants: Vec<LogVariant>,
}

/// Deserializes a raw event and interprets it.
///
/// Malformed envelopes are logged and yield `None`.
#[must_use]
pub fn interpret_value(event: Value) -> Option<LogEnablementDescriptor> {
    match serde_json::from_value::<AuditEventEnvelope>(event) {
        Ok(envelope) => interpret(&envelope),
        Err(error) => {
            warn!(error = %error, "ignoring malformed audit event envelope");
            None
        }
    }
}

/// Interprets an audit event envelope.
#[must_use]
pub fn interpret(envelope: &AuditEventEnvelope) -> Option<LogEnablementDescriptor> {
    let detail = &envelope.detail;
    let Some(resource_kind) = ResourceKind::from_event_name(&detail.event_name) else {
        debug!(event_name = %detail.event_name, "event does not enable logging");
        return None;
    };

    let region = Region::new(detail.aws_region.as_str())
        .map_err(|error| warn!(error = %error, "audit event carries an invalid region"))
        .ok()?;
    let account_id = AccountId::new(detail.recipient_account_id.as_str())
        .map_err(|error| warn!(error = %error, "audit event carries an invalid account id"))
        .ok()?;

    let enabled = match resource_kind {
        ResourceKind::LoadBalancer => load_balancer_logging(detail),
        ResourceKind::WebFirewall => web_acl_logging(detail),
        ResourceKind::Distribution => distribution_logging(detail),
    }?;

    let descriptor = LogEnablementDescriptor::new(LogEnablementDescriptorInput {
        resource_kind,
        region,
        account_id,
        resource_identity: enabled.identity,
        resource_reference: enabled.reference,
        destination: enabled.destination,
        log_variants: enabled.variants,
    })
    .map_err(|error| warn!(error = %error, "audit event produced an invalid descriptor"))
    .ok()?;

    info!(
        resource_kind = %descriptor.resource_kind(),
        region = %descriptor.region(),
        resource = descriptor.resource_identity(),
        container = descriptor.destination().container(),
        prefix = descriptor.destination().prefix(),
        event_time = ?detail.event_time.or(envelope.time),
        "interpreted log enablement event"
    );

    Some(descriptor)
}

fn parse_section<T>(value: &Value, section: &str) -> Option<T>
where
    T: DeserializeOwned + Default,
{
    if value.is_null() {
        return Some(T::default());
    }

    T::deserialize(value)
        .map_err(|error| warn!(section, error = %error, "unexpected audit event payload shape"))
        .ok()
}

fn load_balancer_logging(detail: &AuditEventDetail) -> Option<EnabledLogging> {
    let request: LoadBalancerRequest =
        parse_section(&detail.request_parameters, "requestParameters")?;

    let variants: Vec<LogVariant> = ResourceKind::LoadBalancer
        .supported_variants()
        .iter()
        .copied()
        .filter(|variant| {
            variant
                .load_balancer_attribute_namespace()
                .is_some_and(|namespace| {
                    let key = format!("{namespace}.enabled");
                    request
                        .attributes
                        .iter()
                        .any(|attribute| attribute.key == key && attribute.value == "true")
                })
        })
        .collect();

    if variants.is_empty() {
        debug!("load balancer attribute change does not turn on logging");
        return None;
    }

    let Some(reference) = request.load_balancer_arn else {
        warn!("load balancer event is missing loadBalancerArn");
        return None;
    };
    let Some(identity) = resource_name_from_identifier(&reference) else {
        warn!(reference = %reference, "load balancer ARN has no name segment");
        return None;
    };

    let response: LoadBalancerResponse =
        parse_section(&detail.response_elements, "responseElements")?;
    let response_value = |key: &str| {
        response
            .attributes
            .iter()
            .find(|attribute| attribute.key == key)
            .map(|attribute| attribute.value.as_str())
    };

    let Some(container) = response_value(ACCESS_BUCKET_ATTRIBUTE).filter(|value| !value.is_empty())
    else {
        warn!(
            reference = %reference,
            "load balancer response does not name the access log container"
        );
        return None;
    };
    let prefix = response_value(ACCESS_PREFIX_ATTRIBUTE).unwrap_or_default();

    Some(EnabledLogging {
        identity: identity.to_owned(),
        destination: Destination::new(container, prefix).ok()?,
        reference,
        variants,
    })
}

fn web_acl_logging(detail: &AuditEventDetail) -> Option<EnabledLogging> {
    let request: WebAclRequest = parse_section(&detail.request_parameters, "requestParameters")?;
    let configuration = request.logging_configuration;

    let Some(first_destination) = configuration.log_destination_configs.first() else {
        debug!("web ACL logging configuration has no destinations");
        return None;
    };
    let Some(container) = container_from_storage_arn(first_destination) else {
        warn!(
            destination = %first_destination,
            "web ACL log destination is not a storage container"
        );
        return None;
    };

    let reference = configuration.resource_arn?;
    let Some(identity) = resource_name_from_identifier(&reference) else {
        warn!(reference = %reference, "web ACL ARN has no name segment");
        return None;
    };

    Some(EnabledLogging {
        identity: identity.to_owned(),
        destination: Destination::new(container, "").ok()?,
        reference,
        variants: vec![LogVariant::Standard],
    })
}

fn distribution_logging(detail: &AuditEventDetail) -> Option<EnabledLogging> {
    let request: DistributionRequest =
        parse_section(&detail.request_parameters, "requestParameters")?;
    let logging = request.distribution_config.logging;
    if !logging.enabled {
        debug!("distribution update leaves logging disabled");
        return None;
    }

    let response: DistributionResponse =
        parse_section(&detail.response_elements, "responseElements")?;
    let Some(distribution_id) = response
        .distribution
        .and_then(|distribution| distribution.id)
        .filter(|id| !id.is_empty())
    else {
        warn!("distribution response is missing the distribution id");
        return None;
    };

    let destination = Destination::new(container_from_storage_host(&logging.bucket), logging.prefix)
        .map_err(|error| warn!(error = %error, "distribution logging bucket is empty"))
        .ok()?;

    Some(EnabledLogging {
        identity: distribution_id.clone(),
        reference: distribution_id,
        destination,
        variants: vec![LogVariant::Standard],
    })
}
