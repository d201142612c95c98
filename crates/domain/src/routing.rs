use std::collections::BTreeSet;

use loglake_core::{AccountId, AppError, AppResult, Region};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::resource::ResourceKind;

/// Custom event bus receiving forwarded events in the central region.
pub const INTAKE_BUS_NAME: &str = "log-enablement-bus";
/// Rule on the intake bus invoking the handler.
pub const INTAKE_RULE_NAME: &str = "LogEnablementTrigger";
/// Rule on the central region's default bus forwarding to the intake bus.
pub const LOCAL_FORWARDING_RULE_NAME: &str = "ForwardLoggingEventsToCustomBus";
/// Role used by the local forwarding rule.
pub const LOCAL_DELIVERY_ROLE_NAME: &str = "EventBridgeDefaultToCustomBus";
/// Execution role of the handler function.
pub const HANDLER_ROLE_NAME: &str = "EventDrivenLogEnablerRole";
/// Default handler function name.
pub const DEFAULT_HANDLER_FUNCTION_NAME: &str = "EventDrivenLogEnabler";
/// Detail type of audit-trail API call events.
pub const AUDIT_DETAIL_TYPE: &str = "AWS API Call via CloudTrail";

/// Selection predicate for routed audit events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPattern {
    /// Accepted event sources.
    pub sources: Vec<String>,
    /// Accepted detail types.
    pub detail_types: Vec<String>,
    /// Accepted API call names.
    pub event_names: Vec<String>,
}

impl EventPattern {
    /// Pattern matching the calls that enable logging on every supported resource kind.
    #[must_use]
    pub fn log_enablement() -> Self {
        Self {
            sources: ResourceKind::all()
                .iter()
                .map(|kind| kind.event_source().to_owned())
                .collect(),
            detail_types: vec![AUDIT_DETAIL_TYPE.to_owned()],
            event_names: ResourceKind::all()
                .iter()
                .map(|kind| kind.trigger_event_name().to_owned())
                .collect(),
        }
    }

    /// Returns whether an event with these attributes is selected.
    #[must_use]
    pub fn matches(&self, source: &str, detail_type: &str, event_name: &str) -> bool {
        self.sources.iter().any(|value| value == source)
            && self.detail_types.iter().any(|value| value == detail_type)
            && self.event_names.iter().any(|value| value == event_name)
    }

    /// Renders the pattern in the event router's JSON syntax.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "source": self.sources,
            "detail-type": self.detail_types,
            "detail": {
                "eventName": self.event_names,
            },
        })
    }
}

/// Hub-and-spoke routing layout read from the deployment document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTopology {
    central_region: Region,
    source_regions: Vec<Region>,
}

impl RoutingTopology {
    /// Creates a topology, de-duplicating source regions in first-seen order.
    pub fn new(central_region: Region, source_regions: Vec<Region>) -> AppResult<Self> {
        if source_regions.is_empty() {
            return Err(AppError::Validation(
                "source_regions must list at least one region".to_owned(),
            ));
        }

        let mut seen = BTreeSet::new();
        let source_regions = source_regions
            .into_iter()
            .filter(|region| seen.insert(region.clone()))
            .collect();

        Ok(Self {
            central_region,
            source_regions,
        })
    }

    /// Returns the region hosting the intake bus and handler.
    #[must_use]
    pub fn central_region(&self) -> &Region {
        &self.central_region
    }

    /// Returns the de-duplicated monitored regions.
    #[must_use]
    pub fn source_regions(&self) -> &[Region] {
        &self.source_regions
    }

    /// Returns monitored regions that need a cross-region forwarding rule.
    pub fn forwarding_regions(&self) -> impl Iterator<Item = &Region> + '_ {
        self.source_regions
            .iter()
            .filter(|region| **region != self.central_region)
    }
}

/// Returns the ARN of an event bus.
#[must_use]
pub fn event_bus_arn(region: &Region, account_id: &AccountId, bus_name: &str) -> String {
    format!("arn:aws:events:{region}:{account_id}:event-bus/{bus_name}")
}

/// Returns the ARN of a rule on a custom event bus.
#[must_use]
pub fn bus_rule_arn(
    region: &Region,
    account_id: &AccountId,
    bus_name: &str,
    rule_name: &str,
) -> String {
    format!("arn:aws:events:{region}:{account_id}:rule/{bus_name}/{rule_name}")
}

/// Returns the ARN of an identity role.
#[must_use]
pub fn role_arn(account_id: &AccountId, role_name: &str) -> String {
    format!("arn:aws:iam::{account_id}:role/{role_name}")
}

/// Returns the ARN of a compute function.
#[must_use]
pub fn function_arn(region: &Region, account_id: &AccountId, function_name: &str) -> String {
    format!("arn:aws:lambda:{region}:{account_id}:function:{function_name}")
}

/// Returns the name of the cross-region forwarding rule created in a source region.
#[must_use]
pub fn forwarding_rule_name(central_region: &Region) -> String {
    format!("ForwardLoggingEvents-to-{central_region}")
}

/// Returns the name of the delivery role used by a source region.
#[must_use]
pub fn cross_region_role_name(source_region: &Region) -> String {
    format!("EventBridgeCrossRegion-{source_region}")
}
