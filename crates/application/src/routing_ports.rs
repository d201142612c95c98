use std::fmt::{Display, Formatter};
use std::sync::Arc;

use loglake_core::Region;
use loglake_domain::{EventPattern, PolicyDocument};
use serde::{Deserialize, Serialize};

use crate::ensure::EnsurePresent;

/// Identity role with a trust policy and one inline permission policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRole {
    /// Role name; roles are account-global.
    pub name: String,
    /// Service principal allowed to assume the role.
    pub trust: PolicyDocument,
    /// Inline permissions.
    pub permissions: PolicyDocument,
}

impl Display for DeliveryRole {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "role {}", self.name)
    }
}

/// Compute function running the event handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerFunction {
    /// Region hosting the function.
    pub region: Region,
    /// Function name.
    pub name: String,
    /// Execution role ARN.
    pub role_arn: String,
    /// Opaque code artifact reference.
    pub artifact: String,
    /// Invocation timeout.
    pub timeout_seconds: u32,
    /// Memory allocation.
    pub memory_mb: u32,
}

impl Display for HandlerFunction {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "function {} ({})", self.name, self.region)
    }
}

/// Custom event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBus {
    /// Region hosting the bus.
    pub region: Region,
    /// Bus name.
    pub name: String,
}

impl Display for EventBus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "event bus {} ({})", self.name, self.region)
    }
}

/// Resource policy attached to an event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusPolicy {
    /// Region hosting the bus.
    pub region: Region,
    /// Bus name.
    pub bus_name: String,
    /// Policy document.
    pub document: PolicyDocument,
}

impl Display for BusPolicy {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "policy on event bus {} ({})", self.bus_name, self.region)
    }
}

/// Rule target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTarget {
    /// Target identifier unique within the rule.
    pub id: String,
    /// Target ARN.
    pub arn: String,
    /// Role the router assumes to deliver, when required.
    pub role_arn: Option<String>,
}

/// Event rule forwarding matching events to one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingRule {
    /// Region hosting the rule.
    pub region: Region,
    /// Custom bus name, or `None` for the default bus.
    pub bus_name: Option<String>,
    /// Rule name.
    pub name: String,
    /// Selection predicate.
    pub pattern: EventPattern,
    /// Single target.
    pub target: RuleTarget,
}

impl Display for RoutingRule {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "rule {} on {} ({})",
            self.name,
            self.bus_name.as_deref().unwrap_or("default"),
            self.region
        )
    }
}

/// Permission letting a service principal invoke the handler function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokePermission {
    /// Region hosting the function.
    pub region: Region,
    /// Function name.
    pub function_name: String,
    /// Statement identifier.
    pub statement_id: String,
    /// Invoking service principal.
    pub principal: String,
    /// ARN the invocation must originate from.
    pub source_arn: String,
}

impl Display for InvokePermission {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "invoke permission {} on {} ({})",
            self.statement_id, self.function_name, self.region
        )
    }
}

/// Platform capabilities used by the routing service.
#[derive(Clone)]
pub struct RoutingPorts {
    /// Identity roles.
    pub roles: Arc<dyn EnsurePresent<DeliveryRole>>,
    /// Handler functions.
    pub functions: Arc<dyn EnsurePresent<HandlerFunction>>,
    /// Custom event buses.
    pub buses: Arc<dyn EnsurePresent<EventBus>>,
    /// Event bus policies.
    pub bus_policies: Arc<dyn EnsurePresent<BusPolicy>>,
    /// Event rules and their targets.
    pub rules: Arc<dyn EnsurePresent<RoutingRule>>,
    /// Function invoke permissions.
    pub invoke_permissions: Arc<dyn EnsurePresent<InvokePermission>>,
}

impl RoutingPorts {
    /// Builds the port set from one adapter implementing every capability.
    #[must_use]
    pub fn from_platform<P>(platform: Arc<P>) -> Self
    where
        P: EnsurePresent<DeliveryRole>
            + EnsurePresent<HandlerFunction>
            + EnsurePresent<EventBus>
            + EnsurePresent<BusPolicy>
            + EnsurePresent<RoutingRule>
            + EnsurePresent<InvokePermission>
            + 'static,
    {
        Self {
            roles: platform.clone(),
            functions: platform.clone(),
            buses: platform.clone(),
            bus_policies: platform.clone(),
            rules: platform.clone(),
            invoke_permissions: platform,
        }
    }
}
