use std::fmt::{Display, Formatter};
use std::str::FromStr;

use loglake_core::{AccountId, AppError, Region};
use serde::{Deserialize, Serialize};

/// Kind of platform resource whose access logs are provisioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Application load balancer.
    LoadBalancer,
    /// Web application firewall access control list.
    WebFirewall,
    /// Content-delivery distribution.
    Distribution,
}

impl ResourceKind {
    /// Returns all known resource kinds.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ResourceKind] = &[
            ResourceKind::LoadBalancer,
            ResourceKind::WebFirewall,
            ResourceKind::Distribution,
        ];

        ALL
    }

    /// Returns the stable tag used in table names and service labels.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::LoadBalancer => "alb",
            Self::WebFirewall => "waf",
            Self::Distribution => "cloudfront",
        }
    }

    /// Returns the audit event source emitting calls for this kind.
    #[must_use]
    pub fn event_source(&self) -> &'static str {
        match self {
            Self::LoadBalancer => "aws.elasticloadbalancing",
            Self::WebFirewall => "aws.wafv2",
            Self::Distribution => "aws.cloudfront",
        }
    }

    /// Returns the API call that enables logging for this kind.
    #[must_use]
    pub fn trigger_event_name(&self) -> &'static str {
        match self {
            Self::LoadBalancer => "ModifyLoadBalancerAttributes",
            Self::WebFirewall => "PutLoggingConfiguration",
            Self::Distribution => "UpdateDistribution",
        }
    }

    /// Resolves the resource kind from a triggering API call name.
    #[must_use]
    pub fn from_event_name(event_name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.trigger_event_name() == event_name)
    }

    /// Returns the log variants a resource of this kind can emit, in provisioning order.
    #[must_use]
    pub fn supported_variants(&self) -> &'static [LogVariant] {
        match self {
            Self::LoadBalancer => &[LogVariant::Access, LogVariant::Connection, LogVariant::Health],
            Self::WebFirewall | Self::Distribution => &[LogVariant::Standard],
        }
    }

    /// Returns whether `variant` is valid for this kind.
    #[must_use]
    pub fn supports(&self, variant: LogVariant) -> bool {
        self.supported_variants().contains(&variant)
    }

    /// Returns the managed storage container name for an account and region.
    ///
    /// Firewall log delivery only accepts containers prefixed with `aws-waf-logs-`.
    #[must_use]
    pub fn managed_container_name(&self, account_id: &AccountId, region: &Region) -> String {
        match self {
            Self::WebFirewall => format!("aws-waf-logs-{account_id}-{region}"),
            Self::LoadBalancer | Self::Distribution => {
                format!("{}-logs-{account_id}-{region}", self.tag())
            }
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.tag())
    }
}

impl FromStr for ResourceKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.tag() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown resource kind '{value}'")))
    }
}

/// Distinct sub-stream of log records for a resource.
///
/// The declaration order is the provisioning order: later load balancer variants
/// live under the access-log prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogVariant {
    /// Load balancer request logs.
    Access,
    /// Load balancer TLS connection logs.
    Connection,
    /// Load balancer target health check logs.
    Health,
    /// Single log stream of firewalls and distributions.
    Standard,
}

impl LogVariant {
    /// Returns a stable value for this variant.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Connection => "connection",
            Self::Health => "health",
            Self::Standard => "standard",
        }
    }

    /// Returns the folder appended to the access prefix, if any.
    #[must_use]
    pub fn prefix_suffix(&self) -> Option<&'static str> {
        match self {
            Self::Connection => Some("connection"),
            Self::Health => Some("health"),
            Self::Access | Self::Standard => None,
        }
    }

    /// Returns the load balancer attribute namespace for this variant.
    #[must_use]
    pub fn load_balancer_attribute_namespace(&self) -> Option<&'static str> {
        match self {
            Self::Access => Some("access_logs.s3"),
            Self::Connection => Some("connection_logs.s3"),
            Self::Health => Some("health_check_logs.s3"),
            Self::Standard => None,
        }
    }
}

impl Display for LogVariant {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for LogVariant {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "access" => Ok(Self::Access),
            "connection" => Ok(Self::Connection),
            "health" => Ok(Self::Health),
            "standard" => Ok(Self::Standard),
            _ => Err(AppError::Validation(format!("unknown log variant '{value}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use loglake_core::{AccountId, Region};

    use super::{LogVariant, ResourceKind};

    #[test]
    fn event_names_resolve_to_kinds() {
        assert_eq!(
            ResourceKind::from_event_name("ModifyLoadBalancerAttributes"),
            Some(ResourceKind::LoadBalancer)
        );
        assert_eq!(
            ResourceKind::from_event_name("PutLoggingConfiguration"),
            Some(ResourceKind::WebFirewall)
        );
        assert_eq!(
            ResourceKind::from_event_name("UpdateDistribution"),
            Some(ResourceKind::Distribution)
        );
        assert_eq!(ResourceKind::from_event_name("CreateDistribution"), None);
    }

    #[test]
    fn managed_container_names_follow_delivery_rules() {
        let account = AccountId::new("111122223333").unwrap_or_else(|_| unreachable!());
        let region = Region::new("eu-west-1").unwrap_or_else(|_| unreachable!());

        assert_eq!(
            ResourceKind::LoadBalancer.managed_container_name(&account, &region),
            "alb-logs-111122223333-eu-west-1"
        );
        assert_eq!(
            ResourceKind::WebFirewall.managed_container_name(&account, &region),
            "aws-waf-logs-111122223333-eu-west-1"
        );
        assert_eq!(
            ResourceKind::Distribution.managed_container_name(&account, &region),
            "cloudfront-logs-111122223333-eu-west-1"
        );
    }

    #[test]
    fn variants_order_access_first() {
        assert!(LogVariant::Access < LogVariant::Connection);
        assert!(LogVariant::Connection < LogVariant::Health);
        assert!(!ResourceKind::WebFirewall.supports(LogVariant::Access));
    }
}
