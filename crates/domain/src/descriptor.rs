use std::collections::BTreeSet;

use loglake_core::{AccountId, AppError, AppResult, NonEmptyString, Region};
use serde::{Deserialize, Serialize};

use crate::arn::{STORAGE_HOST_SUFFIX, storage_arn};
use crate::resource::{LogVariant, ResourceKind};

/// Storage container and path prefix receiving a resource's log records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination {
    container: NonEmptyString,
    prefix: String,
}

impl Destination {
    /// Creates a destination; the prefix is stored without surrounding slashes.
    pub fn new(container: impl Into<String>, prefix: impl Into<String>) -> AppResult<Self> {
        let container = NonEmptyString::new(container)
            .map_err(|error| error.context("destination container"))?;
        let prefix = prefix.into().trim_matches('/').to_owned();

        Ok(Self { container, prefix })
    }

    /// Returns the storage container name.
    #[must_use]
    pub fn container(&self) -> &str {
        self.container.as_str()
    }

    /// Returns the base prefix without surrounding slashes.
    #[must_use]
    pub fn prefix(&self) -> &str {
        self.prefix.as_str()
    }

    /// Returns the prefix a variant writes under.
    #[must_use]
    pub fn prefix_for(&self, variant: LogVariant) -> String {
        join_path(&[self.prefix(), variant.prefix_suffix().unwrap_or_default()])
    }

    /// Returns the storage ARN of the container.
    #[must_use]
    pub fn container_arn(&self) -> String {
        storage_arn(self.container())
    }

    /// Returns the virtual-host style endpoint distributions deliver to.
    #[must_use]
    pub fn storage_host(&self) -> String {
        format!("{}{STORAGE_HOST_SUFFIX}", self.container())
    }

    /// Returns a directory URI under the container, always ending in `/`.
    #[must_use]
    pub fn uri(&self, path: &str) -> String {
        let path = join_path(&[path]);
        if path.is_empty() {
            format!("s3://{}/", self.container())
        } else {
            format!("s3://{}/{path}/", self.container())
        }
    }

    /// Returns the location for catalog query results.
    #[must_use]
    pub fn query_results_uri(&self) -> String {
        self.uri("athena-results")
    }
}

/// Joins path fragments with single `/` separators, skipping empty fragments.
#[must_use]
pub fn join_path(fragments: &[&str]) -> String {
    fragments
        .iter()
        .flat_map(|fragment| fragment.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Normalized description of logging that was just enabled on a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEnablementDescriptor {
    resource_kind: ResourceKind,
    region: Region,
    account_id: AccountId,
    resource_identity: NonEmptyString,
    resource_reference: NonEmptyString,
    destination: Destination,
    log_variants: BTreeSet<LogVariant>,
}

/// Input payload used to construct a validated descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEnablementDescriptorInput {
    /// Kind of resource emitting the logs.
    pub resource_kind: ResourceKind,
    /// Region hosting the resource.
    pub region: Region,
    /// Account owning the resource.
    pub account_id: AccountId,
    /// Human-readable resource name.
    pub resource_identity: String,
    /// Canonical identifier used to address the resource on the platform.
    pub resource_reference: String,
    /// Where log records are delivered.
    pub destination: Destination,
    /// Variants enabled by the triggering request.
    pub log_variants: Vec<LogVariant>,
}

impl LogEnablementDescriptor {
    /// Creates a validated descriptor.
    pub fn new(input: LogEnablementDescriptorInput) -> AppResult<Self> {
        let LogEnablementDescriptorInput {
            resource_kind,
            region,
            account_id,
            resource_identity,
            resource_reference,
            destination,
            log_variants,
        } = input;

        if log_variants.is_empty() {
            return Err(AppError::Validation(
                "a log enablement descriptor requires at least one log variant".to_owned(),
            ));
        }

        if let Some(variant) = log_variants
            .iter()
            .find(|variant| !resource_kind.supports(**variant))
        {
            return Err(AppError::Validation(format!(
                "log variant '{variant}' is not supported for resource kind '{resource_kind}'"
            )));
        }

        Ok(Self {
            resource_kind,
            region,
            account_id,
            resource_identity: NonEmptyString::new(resource_identity)
                .map_err(|error| error.context("resource identity"))?,
            resource_reference: NonEmptyString::new(resource_reference)
                .map_err(|error| error.context("resource reference"))?,
            destination,
            log_variants: log_variants.into_iter().collect(),
        })
    }

    /// Returns the resource kind.
    #[must_use]
    pub fn resource_kind(&self) -> ResourceKind {
        self.resource_kind
    }

    /// Returns the region hosting the resource.
    #[must_use]
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Returns the owning account.
    #[must_use]
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Returns the human-readable resource name.
    #[must_use]
    pub fn resource_identity(&self) -> &str {
        self.resource_identity.as_str()
    }

    /// Returns the canonical identifier used for platform calls.
    #[must_use]
    pub fn resource_reference(&self) -> &str {
        self.resource_reference.as_str()
    }

    /// Returns the log destination.
    #[must_use]
    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    /// Returns enabled variants in provisioning order.
    pub fn log_variants(&self) -> impl Iterator<Item = LogVariant> + '_ {
        self.log_variants.iter().copied()
    }

    /// Returns whether the descriptor includes `variant`.
    #[must_use]
    pub fn includes(&self, variant: LogVariant) -> bool {
        self.log_variants.contains(&variant)
    }
}

#[cfg(test)]
mod tests {
    use loglake_core::{AccountId, Region};

    use super::{Destination, LogEnablementDescriptor, LogEnablementDescriptorInput, join_path};
    use crate::{LogVariant, ResourceKind};

    fn input(kind: ResourceKind, variants: Vec<LogVariant>) -> LogEnablementDescriptorInput {
        LogEnablementDescriptorInput {
            resource_kind: kind,
            region: Region::new("eu-west-1").unwrap_or_else(|_| unreachable!()),
            account_id: AccountId::new("111122223333").unwrap_or_else(|_| unreachable!()),
            resource_identity: "my-app".to_owned(),
            resource_reference: "arn:aws:elasticloadbalancing:eu-west-1:111122223333:loadbalancer/app/my-app/1"
                .to_owned(),
            destination: Destination::new("alb-logs", "alb/my-app/")
                .unwrap_or_else(|_| unreachable!()),
            log_variants: variants,
        }
    }

    #[test]
    fn descriptor_rejects_empty_variants() {
        assert!(LogEnablementDescriptor::new(input(ResourceKind::LoadBalancer, vec![])).is_err());
    }

    #[test]
    fn descriptor_rejects_variant_foreign_to_kind() {
        let result = LogEnablementDescriptor::new(input(
            ResourceKind::Distribution,
            vec![LogVariant::Health],
        ));
        assert!(result.is_err());
    }

    #[test]
    fn descriptor_orders_variants() {
        let descriptor = LogEnablementDescriptor::new(input(
            ResourceKind::LoadBalancer,
            vec![LogVariant::Health, LogVariant::Access, LogVariant::Health],
        ))
        .unwrap_or_else(|_| unreachable!());

        let variants: Vec<LogVariant> = descriptor.log_variants().collect();
        assert_eq!(variants, vec![LogVariant::Access, LogVariant::Health]);
    }

    #[test]
    fn destination_prefixes_nest_under_access_prefix() {
        let destination =
            Destination::new("alb-logs", "/alb/my-app/").unwrap_or_else(|_| unreachable!());

        assert_eq!(destination.prefix(), "alb/my-app");
        assert_eq!(destination.prefix_for(LogVariant::Access), "alb/my-app");
        assert_eq!(
            destination.prefix_for(LogVariant::Connection),
            "alb/my-app/connection"
        );
        assert_eq!(
            destination.uri(&destination.prefix_for(LogVariant::Health)),
            "s3://alb-logs/alb/my-app/health/"
        );
        assert_eq!(
            destination.query_results_uri(),
            "s3://alb-logs/athena-results/"
        );
    }

    #[test]
    fn empty_prefix_does_not_double_slashes() {
        let destination = Destination::new("waf-logs", "").unwrap_or_else(|_| unreachable!());
        assert_eq!(destination.uri(""), "s3://waf-logs/");
        assert_eq!(join_path(&["", "connection"]), "connection");
    }
}
