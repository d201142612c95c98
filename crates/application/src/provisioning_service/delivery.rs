use loglake_core::AppError;
use loglake_domain::{Destination, LogVariant};
use tracing::{debug, info};

use crate::provisioning_ports::{DistributionLogging, LoadBalancerAttribute, VersionedDistributionConfig};

use super::*;

/// Decision taken for a distribution before any resource is touched.
pub(super) enum DistributionPlan {
    AlreadyDelivering,
    Update(VersionedDistributionConfig),
}

impl ProvisioningService {
    /// Reads the distribution once and rejects configurations that cannot be changed here.
    pub(super) async fn plan_distribution_delivery(
        &self,
        descriptor: &LogEnablementDescriptor,
    ) -> AppResult<DistributionPlan> {
        let distribution_id = descriptor.resource_reference();
        let current = self
            .retry
            .run("read distribution config", || {
                self.ports.log_delivery.distribution_config(distribution_id)
            })
            .await?;

        let logging = &current.config.logging;
        if logging.enabled && logging.bucket == descriptor.destination().storage_host() {
            return Ok(DistributionPlan::AlreadyDelivering);
        }

        let private_origins: Vec<&str> = current
            .config
            .origins
            .iter()
            .filter(|origin| origin.is_private_network_only())
            .map(|origin| origin.id.as_str())
            .collect();
        if !private_origins.is_empty() {
            return Err(AppError::ManualInterventionRequired(format!(
                "distribution '{distribution_id}' has origins reachable only through a private \
                 network ({}); enable standard logging from the console",
                private_origins.join(", ")
            )));
        }

        Ok(DistributionPlan::Update(current))
    }

    /// Turns log delivery on and returns the destination the resource actually
    /// writes to.
    pub(super) async fn ensure_log_delivery(
        &self,
        descriptor: &LogEnablementDescriptor,
        distribution_plan: Option<DistributionPlan>,
        report: &mut ProvisioningReport,
    ) -> AppResult<Destination> {
        let label = format!(
            "{} log delivery for {}",
            descriptor.resource_kind(),
            descriptor.resource_identity()
        );

        let requested = descriptor.destination().clone();
        let (outcome, destination) = match (descriptor.resource_kind(), distribution_plan) {
            (ResourceKind::LoadBalancer, _) => self.enable_load_balancer_logs(descriptor).await?,
            (ResourceKind::WebFirewall, _) => {
                (self.enable_web_acl_logs(descriptor).await?, requested)
            }
            (ResourceKind::Distribution, Some(plan)) => (
                self.enable_distribution_logs(descriptor, plan).await?,
                requested,
            ),
            (ResourceKind::Distribution, None) => {
                let plan = self.plan_distribution_delivery(descriptor).await?;
                (
                    self.enable_distribution_logs(descriptor, plan).await?,
                    requested,
                )
            }
        };

        report.record(ProvisioningStep::LogDelivery, label, outcome);
        Ok(destination)
    }

    /// A load balancer already delivering access logs to the container keeps its
    /// current prefix, which then locates the catalog tables.
    async fn enable_load_balancer_logs(
        &self,
        descriptor: &LogEnablementDescriptor,
    ) -> AppResult<(StepOutcome, Destination)> {
        let region = descriptor.region();
        let arn = descriptor.resource_reference();
        let destination = descriptor.destination();

        let current = self
            .retry
            .run("read load balancer attributes", || {
                self.ports.log_delivery.load_balancer_attributes(region, arn)
            })
            .await?;

        let enabled = current
            .get("access_logs.s3.enabled")
            .is_some_and(|value| value == "true");
        let same_container = current
            .get("access_logs.s3.bucket")
            .is_some_and(|value| value == destination.container());
        if enabled && same_container {
            let prefix = current
                .get("access_logs.s3.prefix")
                .map(String::as_str)
                .unwrap_or_default();
            debug!(
                load_balancer = arn,
                prefix,
                "access logs already delivered to container"
            );
            let delivering = Destination::new(destination.container(), prefix)?;
            return Ok((StepOutcome::AlreadyPresent, delivering));
        }

        let attributes: Vec<LoadBalancerAttribute> = descriptor
            .log_variants()
            .filter_map(|variant| {
                variant
                    .load_balancer_attribute_namespace()
                    .map(|namespace| (variant, namespace))
            })
            .flat_map(|(variant, namespace)| {
                [
                    LoadBalancerAttribute::new(format!("{namespace}.enabled"), "true"),
                    LoadBalancerAttribute::new(
                        format!("{namespace}.bucket"),
                        destination.container(),
                    ),
                    LoadBalancerAttribute::new(
                        format!("{namespace}.prefix"),
                        destination.prefix_for(variant),
                    ),
                ]
            })
            .collect();

        self.retry
            .run("modify load balancer attributes", || {
                self.ports
                    .log_delivery
                    .modify_load_balancer_attributes(region, arn, attributes.clone())
            })
            .await?;

        info!(
            load_balancer = arn,
            container = destination.container(),
            variants = ?descriptor.log_variants().map(|variant| variant.as_str()).collect::<Vec<_>>(),
            "load balancer log delivery enabled"
        );
        Ok((StepOutcome::Created, destination.clone()))
    }

    async fn enable_web_acl_logs(&self, descriptor: &LogEnablementDescriptor) -> AppResult<StepOutcome> {
        let region = descriptor.region();
        let arn = descriptor.resource_reference();
        let container_arn = descriptor.destination().container_arn();

        let current = match self
            .retry
            .run("read web ACL logging configuration", || {
                self.ports.log_delivery.web_acl_log_destinations(region, arn)
            })
            .await
        {
            Ok(destinations) => destinations,
            Err(AppError::NotFound(_)) => Vec::new(),
            Err(error) => return Err(error),
        };

        if current
            .first()
            .is_some_and(|destination| destination.contains(container_arn.as_str()))
        {
            debug!(web_acl = arn, "web ACL already logs to container");
            return Ok(StepOutcome::AlreadyPresent);
        }

        self.retry
            .run("put web ACL logging configuration", || {
                self.ports
                    .log_delivery
                    .put_web_acl_log_destinations(region, arn, vec![container_arn.clone()])
            })
            .await?;

        info!(web_acl = arn, destination = %container_arn, "web ACL log delivery enabled");
        Ok(StepOutcome::Created)
    }

    async fn enable_distribution_logs(
        &self,
        descriptor: &LogEnablementDescriptor,
        plan: DistributionPlan,
    ) -> AppResult<StepOutcome> {
        let VersionedDistributionConfig {
            mut config,
            version_tag,
        } = match plan {
            DistributionPlan::AlreadyDelivering => {
                debug!(
                    distribution = descriptor.resource_reference(),
                    "distribution already logs to container"
                );
                return Ok(StepOutcome::AlreadyPresent);
            }
            DistributionPlan::Update(current) => current,
        };

        let destination = descriptor.destination();
        config.logging = DistributionLogging {
            enabled: true,
            include_cookies: false,
            bucket: destination.storage_host(),
            prefix: distribution_prefix(destination.prefix_for(LogVariant::Standard)),
        };

        let distribution_id = descriptor.resource_reference();
        self.retry
            .run("update distribution config", || {
                self.ports.log_delivery.update_distribution_config(
                    distribution_id,
                    config.clone(),
                    version_tag.as_str(),
                )
            })
            .await?;

        info!(
            distribution = distribution_id,
            bucket = %config.logging.bucket,
            "distribution standard logging enabled"
        );
        Ok(StepOutcome::Created)
    }
}

/// Distribution prefixes are directory-style and end with `/` unless empty.
fn distribution_prefix(prefix: String) -> String {
    if prefix.is_empty() {
        prefix
    } else {
        format!("{prefix}/")
    }
}
