use loglake_core::{AccountId, AppError, AppResult, Region};
use loglake_domain::{
    Destination, LogEnablementDescriptor, LogEnablementDescriptorInput, LogVariant, ResourceKind,
    region_from_arn, resource_name_from_identifier,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::provisioning_service::ProvisioningService;

/// Distribution to enroll.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DistributionEnrollment {
    /// Distribution identifier.
    pub distribution_id: String,
}

/// Log variants to turn on for a load balancer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoadBalancerLogSelection {
    /// Request logs.
    pub access: bool,
    /// TLS connection logs.
    pub connection: bool,
    /// Health check logs.
    pub health: bool,
}

impl Default for LoadBalancerLogSelection {
    fn default() -> Self {
        Self {
            access: true,
            connection: false,
            health: false,
        }
    }
}

impl LoadBalancerLogSelection {
    fn variants(self) -> Vec<LogVariant> {
        [
            (self.access, LogVariant::Access),
            (self.connection, LogVariant::Connection),
            (self.health, LogVariant::Health),
        ]
        .into_iter()
        .filter_map(|(enabled, variant)| enabled.then_some(variant))
        .collect()
    }
}

/// Load balancer to enroll.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoadBalancerEnrollment {
    /// Load balancer ARN.
    pub arn: String,
    /// Requested log variants.
    #[serde(default)]
    pub logs: LoadBalancerLogSelection,
}

/// Web ACL to enroll.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebAclEnrollment {
    /// Web ACL ARN.
    pub arn: String,
}

/// Batch of resources whose logging is enabled into managed containers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnrollmentRequest {
    /// Content-delivery distributions.
    pub cloudfront: Vec<DistributionEnrollment>,
    /// Application load balancers.
    pub alb: Vec<LoadBalancerEnrollment>,
    /// Web ACLs.
    pub waf: Vec<WebAclEnrollment>,
}

/// Per-resource results of an enrollment batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrollmentSummary {
    /// Labels of enrolled resources.
    pub succeeded: Vec<String>,
    /// Labels and reasons of resources that failed.
    pub failed: Vec<String>,
}

/// Enables logging on explicitly listed resources using managed destinations.
#[derive(Clone)]
pub struct EnrollmentService {
    provisioning: ProvisioningService,
    account_id: AccountId,
}

impl EnrollmentService {
    /// Creates an enrollment service for one account.
    #[must_use]
    pub fn new(provisioning: ProvisioningService, account_id: AccountId) -> Self {
        Self {
            provisioning,
            account_id,
        }
    }

    /// Enrolls every resource in the batch.
    ///
    /// All ARNs are validated first; one invalid ARN aborts the batch with a single
    /// failure. Afterwards each resource is provisioned on its own and a failure does
    /// not stop the rest.
    pub async fn enroll(&self, request: &EnrollmentRequest) -> EnrollmentSummary {
        let mut summary = EnrollmentSummary::default();

        let arns = request
            .alb
            .iter()
            .map(|load_balancer| ("ALB", load_balancer.arn.as_str()))
            .chain(request.waf.iter().map(|web_acl| ("WAF", web_acl.arn.as_str())));
        for (label, arn) in arns {
            if let Err(error) = region_from_arn(arn) {
                error!(arn, error = %error, "invalid ARN, aborting enrollment batch");
                summary
                    .failed
                    .push(format!("{label} {arn}: invalid ARN format"));
                return summary;
            }
        }

        for distribution in &request.cloudfront {
            let label = format!("CloudFront {}", distribution.distribution_id);
            let result = self.distribution_descriptor(distribution);
            self.provision(label, result, &mut summary).await;
        }

        for load_balancer in &request.alb {
            let label = resource_name_from_identifier(&load_balancer.arn)
                .map_or_else(|| format!("ALB {}", load_balancer.arn), |name| format!("ALB {name}"));
            let result = self.load_balancer_descriptor(load_balancer);
            self.provision(label, result, &mut summary).await;
        }

        for web_acl in &request.waf {
            let label = resource_name_from_identifier(&web_acl.arn)
                .map_or_else(|| format!("WAF {}", web_acl.arn), |name| format!("WAF {name}"));
            let result = self.web_acl_descriptor(web_acl);
            self.provision(label, result, &mut summary).await;
        }

        info!(
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            "enrollment batch finished"
        );
        summary
    }

    async fn provision(
        &self,
        label: String,
        descriptor: AppResult<LogEnablementDescriptor>,
        summary: &mut EnrollmentSummary,
    ) {
        let result = match descriptor {
            Ok(descriptor) => self.provisioning.provision(&descriptor).await.map(|_| ()),
            Err(error) => Err(error),
        };

        match result {
            Ok(()) => {
                info!(resource = %label, "resource enrolled");
                summary.succeeded.push(label);
            }
            Err(error) => {
                error!(resource = %label, error = %error, "resource enrollment failed");
                summary.failed.push(format!("{label}: {error}"));
            }
        }
    }

    fn distribution_descriptor(
        &self,
        distribution: &DistributionEnrollment,
    ) -> AppResult<LogEnablementDescriptor> {
        let region = Region::global_edge();
        let id = distribution.distribution_id.as_str();

        self.managed_descriptor(
            ResourceKind::Distribution,
            region,
            id,
            id,
            format!("cloudfront/{id}/"),
            vec![LogVariant::Standard],
        )
    }

    fn load_balancer_descriptor(
        &self,
        load_balancer: &LoadBalancerEnrollment,
    ) -> AppResult<LogEnablementDescriptor> {
        let region = region_from_arn(&load_balancer.arn)?;
        let name = arn_resource_name(&load_balancer.arn)?;

        self.managed_descriptor(
            ResourceKind::LoadBalancer,
            region,
            name,
            &load_balancer.arn,
            format!("alb/{name}"),
            load_balancer.logs.variants(),
        )
    }

    fn web_acl_descriptor(&self, web_acl: &WebAclEnrollment) -> AppResult<LogEnablementDescriptor> {
        let region = region_from_arn(&web_acl.arn)?;
        let name = arn_resource_name(&web_acl.arn)?;

        self.managed_descriptor(
            ResourceKind::WebFirewall,
            region,
            name,
            &web_acl.arn,
            String::new(),
            vec![LogVariant::Standard],
        )
    }

    fn managed_descriptor(
        &self,
        resource_kind: ResourceKind,
        region: Region,
        identity: &str,
        reference: &str,
        prefix: String,
        log_variants: Vec<LogVariant>,
    ) -> AppResult<LogEnablementDescriptor> {
        let container = resource_kind.managed_container_name(&self.account_id, &region);

        LogEnablementDescriptor::new(LogEnablementDescriptorInput {
            resource_kind,
            region,
            account_id: self.account_id.clone(),
            resource_identity: identity.to_owned(),
            resource_reference: reference.to_owned(),
            destination: Destination::new(container, prefix)?,
            log_variants,
        })
    }
}

fn arn_resource_name(arn: &str) -> AppResult<&str> {
    resource_name_from_identifier(arn)
        .ok_or_else(|| AppError::Validation(format!("ARN '{arn}' has no resource name segment")))
}

#[cfg(test)]
mod tests;
