use loglake_domain::load_balancer_delivery_policy;
use tracing::debug;

use crate::ensure::ensure_present;
use crate::provisioning_ports::{AccessGrant, ContainerAccessPolicy, StorageContainer};

use super::*;

impl ProvisioningService {
    pub(super) async fn ensure_storage_container(
        &self,
        descriptor: &LogEnablementDescriptor,
        report: &mut ProvisioningReport,
    ) -> AppResult<()> {
        let container = StorageContainer {
            region: descriptor.region().clone(),
            name: descriptor.destination().container().to_owned(),
        };

        let outcome = ensure_present(self.ports.containers.as_ref(), &container, &self.retry).await?;
        report.record(ProvisioningStep::StorageContainer, container.to_string(), outcome);
        Ok(())
    }

    pub(super) async fn ensure_access_policy(
        &self,
        descriptor: &LogEnablementDescriptor,
        report: &mut ProvisioningReport,
    ) -> AppResult<()> {
        let destination = descriptor.destination();
        let grant = match descriptor.resource_kind() {
            ResourceKind::Distribution => AccessGrant::log_delivery_acl(),
            ResourceKind::LoadBalancer => AccessGrant::ResourcePolicy {
                document: load_balancer_delivery_policy(
                    destination.container(),
                    destination.prefix(),
                ),
            },
            ResourceKind::WebFirewall => {
                debug!(
                    container = destination.container(),
                    "firewall log delivery needs no container grant"
                );
                report.record(
                    ProvisioningStep::AccessPolicy,
                    format!("access policy on {}", destination.container()),
                    StepOutcome::NotRequired,
                );
                return Ok(());
            }
        };

        let policy = ContainerAccessPolicy {
            region: descriptor.region().clone(),
            container: destination.container().to_owned(),
            grant,
        };

        let outcome = ensure_present(self.ports.access_policies.as_ref(), &policy, &self.retry).await?;
        report.record(ProvisioningStep::AccessPolicy, policy.to_string(), outcome);
        Ok(())
    }
}
