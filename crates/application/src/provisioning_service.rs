use std::fmt::{Display, Formatter};

use loglake_core::AppResult;
use loglake_domain::{LogEnablementDescriptor, ResourceKind};
use serde::Serialize;
use tracing::info;

use crate::ensure::{RetryPolicy, StepOutcome};
use crate::provisioning_ports::ProvisioningPorts;

mod catalog;
mod delivery;
mod storage;

/// Ordered provisioning steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningStep {
    /// Log storage container.
    StorageContainer,
    /// Container access for the log delivery service.
    AccessPolicy,
    /// Resource-side log delivery settings.
    LogDelivery,
    /// Catalog database per log variant.
    CatalogDatabase,
    /// Catalog table per log variant.
    CatalogTable,
}

impl ProvisioningStep {
    /// Returns a stable value for this step.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StorageContainer => "storage_container",
            Self::AccessPolicy => "access_policy",
            Self::LogDelivery => "log_delivery",
            Self::CatalogDatabase => "catalog_database",
            Self::CatalogTable => "catalog_table",
        }
    }
}

impl Display for ProvisioningStep {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Outcome of one provisioning step for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisioningRecord {
    /// Step that ran.
    pub step: ProvisioningStep,
    /// Human-readable resource label.
    pub resource: String,
    /// What the step did.
    pub outcome: StepOutcome,
}

/// Ordered outcomes of one provisioning run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvisioningReport {
    records: Vec<ProvisioningRecord>,
}

impl ProvisioningReport {
    fn record(&mut self, step: ProvisioningStep, resource: impl Into<String>, outcome: StepOutcome) {
        self.records.push(ProvisioningRecord {
            step,
            resource: resource.into(),
            outcome,
        });
    }

    /// Returns step outcomes in execution order.
    #[must_use]
    pub fn records(&self) -> &[ProvisioningRecord] {
        &self.records
    }

    /// Returns how many steps changed platform state.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.outcome == StepOutcome::Created)
            .count()
    }

    /// Returns labels of resources created during the run.
    #[must_use]
    pub fn created_resources(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|record| record.outcome == StepOutcome::Created)
            .map(|record| record.resource.clone())
            .collect()
    }

    /// Returns the outcomes recorded for `step`.
    pub fn outcomes_for(&self, step: ProvisioningStep) -> impl Iterator<Item = StepOutcome> + '_ {
        self.records
            .iter()
            .filter(move |record| record.step == step)
            .map(|record| record.outcome)
    }
}

/// Materializes the log pipeline described by a log enablement descriptor.
#[derive(Clone)]
pub struct ProvisioningService {
    ports: ProvisioningPorts,
    retry: RetryPolicy,
}

impl ProvisioningService {
    /// Creates a provisioning service.
    #[must_use]
    pub fn new(ports: ProvisioningPorts, retry: RetryPolicy) -> Self {
        Self { ports, retry }
    }

    /// Provisions storage, access, log delivery and catalog resources for a descriptor.
    ///
    /// Every step checks existence before creating, so re-running with the same
    /// descriptor creates nothing. Catalog tables are derived from the variants in the
    /// descriptor, which reflect the caller's requested configuration; a load balancer
    /// already delivering access logs to the container is not inspected for its other
    /// variants, and its current access-log prefix locates the tables.
    ///
    /// Distributions with an origin reachable only through a private network fail with
    /// [`loglake_core::AppError::ManualInterventionRequired`] before any resource is touched.
    pub async fn provision(
        &self,
        descriptor: &LogEnablementDescriptor,
    ) -> AppResult<ProvisioningReport> {
        info!(
            resource_kind = %descriptor.resource_kind(),
            region = %descriptor.region(),
            resource = descriptor.resource_identity(),
            "provisioning log pipeline"
        );

        let distribution_plan = match descriptor.resource_kind() {
            ResourceKind::Distribution => Some(
                self.plan_distribution_delivery(descriptor)
                    .await
                    .map_err(|error| error.context(ProvisioningStep::LogDelivery))?,
            ),
            ResourceKind::LoadBalancer | ResourceKind::WebFirewall => None,
        };

        let mut report = ProvisioningReport::default();

        self.ensure_storage_container(descriptor, &mut report)
            .await
            .map_err(|error| error.context(ProvisioningStep::StorageContainer))?;
        self.ensure_access_policy(descriptor, &mut report)
            .await
            .map_err(|error| error.context(ProvisioningStep::AccessPolicy))?;
        let log_destination = self
            .ensure_log_delivery(descriptor, distribution_plan, &mut report)
            .await
            .map_err(|error| error.context(ProvisioningStep::LogDelivery))?;
        self.ensure_catalog(descriptor, &log_destination, &mut report)
            .await?;

        info!(
            resource = descriptor.resource_identity(),
            created = report.created_count(),
            "log pipeline provisioned"
        );

        Ok(report)
    }
}
