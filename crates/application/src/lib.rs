//! Application services and ports.

#![forbid(unsafe_code)]

mod enrollment_service;
mod ensure;
mod event_interpreter;
mod log_enablement_handler;
mod provisioning_ports;
mod provisioning_service;
mod routing_ports;
mod routing_service;

#[cfg(test)]
mod test_support;

pub use enrollment_service::{
    DistributionEnrollment, EnrollmentRequest, EnrollmentService, EnrollmentSummary,
    LoadBalancerEnrollment, LoadBalancerLogSelection, WebAclEnrollment,
};
pub use ensure::{EnsurePresent, ResourceState, RetryPolicy, StepOutcome, ensure_present};
pub use event_interpreter::{AuditEventDetail, AuditEventEnvelope, interpret, interpret_value};
pub use log_enablement_handler::{HandlerResponse, LogEnablementHandler};
pub use provisioning_ports::{
    AccessGrant, CatalogDatabase, CatalogTables, ContainerAccessPolicy, DistributionConfig,
    DistributionLogging, DistributionOrigin, LOG_DELIVERY_CANNED_ACL,
    LOG_DELIVERY_OBJECT_OWNERSHIP, LoadBalancerAttribute, LogDeliveryPlatform, ProvisioningPorts,
    QueryJobRequest, QueryJobStatus, QueryJobs, StorageContainer, VersionedDistributionConfig,
};
pub use provisioning_service::{
    ProvisioningRecord, ProvisioningReport, ProvisioningService, ProvisioningStep,
};
pub use routing_ports::{
    BusPolicy, DeliveryRole, EventBus, HandlerFunction, InvokePermission, RoutingPorts,
    RoutingRule, RuleTarget,
};
pub use routing_service::{HandlerDeployment, RoutingRecord, RoutingReport, RoutingService};
