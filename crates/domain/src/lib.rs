//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod arn;
mod catalog;
mod descriptor;
mod policy;
mod resource;
mod routing;
mod schema;

pub use arn::{
    STORAGE_HOST_SUFFIX, container_from_storage_arn, container_from_storage_host, region_from_arn,
    resource_name_from_identifier, storage_arn,
};
pub use catalog::{CatalogEntry, render_table_ddl};
pub use descriptor::{Destination, LogEnablementDescriptor, LogEnablementDescriptorInput, join_path};
pub use policy::{
    COMPUTE_SERVICE, EVENT_ROUTER_SERVICE, LOAD_BALANCER_LOG_DELIVERY_SERVICE, POLICY_VERSION,
    PolicyDocument, PolicyStatement, Principal, load_balancer_delivery_policy,
    service_trust_policy,
};
pub use resource::{LogVariant, ResourceKind};
pub use routing::{
    AUDIT_DETAIL_TYPE, DEFAULT_HANDLER_FUNCTION_NAME, EventPattern, HANDLER_ROLE_NAME,
    INTAKE_BUS_NAME, INTAKE_RULE_NAME, LOCAL_DELIVERY_ROLE_NAME, LOCAL_FORWARDING_RULE_NAME,
    RoutingTopology, bus_rule_arn, cross_region_role_name, event_bus_arn, forwarding_rule_name,
    function_arn, role_arn,
};
pub use schema::{Column, LocationTemplate, RowFormat, TableSchema, all_schemas, schema_for};
