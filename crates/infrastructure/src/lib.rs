//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_platform;

pub use in_memory_platform::{
    ContainerState, DatabaseState, InMemoryPlatform, LoadBalancerState, PlatformState,
    QueryJobState, TableState, WebAclState, platform_ports,
};
