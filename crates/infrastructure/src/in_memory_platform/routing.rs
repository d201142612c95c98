use std::collections::BTreeMap;

use async_trait::async_trait;
use loglake_application::{
    BusPolicy, DeliveryRole, EnsurePresent, EventBus, HandlerFunction, InvokePermission,
    ResourceState, RoutingRule,
};
use loglake_core::{AppError, AppResult};
use tracing::debug;

use super::InMemoryPlatform;
use super::state::PlatformState;

/// A resource counts as present only when the stored copy matches; drifted
/// copies are reported absent so `create` overwrites them.
fn desired_state<T: PartialEq>(stored: Option<&T>, desired: &T) -> ResourceState {
    match stored {
        Some(stored) if stored == desired => ResourceState::Present,
        _ => ResourceState::Absent,
    }
}

fn region_key(region: &str, name: &str) -> String {
    format!("{region}/{name}")
}

macro_rules! platform_registry {
    ($resource:ty, $table:ident, |$item:ident| $key:expr) => {
        #[async_trait]
        impl EnsurePresent<$resource> for InMemoryPlatform {
            async fn state(&self, $item: &$resource) -> AppResult<ResourceState> {
                let key = $key;
                Ok(desired_state(self.state.read().await.$table.get(&key), $item))
            }

            async fn create(&self, $item: &$resource) -> AppResult<()> {
                let key = $key;
                upsert(&mut self.state.write().await.$table, key, $item);
                Ok(())
            }
        }
    };
}

fn upsert<T: Clone>(table: &mut BTreeMap<String, T>, key: String, resource: &T) {
    debug!(key = %key, "routing resource stored");
    table.insert(key, resource.clone());
}

platform_registry!(DeliveryRole, roles, |role| role.name.clone());
platform_registry!(EventBus, buses, |bus| region_key(
    bus.region.as_str(),
    &bus.name
));
platform_registry!(RoutingRule, rules, |rule| format!(
    "{}/{}/{}",
    rule.region,
    rule.bus_name.as_deref().unwrap_or("default"),
    rule.name
));

#[async_trait]
impl EnsurePresent<HandlerFunction> for InMemoryPlatform {
    async fn state(&self, function: &HandlerFunction) -> AppResult<ResourceState> {
        let state = self.state.read().await;
        let key = region_key(function.region.as_str(), &function.name);
        Ok(desired_state(state.functions.get(&key), function))
    }

    async fn create(&self, function: &HandlerFunction) -> AppResult<()> {
        let mut state = self.state.write().await;
        if !state
            .roles
            .values()
            .any(|role| function.role_arn.ends_with(&format!(":role/{}", role.name)))
        {
            return Err(AppError::Validation(format!(
                "execution role '{}' does not exist",
                function.role_arn
            )));
        }

        let key = region_key(function.region.as_str(), &function.name);
        upsert(&mut state.functions, key, function);
        Ok(())
    }
}

#[async_trait]
impl EnsurePresent<BusPolicy> for InMemoryPlatform {
    async fn state(&self, policy: &BusPolicy) -> AppResult<ResourceState> {
        let state = self.state.read().await;
        let key = region_key(policy.region.as_str(), &policy.bus_name);
        Ok(desired_state(state.bus_policies.get(&key), policy))
    }

    async fn create(&self, policy: &BusPolicy) -> AppResult<()> {
        let mut state = self.state.write().await;
        let key = region_key(policy.region.as_str(), &policy.bus_name);
        require_bus(&state, &key)?;
        upsert(&mut state.bus_policies, key, policy);
        Ok(())
    }
}

#[async_trait]
impl EnsurePresent<InvokePermission> for InMemoryPlatform {
    async fn state(&self, permission: &InvokePermission) -> AppResult<ResourceState> {
        let state = self.state.read().await;
        let key = permission_key(permission);
        Ok(desired_state(state.invoke_permissions.get(&key), permission))
    }

    async fn create(&self, permission: &InvokePermission) -> AppResult<()> {
        let mut state = self.state.write().await;
        let function = region_key(permission.region.as_str(), &permission.function_name);
        if !state.functions.contains_key(&function) {
            return Err(AppError::NotFound(format!(
                "function '{}' does not exist in region '{}'",
                permission.function_name, permission.region
            )));
        }

        upsert(&mut state.invoke_permissions, permission_key(permission), permission);
        Ok(())
    }
}

fn permission_key(permission: &InvokePermission) -> String {
    format!(
        "{}/{}/{}",
        permission.region, permission.function_name, permission.statement_id
    )
}

fn require_bus(state: &PlatformState, key: &str) -> AppResult<()> {
    if state.buses.contains_key(key) {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("event bus '{key}' does not exist")))
    }
}
