//! In-process fake platform shared by service tests.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use async_trait::async_trait;
use loglake_core::{AppError, AppResult, Region};
use tokio::sync::Mutex;

use crate::ensure::{EnsurePresent, ResourceState};
use crate::provisioning_ports::{
    CatalogDatabase, CatalogTables, ContainerAccessPolicy, DistributionConfig, LoadBalancerAttribute,
    LogDeliveryPlatform, QueryJobRequest, QueryJobStatus, QueryJobs, StorageContainer,
    VersionedDistributionConfig,
};
use crate::routing_ports::{
    BusPolicy, DeliveryRole, EventBus, HandlerFunction, InvokePermission, RoutingRule,
};

/// Keyed store of resources compared by value.
pub(crate) struct Registry<T> {
    items: Mutex<BTreeMap<String, T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            items: Mutex::new(BTreeMap::new()),
        }
    }
}

impl<T: Clone + PartialEq> Registry<T> {
    async fn state(&self, key: String, resource: &T) -> ResourceState {
        match self.items.lock().await.get(&key) {
            Some(existing) if existing == resource => ResourceState::Present,
            _ => ResourceState::Absent,
        }
    }

    async fn put(&self, key: String, resource: &T) {
        self.items.lock().await.insert(key, resource.clone());
    }

    pub(crate) async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub(crate) async fn get(&self, key: &str) -> Option<T> {
        self.items.lock().await.get(key).cloned()
    }
}

#[derive(Default)]
pub(crate) struct FakePlatform {
    pub containers: Registry<StorageContainer>,
    pub access_policies: Registry<ContainerAccessPolicy>,
    pub databases: Registry<CatalogDatabase>,
    pub tables: Mutex<BTreeSet<(String, String, String)>>,
    pub queries: Mutex<Vec<QueryJobRequest>>,
    pub query_outcome: Mutex<Option<QueryJobStatus>>,
    pub load_balancers: Mutex<BTreeMap<String, BTreeMap<String, String>>>,
    pub web_acls: Mutex<BTreeMap<String, Vec<String>>>,
    pub distributions: Mutex<BTreeMap<String, VersionedDistributionConfig>>,
    pub transient_container_failures: Mutex<u8>,
    pub transient_query_status_failures: Mutex<u8>,
    pub created: Mutex<Vec<String>>,
    pub roles: Registry<DeliveryRole>,
    pub functions: Registry<HandlerFunction>,
    pub buses: Registry<EventBus>,
    pub bus_policies: Registry<BusPolicy>,
    pub rules: Registry<RoutingRule>,
    pub invoke_permissions: Registry<InvokePermission>,
}

impl FakePlatform {
    async fn record_creation(&self, resource: &impl Display) {
        self.created.lock().await.push(resource.to_string());
    }

    pub(crate) async fn created_count(&self) -> usize {
        self.created.lock().await.len()
    }

    pub(crate) async fn seed_load_balancer(&self, arn: &str) {
        self.load_balancers
            .lock()
            .await
            .insert(arn.to_owned(), BTreeMap::new());
    }

    pub(crate) async fn seed_web_acl(&self, arn: &str) {
        self.web_acls.lock().await.insert(arn.to_owned(), Vec::new());
    }

    pub(crate) async fn seed_distribution(&self, id: &str, config: DistributionConfig) {
        self.distributions.lock().await.insert(
            id.to_owned(),
            VersionedDistributionConfig {
                config,
                version_tag: "E1".to_owned(),
            },
        );
    }
}

fn ddl_table_name(query: &str) -> Option<(String, String)> {
    let qualified = query
        .strip_prefix("CREATE EXTERNAL TABLE IF NOT EXISTS ")?
        .split_whitespace()
        .next()?;
    let (database, table) = qualified.split_once('.')?;
    Some((database.to_owned(), table.to_lowercase()))
}

#[async_trait]
impl EnsurePresent<StorageContainer> for FakePlatform {
    async fn state(&self, resource: &StorageContainer) -> AppResult<ResourceState> {
        let mut failures = self.transient_container_failures.lock().await;
        if *failures > 0 {
            *failures -= 1;
            return Err(AppError::Transient("container lookup throttled".to_owned()));
        }
        drop(failures);

        Ok(self.containers.state(resource.name.clone(), resource).await)
    }

    async fn create(&self, resource: &StorageContainer) -> AppResult<()> {
        self.containers.put(resource.name.clone(), resource).await;
        self.record_creation(resource).await;
        Ok(())
    }
}

#[async_trait]
impl EnsurePresent<ContainerAccessPolicy> for FakePlatform {
    async fn state(&self, resource: &ContainerAccessPolicy) -> AppResult<ResourceState> {
        Ok(self
            .access_policies
            .state(resource.container.clone(), resource)
            .await)
    }

    async fn create(&self, resource: &ContainerAccessPolicy) -> AppResult<()> {
        self.access_policies
            .put(resource.container.clone(), resource)
            .await;
        self.record_creation(resource).await;
        Ok(())
    }
}

#[async_trait]
impl EnsurePresent<CatalogDatabase> for FakePlatform {
    async fn state(&self, resource: &CatalogDatabase) -> AppResult<ResourceState> {
        Ok(self
            .databases
            .state(format!("{}/{}", resource.region, resource.name), resource)
            .await)
    }

    async fn create(&self, resource: &CatalogDatabase) -> AppResult<()> {
        self.databases
            .put(format!("{}/{}", resource.region, resource.name), resource)
            .await;
        self.record_creation(resource).await;
        Ok(())
    }
}

#[async_trait]
impl CatalogTables for FakePlatform {
    async fn table_exists(&self, region: &Region, database: &str, table: &str) -> AppResult<bool> {
        Ok(self.tables.lock().await.contains(&(
            region.to_string(),
            database.to_owned(),
            table.to_owned(),
        )))
    }
}

#[async_trait]
impl QueryJobs for FakePlatform {
    async fn start_query(&self, region: &Region, request: QueryJobRequest) -> AppResult<String> {
        let succeeds = self
            .query_outcome
            .lock()
            .await
            .as_ref()
            .is_none_or(|status| *status == QueryJobStatus::Succeeded);
        if succeeds && let Some((database, table)) = ddl_table_name(&request.query) {
            self.tables
                .lock()
                .await
                .insert((region.to_string(), database.clone(), table.clone()));
            self.record_creation(&format!("table {database}.{table}")).await;
        }

        let mut queries = self.queries.lock().await;
        queries.push(request);
        Ok(format!("job-{}", queries.len()))
    }

    async fn query_status(&self, _region: &Region, _job_id: &str) -> AppResult<QueryJobStatus> {
        let mut failures = self.transient_query_status_failures.lock().await;
        if *failures > 0 {
            *failures -= 1;
            return Err(AppError::Transient("query status throttled".to_owned()));
        }
        drop(failures);

        Ok(self
            .query_outcome
            .lock()
            .await
            .clone()
            .unwrap_or(QueryJobStatus::Succeeded))
    }
}

#[async_trait]
impl LogDeliveryPlatform for FakePlatform {
    async fn load_balancer_attributes(
        &self,
        _region: &Region,
        load_balancer_arn: &str,
    ) -> AppResult<BTreeMap<String, String>> {
        self.load_balancers
            .lock()
            .await
            .get(load_balancer_arn)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("load balancer '{load_balancer_arn}'")))
    }

    async fn modify_load_balancer_attributes(
        &self,
        _region: &Region,
        load_balancer_arn: &str,
        attributes: Vec<LoadBalancerAttribute>,
    ) -> AppResult<()> {
        let mut load_balancers = self.load_balancers.lock().await;
        let current = load_balancers
            .get_mut(load_balancer_arn)
            .ok_or_else(|| AppError::NotFound(format!("load balancer '{load_balancer_arn}'")))?;
        for attribute in attributes {
            current.insert(attribute.key, attribute.value);
        }
        drop(load_balancers);

        self.record_creation(&format!("attributes of {load_balancer_arn}"))
            .await;
        Ok(())
    }

    async fn web_acl_log_destinations(
        &self,
        _region: &Region,
        web_acl_arn: &str,
    ) -> AppResult<Vec<String>> {
        match self.web_acls.lock().await.get(web_acl_arn) {
            Some(destinations) if !destinations.is_empty() => Ok(destinations.clone()),
            _ => Err(AppError::NotFound(format!(
                "logging configuration for '{web_acl_arn}'"
            ))),
        }
    }

    async fn put_web_acl_log_destinations(
        &self,
        _region: &Region,
        web_acl_arn: &str,
        destinations: Vec<String>,
    ) -> AppResult<()> {
        self.web_acls
            .lock()
            .await
            .insert(web_acl_arn.to_owned(), destinations);
        self.record_creation(&format!("logging of {web_acl_arn}"))
            .await;
        Ok(())
    }

    async fn distribution_config(
        &self,
        distribution_id: &str,
    ) -> AppResult<VersionedDistributionConfig> {
        self.distributions
            .lock()
            .await
            .get(distribution_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("distribution '{distribution_id}'")))
    }

    async fn update_distribution_config(
        &self,
        distribution_id: &str,
        config: DistributionConfig,
        version_tag: &str,
    ) -> AppResult<()> {
        let mut distributions = self.distributions.lock().await;
        let current = distributions
            .get_mut(distribution_id)
            .ok_or_else(|| AppError::NotFound(format!("distribution '{distribution_id}'")))?;
        if current.version_tag != version_tag {
            return Err(AppError::Conflict("stale distribution version".to_owned()));
        }
        current.config = config;
        current.version_tag = format!("{version_tag}x");
        drop(distributions);

        self.record_creation(&format!("logging of {distribution_id}"))
            .await;
        Ok(())
    }
}

macro_rules! registry_port {
    ($resource:ty, $field:ident, |$item:ident| $key:expr) => {
        #[async_trait]
        impl EnsurePresent<$resource> for FakePlatform {
            async fn state(&self, $item: &$resource) -> AppResult<ResourceState> {
                Ok(self.$field.state($key, $item).await)
            }

            async fn create(&self, $item: &$resource) -> AppResult<()> {
                self.$field.put($key, $item).await;
                self.record_creation($item).await;
                Ok(())
            }
        }
    };
}

registry_port!(DeliveryRole, roles, |role| role.name.clone());
registry_port!(HandlerFunction, functions, |function| format!(
    "{}/{}",
    function.region, function.name
));
registry_port!(EventBus, buses, |bus| format!("{}/{}", bus.region, bus.name));
registry_port!(BusPolicy, bus_policies, |policy| format!(
    "{}/{}",
    policy.region, policy.bus_name
));
registry_port!(RoutingRule, rules, |rule| format!(
    "{}/{}/{}",
    rule.region,
    rule.bus_name.as_deref().unwrap_or("default"),
    rule.name
));
registry_port!(InvokePermission, invoke_permissions, |permission| format!(
    "{}/{}/{}",
    permission.region, permission.function_name, permission.statement_id
));
