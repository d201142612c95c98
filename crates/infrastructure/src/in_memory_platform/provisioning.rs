use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use loglake_application::{
    AccessGrant, CatalogDatabase, CatalogTables, ContainerAccessPolicy, DistributionConfig,
    EnsurePresent, LoadBalancerAttribute, LogDeliveryPlatform, QueryJobRequest, QueryJobStatus,
    QueryJobs, ResourceState, StorageContainer, VersionedDistributionConfig,
};
use loglake_core::{AppError, AppResult, Region};
use loglake_domain::container_from_storage_arn;
use tracing::debug;
use uuid::Uuid;

use super::state::{ContainerState, DatabaseState, QueryJobState, TableState};
use super::{InMemoryPlatform, new_version_tag};

const DDL_PREFIX: &str = "CREATE EXTERNAL TABLE IF NOT EXISTS ";

/// Extracts `(database, lower-cased table)` from a table DDL statement.
fn ddl_target(query: &str) -> Option<(String, String)> {
    let qualified = query.strip_prefix(DDL_PREFIX)?.split_whitespace().next()?;
    let (database, table) = qualified.split_once('.')?;
    if database.is_empty() || table.is_empty() {
        return None;
    }

    Some((database.to_owned(), table.to_lowercase()))
}

fn state_of(present: bool) -> ResourceState {
    if present {
        ResourceState::Present
    } else {
        ResourceState::Absent
    }
}

#[async_trait]
impl EnsurePresent<StorageContainer> for InMemoryPlatform {
    async fn state(&self, resource: &StorageContainer) -> AppResult<ResourceState> {
        Ok(state_of(
            self.state.read().await.containers.contains_key(&resource.name),
        ))
    }

    async fn create(&self, resource: &StorageContainer) -> AppResult<()> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.containers.get(&resource.name) {
            return Err(AppError::Conflict(format!(
                "storage container '{}' already exists in region '{}'",
                resource.name, existing.region
            )));
        }

        state.containers.insert(
            resource.name.clone(),
            ContainerState {
                region: resource.region.clone(),
                created_at: Utc::now(),
                object_ownership: None,
                canned_acl: None,
                policy: None,
            },
        );
        Ok(())
    }
}

#[async_trait]
impl EnsurePresent<ContainerAccessPolicy> for InMemoryPlatform {
    async fn state(&self, resource: &ContainerAccessPolicy) -> AppResult<ResourceState> {
        let state = self.state.read().await;
        let Some(container) = state.containers.get(&resource.container) else {
            return Ok(ResourceState::Absent);
        };

        let present = match &resource.grant {
            AccessGrant::LogDeliveryAcl {
                object_ownership,
                canned_acl,
            } => {
                container.object_ownership.as_ref() == Some(object_ownership)
                    && container.canned_acl.as_ref() == Some(canned_acl)
            }
            AccessGrant::ResourcePolicy { document } => container
                .policy
                .as_ref()
                .is_some_and(|policy| policy.contains_statements_of(document)),
        };

        Ok(state_of(present))
    }

    async fn create(&self, resource: &ContainerAccessPolicy) -> AppResult<()> {
        let mut state = self.state.write().await;
        let container = state.containers.get_mut(&resource.container).ok_or_else(|| {
            AppError::NotFound(format!(
                "storage container '{}' does not exist",
                resource.container
            ))
        })?;

        match &resource.grant {
            AccessGrant::LogDeliveryAcl {
                object_ownership,
                canned_acl,
            } => {
                container.object_ownership = Some(object_ownership.clone());
                container.canned_acl = Some(canned_acl.clone());
            }
            AccessGrant::ResourcePolicy { document } => {
                let merged = match container.policy.take() {
                    Some(policy) => policy.merged_with(document),
                    None => document.clone(),
                };
                debug!(
                    container = %resource.container,
                    statements = merged.statements.len(),
                    "container policy updated"
                );
                container.policy = Some(merged);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl EnsurePresent<CatalogDatabase> for InMemoryPlatform {
    async fn state(&self, resource: &CatalogDatabase) -> AppResult<ResourceState> {
        let state = self.state.read().await;
        let present = state
            .catalogs
            .get(resource.region.as_str())
            .is_some_and(|databases| databases.contains_key(&resource.name));

        Ok(state_of(present))
    }

    async fn create(&self, resource: &CatalogDatabase) -> AppResult<()> {
        let mut state = self.state.write().await;
        let databases = state
            .catalogs
            .entry(resource.region.to_string())
            .or_default();
        if databases.contains_key(&resource.name) {
            return Err(AppError::Conflict(format!(
                "catalog database '{}' already exists",
                resource.name
            )));
        }

        databases.insert(
            resource.name.clone(),
            DatabaseState {
                created_at: Utc::now(),
                tables: BTreeMap::new(),
            },
        );
        Ok(())
    }
}

#[async_trait]
impl CatalogTables for InMemoryPlatform {
    async fn table_exists(&self, region: &Region, database: &str, table: &str) -> AppResult<bool> {
        let state = self.state.read().await;
        let databases = state.catalogs.get(region.as_str());
        let Some(database_state) = databases.and_then(|databases| databases.get(database)) else {
            return Err(AppError::NotFound(format!(
                "catalog database '{database}' does not exist in region '{region}'"
            )));
        };

        Ok(database_state.tables.contains_key(table))
    }
}

#[async_trait]
impl QueryJobs for InMemoryPlatform {
    async fn start_query(&self, region: &Region, request: QueryJobRequest) -> AppResult<String> {
        let mut state = self.state.write().await;
        let job_id = Uuid::new_v4().to_string();

        let status = match ddl_target(&request.query) {
            None => QueryJobStatus::Failed("only CREATE EXTERNAL TABLE statements are supported".to_owned()),
            Some((database, table)) => {
                match state
                    .catalogs
                    .get_mut(region.as_str())
                    .and_then(|databases| databases.get_mut(&database))
                {
                    None => QueryJobStatus::Failed(format!(
                        "database '{database}' does not exist in region '{region}'"
                    )),
                    Some(database_state) => {
                        database_state
                            .tables
                            .entry(table)
                            .or_insert_with(|| TableState {
                                ddl: request.query.clone(),
                                created_at: Utc::now(),
                            });
                        QueryJobStatus::Succeeded
                    }
                }
            }
        };

        debug!(job_id = %job_id, region = %region, status = ?status, "query job finished");
        state.query_jobs.insert(
            job_id.clone(),
            QueryJobState {
                region: region.clone(),
                query: request.query,
                output_location: request.output_location,
                status,
                submitted_at: Utc::now(),
            },
        );

        Ok(job_id)
    }

    async fn query_status(&self, _region: &Region, job_id: &str) -> AppResult<QueryJobStatus> {
        self.state
            .read()
            .await
            .query_jobs
            .get(job_id)
            .map(|job| job.status.clone())
            .ok_or_else(|| AppError::NotFound(format!("query job '{job_id}' does not exist")))
    }
}

#[async_trait]
impl LogDeliveryPlatform for InMemoryPlatform {
    async fn load_balancer_attributes(
        &self,
        _region: &Region,
        load_balancer_arn: &str,
    ) -> AppResult<BTreeMap<String, String>> {
        self.state
            .read()
            .await
            .load_balancers
            .get(load_balancer_arn)
            .map(|load_balancer| load_balancer.attributes.clone())
            .ok_or_else(|| {
                AppError::NotFound(format!("load balancer '{load_balancer_arn}' does not exist"))
            })
    }

    async fn modify_load_balancer_attributes(
        &self,
        _region: &Region,
        load_balancer_arn: &str,
        attributes: Vec<LoadBalancerAttribute>,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;

        if let Some(missing) = attributes.iter().find(|attribute| {
            attribute.key.ends_with(".s3.bucket") && !state.containers.contains_key(&attribute.value)
        }) {
            return Err(AppError::Validation(format!(
                "log container '{}' does not exist",
                missing.value
            )));
        }

        let load_balancer = state.load_balancers.get_mut(load_balancer_arn).ok_or_else(|| {
            AppError::NotFound(format!("load balancer '{load_balancer_arn}' does not exist"))
        })?;
        for attribute in attributes {
            load_balancer.attributes.insert(attribute.key, attribute.value);
        }

        Ok(())
    }

    async fn web_acl_log_destinations(
        &self,
        _region: &Region,
        web_acl_arn: &str,
    ) -> AppResult<Vec<String>> {
        let state = self.state.read().await;
        match state.web_acls.get(web_acl_arn) {
            Some(web_acl) if !web_acl.log_destinations.is_empty() => {
                Ok(web_acl.log_destinations.clone())
            }
            Some(_) => Err(AppError::NotFound(format!(
                "web ACL '{web_acl_arn}' has no logging configuration"
            ))),
            None => Err(AppError::NotFound(format!(
                "web ACL '{web_acl_arn}' does not exist"
            ))),
        }
    }

    async fn put_web_acl_log_destinations(
        &self,
        _region: &Region,
        web_acl_arn: &str,
        destinations: Vec<String>,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;

        if let Some(missing) = destinations.iter().find(|destination| {
            container_from_storage_arn(destination)
                .is_none_or(|container| !state.containers.contains_key(container))
        }) {
            return Err(AppError::Validation(format!(
                "log destination '{missing}' is not an existing storage container"
            )));
        }

        let web_acl = state.web_acls.get_mut(web_acl_arn).ok_or_else(|| {
            AppError::NotFound(format!("web ACL '{web_acl_arn}' does not exist"))
        })?;
        web_acl.log_destinations = destinations;

        Ok(())
    }

    async fn distribution_config(
        &self,
        distribution_id: &str,
    ) -> AppResult<VersionedDistributionConfig> {
        self.state
            .read()
            .await
            .distributions
            .get(distribution_id)
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!("distribution '{distribution_id}' does not exist"))
            })
    }

    async fn update_distribution_config(
        &self,
        distribution_id: &str,
        config: DistributionConfig,
        version_tag: &str,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        let distribution = state.distributions.get_mut(distribution_id).ok_or_else(|| {
            AppError::NotFound(format!("distribution '{distribution_id}' does not exist"))
        })?;

        if distribution.version_tag != version_tag {
            return Err(AppError::Conflict(format!(
                "distribution '{distribution_id}' changed since version '{version_tag}'"
            )));
        }

        distribution.config = config;
        distribution.version_tag = new_version_tag();
        Ok(())
    }
}
