use std::fmt::{Display, Formatter};
use std::time::Duration;

use async_trait::async_trait;
use loglake_core::{AppError, Region};
use loglake_domain::{CatalogEntry, Destination, render_table_ddl, schema_for};
use tracing::warn;

use crate::ensure::{EnsurePresent, ResourceState, ensure_present};
use crate::provisioning_ports::{
    CatalogDatabase, CatalogTables, QueryJobRequest, QueryJobStatus, QueryJobs,
};

use super::*;

/// Queryable table over one log variant, created through a DDL query job.
struct CatalogTable {
    region: Region,
    entry: CatalogEntry,
    ddl: String,
    output_location: String,
}

impl Display for CatalogTable {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "catalog table {} ({})", self.entry, self.region)
    }
}

/// Creates tables by running their DDL on the query engine.
struct DdlTableCreator<'a> {
    tables: &'a dyn CatalogTables,
    queries: &'a dyn QueryJobs,
    retry: RetryPolicy,
}

#[async_trait]
impl<'a> EnsurePresent<CatalogTable> for DdlTableCreator<'a> {
    async fn state(&self, table: &CatalogTable) -> AppResult<ResourceState> {
        let exists = self
            .tables
            .table_exists(&table.region, table.entry.database(), &table.entry.lookup_table())
            .await?;

        Ok(if exists {
            ResourceState::Present
        } else {
            ResourceState::Absent
        })
    }

    async fn create(&self, table: &CatalogTable) -> AppResult<()> {
        let job_id = self
            .queries
            .start_query(
                &table.region,
                QueryJobRequest {
                    query: table.ddl.clone(),
                    output_location: table.output_location.clone(),
                },
            )
            .await?;

        self.await_query_job(table, &job_id).await
    }
}

impl DdlTableCreator<'_> {
    /// Reads the job status, retrying throttled reads. A status that stays
    /// unreadable is not retryable, so the job is never submitted twice.
    async fn query_status(&self, table: &CatalogTable, job_id: &str) -> AppResult<QueryJobStatus> {
        self.retry
            .run("read query job status", || {
                self.queries.query_status(&table.region, job_id)
            })
            .await
            .map_err(|error| {
                if error.is_retryable() {
                    AppError::Internal(format!(
                        "status of query job '{job_id}' creating {} is unavailable: {error}",
                        table.entry
                    ))
                } else {
                    error
                }
            })
    }

    async fn await_query_job(&self, table: &CatalogTable, job_id: &str) -> AppResult<()> {
        for attempt in 1..=self.retry.max_attempts() {
            match self.query_status(table, job_id).await? {
                QueryJobStatus::Succeeded => return Ok(()),
                QueryJobStatus::Failed(reason) => {
                    return Err(AppError::Internal(format!(
                        "query job '{job_id}' creating {} failed: {reason}",
                        table.entry
                    )));
                }
                QueryJobStatus::Cancelled => {
                    return Err(AppError::Internal(format!(
                        "query job '{job_id}' creating {} was cancelled",
                        table.entry
                    )));
                }
                QueryJobStatus::Queued | QueryJobStatus::Running => {
                    let delay = self.retry.backoff_ms().saturating_mul(u64::from(attempt));
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
            }
        }

        warn!(
            job_id,
            table = %table.entry,
            "query job still running after polling budget, continuing"
        );
        Ok(())
    }
}

impl ProvisioningService {
    pub(super) async fn ensure_catalog(
        &self,
        descriptor: &LogEnablementDescriptor,
        destination: &Destination,
        report: &mut ProvisioningReport,
    ) -> AppResult<()> {
        let creator = DdlTableCreator {
            tables: self.ports.catalog_tables.as_ref(),
            queries: self.ports.query_jobs.as_ref(),
            retry: self.retry,
        };

        for variant in descriptor.log_variants() {
            let schema = schema_for(descriptor.resource_kind(), variant).ok_or_else(|| {
                AppError::Internal(format!(
                    "no table schema for '{}' logs of resource kind '{}'",
                    variant,
                    descriptor.resource_kind()
                ))
            })?;
            let entry = CatalogEntry::derive(
                descriptor.resource_kind(),
                variant,
                descriptor.resource_identity(),
            )?;

            let database = CatalogDatabase {
                region: descriptor.region().clone(),
                name: entry.database().to_owned(),
            };
            let outcome = ensure_present(self.ports.catalog_databases.as_ref(), &database, &self.retry)
                .await
                .map_err(|error| error.context(ProvisioningStep::CatalogDatabase))?;
            report.record(ProvisioningStep::CatalogDatabase, database.to_string(), outcome);

            let table = CatalogTable {
                region: descriptor.region().clone(),
                ddl: render_table_ddl(&entry, schema, destination),
                output_location: destination.query_results_uri(),
                entry,
            };
            let outcome = ensure_present(&creator, &table, &self.retry)
                .await
                .map_err(|error| error.context(ProvisioningStep::CatalogTable))?;
            report.record(ProvisioningStep::CatalogTable, table.to_string(), outcome);
        }

        Ok(())
    }
}
