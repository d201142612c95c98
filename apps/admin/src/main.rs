//! Loglake administration CLI.
//!
//! Deploys the cross-region event routing, registers platform inventory and
//! enrolls existing resources into managed log pipelines.

#![forbid(unsafe_code)]

mod admin_config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use loglake_application::{
    EnrollmentRequest, EnrollmentService, ProvisioningService, RoutingService, StepOutcome,
};
use loglake_core::{AppError, AppResult};
use loglake_domain::region_from_arn;
use loglake_infrastructure::{InMemoryPlatform, platform_ports};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::admin_config::{AdminConfig, DeploymentDocument, InventoryDocument, read_document};

/// Loglake administration commands.
#[derive(Parser, Debug)]
#[command(name = "loglake-admin")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Deploy the intake bus, handler and forwarding rules
    Deploy {
        /// Deployment document (YAML)
        topology: PathBuf,
    },
    /// Register existing load balancers, web ACLs and distributions
    Register {
        /// Inventory document (YAML)
        inventory: PathBuf,
    },
    /// Enable managed log pipelines for a batch of resources
    Enroll {
        /// Enrollment document (YAML)
        resources: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let config = AdminConfig::load()?;
    let platform = Arc::new(InMemoryPlatform::load(&config.state_file).await?);

    let outcome = match &args.command {
        Command::Deploy { topology } => deploy(&platform, &config, topology).await,
        Command::Register { inventory } => register(&platform, inventory).await,
        Command::Enroll { resources } => enroll(&platform, &config, resources).await,
    };

    platform.save(&config.state_file).await?;
    outcome
}

async fn deploy(
    platform: &Arc<InMemoryPlatform>,
    config: &AdminConfig,
    path: &Path,
) -> AppResult<()> {
    let document: DeploymentDocument = read_document(path).await?;
    let topology = document.topology()?;
    let handler = document.handler()?;

    let (_, routing_ports) = platform_ports(platform);
    let service = RoutingService::new(routing_ports, config.account_id.clone(), config.retry);
    let report = service.deploy(&topology, &handler).await?;

    for record in report.records() {
        let status = match record.outcome {
            StepOutcome::Created => "created",
            StepOutcome::AlreadyPresent => "already present",
            StepOutcome::NotRequired => "not required",
        };
        println!("{status:>16}  {}", record.resource);
    }

    info!(
        central_region = %topology.central_region(),
        source_regions = topology.source_regions().len(),
        created = report.created_count(),
        "routing deployed"
    );
    Ok(())
}

async fn register(platform: &Arc<InMemoryPlatform>, path: &Path) -> AppResult<()> {
    let inventory: InventoryDocument = read_document(path).await?;

    for arn in &inventory.load_balancers {
        let region = region_from_arn(arn).map_err(|error| error.context("load balancer"))?;
        platform.register_load_balancer(region, arn.as_str()).await;
    }
    for arn in &inventory.web_acls {
        let region = region_from_arn(arn).map_err(|error| error.context("web ACL"))?;
        platform.register_web_acl(region, arn.as_str()).await;
    }
    for distribution in &inventory.distributions {
        platform
            .register_distribution(distribution.id.as_str(), distribution.origins.clone())
            .await;
    }

    info!(
        load_balancers = inventory.load_balancers.len(),
        web_acls = inventory.web_acls.len(),
        distributions = inventory.distributions.len(),
        "inventory registered"
    );
    Ok(())
}

async fn enroll(
    platform: &Arc<InMemoryPlatform>,
    config: &AdminConfig,
    path: &Path,
) -> AppResult<()> {
    let request: EnrollmentRequest = read_document(path).await?;

    let (provisioning_ports, _) = platform_ports(platform);
    let service = EnrollmentService::new(
        ProvisioningService::new(provisioning_ports, config.retry),
        config.account_id.clone(),
    );
    let summary = service.enroll(&request).await;

    let rendered = serde_yaml::to_string(&summary)
        .map_err(|error| AppError::Internal(format!("failed to render summary: {error}")))?;
    print!("{rendered}");

    if summary.failed.is_empty() {
        Ok(())
    } else {
        warn!(failed = summary.failed.len(), "enrollment finished with failures");
        Err(AppError::Internal(format!(
            "{} of {} resources failed to enroll",
            summary.failed.len(),
            summary.failed.len() + summary.succeeded.len()
        )))
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
