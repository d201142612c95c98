use loglake_core::{AccountId, AppResult, Region};
use loglake_domain::{
    COMPUTE_SERVICE, DEFAULT_HANDLER_FUNCTION_NAME, EVENT_ROUTER_SERVICE, EventPattern,
    HANDLER_ROLE_NAME, INTAKE_BUS_NAME, INTAKE_RULE_NAME, LOCAL_DELIVERY_ROLE_NAME,
    LOCAL_FORWARDING_RULE_NAME, PolicyDocument, PolicyStatement, Principal, RoutingTopology,
    bus_rule_arn, cross_region_role_name, event_bus_arn, forwarding_rule_name, function_arn,
    role_arn, service_trust_policy,
};
use serde::Serialize;
use tracing::info;

use crate::ensure::{RetryPolicy, StepOutcome, ensure_present};
use crate::routing_ports::{
    BusPolicy, DeliveryRole, EventBus, HandlerFunction, InvokePermission, RoutingPorts,
    RoutingRule, RuleTarget,
};

/// Handler function settings used when deploying the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerDeployment {
    /// Function name.
    pub function_name: String,
    /// Opaque code artifact reference.
    pub artifact: String,
    /// Invocation timeout.
    pub timeout_seconds: u32,
    /// Memory allocation.
    pub memory_mb: u32,
}

impl HandlerDeployment {
    /// Creates handler settings with the default timeout and memory.
    #[must_use]
    pub fn new(function_name: Option<String>, artifact: impl Into<String>) -> Self {
        Self {
            function_name: function_name
                .unwrap_or_else(|| DEFAULT_HANDLER_FUNCTION_NAME.to_owned()),
            artifact: artifact.into(),
            timeout_seconds: 300,
            memory_mb: 256,
        }
    }
}

/// Outcome of one deployed routing resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingRecord {
    /// Resource label.
    pub resource: String,
    /// What the deployment did.
    pub outcome: StepOutcome,
}

/// Ordered outcomes of one router deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoutingReport {
    records: Vec<RoutingRecord>,
}

impl RoutingReport {
    fn record(&mut self, resource: String, outcome: StepOutcome) {
        self.records.push(RoutingRecord { resource, outcome });
    }

    /// Returns outcomes in deployment order.
    #[must_use]
    pub fn records(&self) -> &[RoutingRecord] {
        &self.records
    }

    /// Returns how many resources were created or replaced.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.outcome == StepOutcome::Created)
            .count()
    }
}

/// Deploys the hub-and-spoke event routing topology.
#[derive(Clone)]
pub struct RoutingService {
    ports: RoutingPorts,
    account_id: AccountId,
    retry: RetryPolicy,
}

impl RoutingService {
    /// Creates a routing service for one account.
    #[must_use]
    pub fn new(ports: RoutingPorts, account_id: AccountId, retry: RetryPolicy) -> Self {
        Self {
            ports,
            account_id,
            retry,
        }
    }

    /// Ensures the handler, intake bus, and every forwarding rule exist.
    pub async fn deploy(
        &self,
        topology: &RoutingTopology,
        handler: &HandlerDeployment,
    ) -> AppResult<RoutingReport> {
        let central = topology.central_region();
        let bus_arn = event_bus_arn(central, &self.account_id, INTAKE_BUS_NAME);
        let pattern = EventPattern::log_enablement();
        let mut report = RoutingReport::default();

        info!(
            central_region = %central,
            source_regions = topology.source_regions().len(),
            "deploying log enablement routing"
        );

        let handler_role = DeliveryRole {
            name: HANDLER_ROLE_NAME.to_owned(),
            trust: service_trust_policy(COMPUTE_SERVICE),
            permissions: handler_permissions(),
        };
        let outcome = ensure_present(self.ports.roles.as_ref(), &handler_role, &self.retry).await?;
        report.record(handler_role.to_string(), outcome);

        let function = HandlerFunction {
            region: central.clone(),
            name: handler.function_name.clone(),
            role_arn: role_arn(&self.account_id, HANDLER_ROLE_NAME),
            artifact: handler.artifact.clone(),
            timeout_seconds: handler.timeout_seconds,
            memory_mb: handler.memory_mb,
        };
        let outcome = ensure_present(self.ports.functions.as_ref(), &function, &self.retry).await?;
        report.record(function.to_string(), outcome);

        let bus = EventBus {
            region: central.clone(),
            name: INTAKE_BUS_NAME.to_owned(),
        };
        let outcome = ensure_present(self.ports.buses.as_ref(), &bus, &self.retry).await?;
        report.record(bus.to_string(), outcome);

        let bus_policy = BusPolicy {
            region: central.clone(),
            bus_name: INTAKE_BUS_NAME.to_owned(),
            document: PolicyDocument::new(vec![
                PolicyStatement::allow(["events:PutEvents"], [bus_arn.clone()])
                    .with_sid("AllowCrossRegionEvents")
                    .with_principal(Principal::Account(format!(
                        "arn:aws:iam::{}:root",
                        self.account_id
                    ))),
            ]),
        };
        let outcome = ensure_present(self.ports.bus_policies.as_ref(), &bus_policy, &self.retry).await?;
        report.record(bus_policy.to_string(), outcome);

        let intake_rule = RoutingRule {
            region: central.clone(),
            bus_name: Some(INTAKE_BUS_NAME.to_owned()),
            name: INTAKE_RULE_NAME.to_owned(),
            pattern: pattern.clone(),
            target: RuleTarget {
                id: "1".to_owned(),
                arn: function_arn(central, &self.account_id, &function.name),
                role_arn: None,
            },
        };
        let outcome = ensure_present(self.ports.rules.as_ref(), &intake_rule, &self.retry).await?;
        report.record(intake_rule.to_string(), outcome);

        let invoke_permission = InvokePermission {
            region: central.clone(),
            function_name: function.name.clone(),
            statement_id: format!("EventBridge-{INTAKE_RULE_NAME}"),
            principal: EVENT_ROUTER_SERVICE.to_owned(),
            source_arn: bus_rule_arn(central, &self.account_id, INTAKE_BUS_NAME, INTAKE_RULE_NAME),
        };
        let outcome = ensure_present(
            self.ports.invoke_permissions.as_ref(),
            &invoke_permission,
            &self.retry,
        )
        .await?;
        report.record(invoke_permission.to_string(), outcome);

        self.ensure_forwarding(
            central,
            LOCAL_DELIVERY_ROLE_NAME,
            LOCAL_FORWARDING_RULE_NAME,
            &bus_arn,
            &pattern,
            &mut report,
        )
        .await?;

        for source in topology.forwarding_regions() {
            self.ensure_forwarding(
                source,
                &cross_region_role_name(source),
                &forwarding_rule_name(central),
                &bus_arn,
                &pattern,
                &mut report,
            )
            .await?;
        }

        info!(
            created = report.created_count(),
            resources = report.records().len(),
            "log enablement routing deployed"
        );

        Ok(report)
    }

    /// Ensures a delivery role and a default-bus rule forwarding to the intake bus.
    async fn ensure_forwarding(
        &self,
        region: &Region,
        role_name: &str,
        rule_name: &str,
        bus_arn: &str,
        pattern: &EventPattern,
        report: &mut RoutingReport,
    ) -> AppResult<()> {
        let role = DeliveryRole {
            name: role_name.to_owned(),
            trust: service_trust_policy(EVENT_ROUTER_SERVICE),
            permissions: PolicyDocument::new(vec![PolicyStatement::allow(
                ["events:PutEvents"],
                [bus_arn],
            )]),
        };
        let outcome = ensure_present(self.ports.roles.as_ref(), &role, &self.retry).await?;
        report.record(role.to_string(), outcome);

        let rule = RoutingRule {
            region: region.clone(),
            bus_name: None,
            name: rule_name.to_owned(),
            pattern: pattern.clone(),
            target: RuleTarget {
                id: "1".to_owned(),
                arn: bus_arn.to_owned(),
                role_arn: Some(role_arn(&self.account_id, role_name)),
            },
        };
        let outcome = ensure_present(self.ports.rules.as_ref(), &rule, &self.retry).await?;
        report.record(rule.to_string(), outcome);

        Ok(())
    }
}

fn handler_permissions() -> PolicyDocument {
    PolicyDocument::new(vec![
        PolicyStatement::allow(
            [
                "logs:CreateLogGroup",
                "logs:CreateLogStream",
                "logs:PutLogEvents",
            ],
            ["arn:aws:logs:*:*:*"],
        ),
        PolicyStatement::allow(
            [
                "glue:CreateDatabase",
                "glue:GetDatabase",
                "glue:CreateTable",
                "glue:GetTable",
                "athena:StartQueryExecution",
                "athena:GetQueryExecution",
            ],
            ["*"],
        ),
        PolicyStatement::allow(
            [
                "s3:GetBucketLocation",
                "s3:GetObject",
                "s3:ListBucket",
                "s3:PutObject",
            ],
            ["arn:aws:s3:::*-logs-*", "arn:aws:s3:::*-logs-*/*"],
        ),
        PolicyStatement::allow(
            [
                "s3:CreateBucket",
                "s3:GetBucketPolicy",
                "s3:PutBucketPolicy",
                "s3:PutBucketOwnershipControls",
                "s3:GetBucketAcl",
                "s3:PutBucketAcl",
            ],
            ["arn:aws:s3:::*-logs-*"],
        ),
        PolicyStatement::allow(
            [
                "elasticloadbalancing:DescribeLoadBalancerAttributes",
                "elasticloadbalancing:ModifyLoadBalancerAttributes",
                "wafv2:GetLoggingConfiguration",
                "wafv2:PutLoggingConfiguration",
                "cloudfront:GetDistributionConfig",
                "cloudfront:UpdateDistribution",
            ],
            ["*"],
        ),
    ])
}
