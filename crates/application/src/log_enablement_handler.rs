use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info};

use crate::event_interpreter::interpret_value;
use crate::provisioning_service::ProvisioningService;

/// Invocation result in the compute runtime's response shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerResponse {
    /// HTTP-style status code.
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// JSON document serialized as a string.
    pub body: String,
}

impl HandlerResponse {
    fn new(status_code: u16, body: &Value) -> Self {
        Self {
            status_code,
            body: body.to_string(),
        }
    }
}

/// Entry point for routed audit events.
#[derive(Clone)]
pub struct LogEnablementHandler {
    provisioning: ProvisioningService,
}

impl LogEnablementHandler {
    /// Creates a handler.
    #[must_use]
    pub fn new(provisioning: ProvisioningService) -> Self {
        Self { provisioning }
    }

    /// Interprets an event and provisions its log pipeline.
    ///
    /// Events that do not enable logging answer 200 with no action; provisioning
    /// failures answer 500.
    pub async fn handle(&self, event: Value) -> HandlerResponse {
        let Some(descriptor) = interpret_value(event) else {
            info!("event does not indicate logging was enabled, skipping");
            return HandlerResponse::new(200, &json!({ "message": "No action needed" }));
        };

        match self.provisioning.provision(&descriptor).await {
            Ok(report) => HandlerResponse::new(
                200,
                &json!({
                    "message": "Log pipeline provisioned",
                    "service": descriptor.resource_kind().tag(),
                    "region": descriptor.region().as_str(),
                    "resource": descriptor.resource_identity(),
                    "created": report.created_resources(),
                }),
            ),
            Err(provision_error) => {
                error!(
                    resource = descriptor.resource_identity(),
                    error = %provision_error,
                    "log pipeline provisioning failed"
                );

                let mut body = json!({ "error": provision_error.to_string() });
                if provision_error.requires_manual_intervention() {
                    body["manual_intervention"] = Value::Bool(true);
                }
                HandlerResponse::new(500, &body)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{Value, json};

    use crate::ensure::RetryPolicy;
    use crate::provisioning_ports::{DistributionConfig, DistributionOrigin, ProvisioningPorts};
    use crate::provisioning_service::ProvisioningService;
    use crate::test_support::FakePlatform;

    use super::LogEnablementHandler;

    fn handler(platform: &Arc<FakePlatform>) -> LogEnablementHandler {
        LogEnablementHandler::new(ProvisioningService::new(
            ProvisioningPorts::from_platform(platform.clone()),
            RetryPolicy::no_retry(),
        ))
    }

    fn distribution_event() -> Value {
        json!({
            "detail": {
                "eventName": "UpdateDistribution",
                "awsRegion": "us-east-1",
                "recipientAccountId": "111122223333",
                "requestParameters": {
                    "distributionConfig": {
                        "logging": {
                            "enabled": true,
                            "bucket": "cf-logs.s3.amazonaws.com",
                            "prefix": "cdn/"
                        }
                    }
                },
                "responseElements": { "distribution": { "id": "E2QWRUHAPOMQZL" } }
            }
        })
    }

    fn body(response: &super::HandlerResponse) -> Value {
        serde_json::from_str(&response.body).unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn irrelevant_event_needs_no_action() {
        let platform = Arc::new(FakePlatform::default());
        let response = handler(&platform)
            .handle(json!({ "detail": { "eventName": "CreateBucket", "awsRegion": "us-east-1", "recipientAccountId": "1" } }))
            .await;

        assert_eq!(response.status_code, 200);
        assert_eq!(body(&response), json!({ "message": "No action needed" }));
    }

    #[tokio::test]
    async fn handled_event_reports_created_resources() {
        let platform = Arc::new(FakePlatform::default());
        platform
            .seed_distribution("E2QWRUHAPOMQZL", DistributionConfig::default())
            .await;

        let response = handler(&platform).handle(distribution_event()).await;
        let body = body(&response);

        assert_eq!(response.status_code, 200);
        assert_eq!(body["service"], "cloudfront");
        assert_eq!(body["region"], "us-east-1");
        assert_eq!(body["resource"], "E2QWRUHAPOMQZL");
        assert!(
            body["created"]
                .as_array()
                .is_some_and(|created| created
                    .iter()
                    .any(|label| label == "catalog table cloudfront_access_logs_db.cloudfront_E2QWRUHAPOMQZL (us-east-1)"))
        );
    }

    #[tokio::test]
    async fn private_origin_is_flagged_for_manual_intervention() {
        let platform = Arc::new(FakePlatform::default());
        platform
            .seed_distribution(
                "E2QWRUHAPOMQZL",
                DistributionConfig {
                    origins: vec![DistributionOrigin {
                        id: "vpc-origin".to_owned(),
                        custom_origin_config: None,
                        s3_origin_config: None,
                    }],
                    ..DistributionConfig::default()
                },
            )
            .await;

        let response = handler(&platform).handle(distribution_event()).await;
        let body = body(&response);

        assert_eq!(response.status_code, 500);
        assert_eq!(body["manual_intervention"], true);
        assert!(body["error"].as_str().is_some_and(|error| error.contains("vpc-origin")));
    }

    #[test]
    fn response_uses_runtime_field_names() {
        let response = super::HandlerResponse::new(200, &json!({ "message": "ok" }));
        let encoded = serde_json::to_value(&response).unwrap_or_else(|_| unreachable!());
        assert_eq!(encoded["statusCode"], 200);
        assert_eq!(encoded["body"], r#"{"message":"ok"}"#);
    }
}
