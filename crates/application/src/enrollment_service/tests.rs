use std::sync::Arc;

use loglake_core::AccountId;

use crate::ensure::RetryPolicy;
use crate::provisioning_ports::{DistributionConfig, ProvisioningPorts};
use crate::provisioning_service::ProvisioningService;
use crate::test_support::FakePlatform;

use super::{
    DistributionEnrollment, EnrollmentRequest, EnrollmentService, LoadBalancerEnrollment,
    LoadBalancerLogSelection, WebAclEnrollment,
};

const LOAD_BALANCER_ARN: &str =
    "arn:aws:elasticloadbalancing:eu-west-1:111122223333:loadbalancer/app/shop-api/50dc6c495c0c9188";
const WEB_ACL_ARN: &str = "arn:aws:wafv2:eu-west-1:111122223333:regional/webacl/shop-acl/a1b2c3d4";

fn service(platform: &Arc<FakePlatform>) -> EnrollmentService {
    EnrollmentService::new(
        ProvisioningService::new(
            ProvisioningPorts::from_platform(platform.clone()),
            RetryPolicy::no_retry(),
        ),
        AccountId::new("111122223333").unwrap_or_else(|_| unreachable!()),
    )
}

#[test]
fn log_selection_defaults_to_access_only() {
    let selection = LoadBalancerLogSelection::default();
    assert!(selection.access);
    assert!(!selection.connection);
    assert!(!selection.health);
}

#[tokio::test]
async fn invalid_arn_aborts_the_whole_batch() {
    let platform = Arc::new(FakePlatform::default());
    platform.seed_load_balancer(LOAD_BALANCER_ARN).await;
    let request = EnrollmentRequest {
        cloudfront: Vec::new(),
        alb: vec![LoadBalancerEnrollment {
            arn: LOAD_BALANCER_ARN.to_owned(),
            logs: LoadBalancerLogSelection::default(),
        }],
        waf: vec![WebAclEnrollment {
            arn: "shop-acl".to_owned(),
        }],
    };

    let summary = service(&platform).enroll(&request).await;

    assert!(summary.succeeded.is_empty());
    assert_eq!(summary.failed, vec!["WAF shop-acl: invalid ARN format".to_owned()]);
    assert_eq!(platform.created_count().await, 0);
}

#[tokio::test]
async fn managed_destinations_are_derived_per_kind() {
    let platform = Arc::new(FakePlatform::default());
    platform.seed_load_balancer(LOAD_BALANCER_ARN).await;
    platform.seed_web_acl(WEB_ACL_ARN).await;
    platform
        .seed_distribution("E2QWRUHAPOMQZL", DistributionConfig::default())
        .await;
    let request = EnrollmentRequest {
        cloudfront: vec![DistributionEnrollment {
            distribution_id: "E2QWRUHAPOMQZL".to_owned(),
        }],
        alb: vec![LoadBalancerEnrollment {
            arn: LOAD_BALANCER_ARN.to_owned(),
            logs: LoadBalancerLogSelection {
                access: true,
                connection: true,
                health: false,
            },
        }],
        waf: vec![WebAclEnrollment {
            arn: WEB_ACL_ARN.to_owned(),
        }],
    };

    let summary = service(&platform).enroll(&request).await;

    assert_eq!(
        summary.succeeded,
        vec![
            "CloudFront E2QWRUHAPOMQZL".to_owned(),
            "ALB shop-api".to_owned(),
            "WAF shop-acl".to_owned(),
        ]
    );
    assert!(summary.failed.is_empty());

    let containers = [
        "cloudfront-logs-111122223333-us-east-1",
        "alb-logs-111122223333-eu-west-1",
        "aws-waf-logs-111122223333-eu-west-1",
    ];
    for container in containers {
        assert!(platform.containers.get(container).await.is_some());
    }

    let attributes = platform.load_balancers.lock().await[LOAD_BALANCER_ARN].clone();
    assert_eq!(
        attributes.get("connection_logs.s3.prefix").map(String::as_str),
        Some("alb/shop-api/connection")
    );

    let distribution = platform.distributions.lock().await["E2QWRUHAPOMQZL"].clone();
    assert_eq!(
        distribution.config.logging.prefix,
        "cloudfront/E2QWRUHAPOMQZL/"
    );
}

#[tokio::test]
async fn one_failing_resource_does_not_stop_the_batch() {
    let platform = Arc::new(FakePlatform::default());
    platform.seed_web_acl(WEB_ACL_ARN).await;
    let request = EnrollmentRequest {
        cloudfront: vec![DistributionEnrollment {
            distribution_id: "EMISSING".to_owned(),
        }],
        alb: Vec::new(),
        waf: vec![WebAclEnrollment {
            arn: WEB_ACL_ARN.to_owned(),
        }],
    };

    let summary = service(&platform).enroll(&request).await;

    assert_eq!(summary.succeeded, vec!["WAF shop-acl".to_owned()]);
    assert_eq!(summary.failed.len(), 1);
    assert!(summary.failed[0].starts_with("CloudFront EMISSING: not found"));
}
