use serde::{Deserialize, Serialize};

/// Policy language version used by every generated document.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Service principal delivering load balancer logs.
pub const LOAD_BALANCER_LOG_DELIVERY_SERVICE: &str = "logdelivery.elasticloadbalancing.amazonaws.com";

/// Service principal of the event router.
pub const EVENT_ROUTER_SERVICE: &str = "events.amazonaws.com";

/// Service principal of the compute service running the handler.
pub const COMPUTE_SERVICE: &str = "lambda.amazonaws.com";

/// Access policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Policy language version.
    #[serde(rename = "Version")]
    pub version: String,
    /// Policy statements.
    #[serde(rename = "Statement")]
    pub statements: Vec<PolicyStatement>,
}

impl PolicyDocument {
    /// Creates a document from statements.
    #[must_use]
    pub fn new(statements: Vec<PolicyStatement>) -> Self {
        Self {
            version: POLICY_VERSION.to_owned(),
            statements,
        }
    }

    /// Returns whether every statement of `other` is already part of this document.
    #[must_use]
    pub fn contains_statements_of(&self, other: &PolicyDocument) -> bool {
        other
            .statements
            .iter()
            .all(|statement| self.statements.contains(statement))
    }

    /// Returns this document with the statements of `other` it lacks appended.
    #[must_use]
    pub fn merged_with(mut self, other: &PolicyDocument) -> Self {
        for statement in &other.statements {
            if !self.statements.contains(statement) {
                self.statements.push(statement.clone());
            }
        }
        self
    }

    /// Renders the document as compact JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Principal a statement applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Principal {
    /// Platform service principal.
    Service(String),
    /// Account or role principal ARN.
    #[serde(rename = "AWS")]
    Account(String),
}

/// One allow statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyStatement {
    /// Optional statement identifier.
    #[serde(rename = "Sid", skip_serializing_if = "Option::is_none", default)]
    pub sid: Option<String>,
    /// Statement effect; generated statements always allow.
    #[serde(rename = "Effect")]
    pub effect: String,
    /// Principal, omitted for identity policies.
    #[serde(rename = "Principal", skip_serializing_if = "Option::is_none", default)]
    pub principal: Option<Principal>,
    /// Allowed actions.
    #[serde(rename = "Action")]
    pub actions: Vec<String>,
    /// Resources the actions apply to.
    #[serde(rename = "Resource", skip_serializing_if = "Vec::is_empty", default)]
    pub resources: Vec<String>,
}

impl PolicyStatement {
    /// Creates an allow statement for actions on resources.
    #[must_use]
    pub fn allow<A, R>(actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            sid: None,
            effect: "Allow".to_owned(),
            principal: None,
            actions: actions.into_iter().map(Into::into).collect(),
            resources: resources.into_iter().map(Into::into).collect(),
        }
    }

    /// Sets the statement principal.
    #[must_use]
    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    /// Sets the statement identifier.
    #[must_use]
    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }
}

/// Trust policy letting a platform service assume a role.
#[must_use]
pub fn service_trust_policy(service: &str) -> PolicyDocument {
    PolicyDocument::new(vec![
        PolicyStatement::allow(["sts:AssumeRole"], Vec::<String>::new())
            .with_principal(Principal::Service(service.to_owned())),
    ])
}

/// Container policy letting the load balancer delivery service write under a prefix.
#[must_use]
pub fn load_balancer_delivery_policy(container: &str, prefix: &str) -> PolicyDocument {
    let resource = if prefix.is_empty() {
        format!("arn:aws:s3:::{container}/*")
    } else {
        format!("arn:aws:s3:::{container}/{prefix}/*")
    };

    PolicyDocument::new(vec![
        PolicyStatement::allow(["s3:PutObject"], [resource]).with_principal(Principal::Service(
            LOAD_BALANCER_LOG_DELIVERY_SERVICE.to_owned(),
        )),
    ])
}

#[cfg(test)]
mod tests {
    use super::{load_balancer_delivery_policy, service_trust_policy};

    #[test]
    fn merging_keeps_grants_for_other_prefixes() {
        let shop = load_balancer_delivery_policy("alb-logs", "alb/shop-api");
        let billing = load_balancer_delivery_policy("alb-logs", "alb/billing");

        let merged = shop.clone().merged_with(&billing);

        assert_eq!(merged.statements.len(), 2);
        assert!(merged.contains_statements_of(&shop));
        assert!(merged.contains_statements_of(&billing));
        assert!(!shop.contains_statements_of(&billing));
        assert_eq!(merged.clone().merged_with(&shop), merged);
    }

    #[test]
    fn delivery_policy_is_scoped_to_prefix() {
        let document = load_balancer_delivery_policy("alb-logs", "alb/my-app");
        assert_eq!(
            document.to_json(),
            r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Principal":{"Service":"logdelivery.elasticloadbalancing.amazonaws.com"},"Action":["s3:PutObject"],"Resource":["arn:aws:s3:::alb-logs/alb/my-app/*"]}]}"#
        );
    }

    #[test]
    fn trust_policy_has_no_resource() {
        let json = service_trust_policy("events.amazonaws.com").to_json();
        assert!(json.contains(r#""Action":["sts:AssumeRole"]"#));
        assert!(!json.contains("Resource"));
    }
}
