use loglake_core::{AppError, AppResult, Region};

/// Suffix of the virtual-host style storage endpoint used by distributions.
pub const STORAGE_HOST_SUFFIX: &str = ".s3.amazonaws.com";

/// Returns the human-readable resource name embedded in a canonical identifier.
///
/// The name is the second-to-last `/` segment, e.g. `my-app` for
/// `arn:aws:elasticloadbalancing:eu-west-1:1:loadbalancer/app/my-app/50dc6c495c0c9188`.
/// Identifiers with fewer than two segments yield `None`.
#[must_use]
pub fn resource_name_from_identifier(identifier: &str) -> Option<&str> {
    let segments: Vec<&str> = identifier.split('/').collect();
    if segments.len() < 2 {
        return None;
    }

    let name = segments[segments.len() - 2].trim();
    (!name.is_empty()).then_some(name)
}

/// Extracts the storage container name from a storage ARN such as `arn:aws:s3:::bucket`.
#[must_use]
pub fn container_from_storage_arn(storage_arn: &str) -> Option<&str> {
    let container = storage_arn
        .rsplit(":::")
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    let container = container.split('/').next().unwrap_or_default();

    (!container.is_empty()).then_some(container)
}

/// Strips the storage endpoint suffix from a distribution logging bucket.
#[must_use]
pub fn container_from_storage_host(host: &str) -> &str {
    host.strip_suffix(STORAGE_HOST_SUFFIX).unwrap_or(host)
}

/// Returns the storage ARN for a container.
#[must_use]
pub fn storage_arn(container: &str) -> String {
    format!("arn:aws:s3:::{container}")
}

/// Extracts the region from an ARN of shape `arn:partition:service:region:account:resource`.
pub fn region_from_arn(arn: &str) -> AppResult<Region> {
    let parts: Vec<&str> = arn.split(':').collect();
    if parts.len() < 6 || parts[0] != "arn" {
        return Err(AppError::Validation(format!("invalid ARN format: {arn}")));
    }

    if parts[3].is_empty() {
        return Err(AppError::Validation(format!("region not found in ARN: {arn}")));
    }

    Region::new(parts[3]).map_err(|error| error.context(format!("ARN '{arn}'")))
}

#[cfg(test)]
mod tests {
    use super::{
        container_from_storage_arn, container_from_storage_host, region_from_arn,
        resource_name_from_identifier,
    };

    #[test]
    fn resource_name_is_second_to_last_segment() {
        assert_eq!(
            resource_name_from_identifier(
                "arn:aws:elasticloadbalancing:eu-west-1:111122223333:loadbalancer/app/my-app/50dc6c495c0c9188"
            ),
            Some("my-app")
        );
        assert_eq!(
            resource_name_from_identifier(
                "arn:aws:wafv2:eu-west-1:111122223333:regional/webacl/edge-acl/a1b2c3"
            ),
            Some("edge-acl")
        );
    }

    #[test]
    fn malformed_identifiers_yield_no_name() {
        assert_eq!(resource_name_from_identifier("no-slashes-here"), None);
        assert_eq!(resource_name_from_identifier(""), None);
        assert_eq!(resource_name_from_identifier("/tail"), None);
    }

    #[test]
    fn storage_identifiers_are_parsed() {
        assert_eq!(
            container_from_storage_arn("arn:aws:s3:::aws-waf-logs-example"),
            Some("aws-waf-logs-example")
        );
        assert_eq!(container_from_storage_arn("arn:aws:s3:::"), None);
        assert_eq!(
            container_from_storage_host("logs-bucket.s3.amazonaws.com"),
            "logs-bucket"
        );
    }

    #[test]
    fn region_is_read_from_arn() {
        let region = region_from_arn("arn:aws:wafv2:ap-south-1:111122223333:regional/webacl/x/y");
        assert_eq!(
            region.map(|region| region.as_str().to_owned()).ok(),
            Some("ap-south-1".to_owned())
        );
        assert!(region_from_arn("arn:aws:wafv2::111122223333:global/webacl/x/y").is_err());
        assert!(region_from_arn("not-an-arn").is_err());
    }
}
