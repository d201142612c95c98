use proptest::prelude::*;

use super::{CatalogEntry, render_table_ddl};
use crate::{Destination, LogVariant, ResourceKind, schema_for};

fn ddl_for(kind: ResourceKind, variant: LogVariant, identity: &str, destination: &Destination) -> String {
    let entry = CatalogEntry::derive(kind, variant, identity).unwrap_or_else(|_| unreachable!());
    let schema = schema_for(kind, variant).unwrap_or_else(|| unreachable!());
    render_table_ddl(&entry, schema, destination)
}

#[test]
fn load_balancer_access_entry_uses_kind_tag() {
    let entry = CatalogEntry::derive(ResourceKind::LoadBalancer, LogVariant::Access, "my-app")
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(entry.database(), "alb_access_logs_db");
    assert_eq!(entry.table(), "alb_my_app");
    assert_eq!(entry.to_string(), "alb_access_logs_db.alb_my_app");
}

#[test]
fn load_balancer_variants_share_table_name() {
    let health = CatalogEntry::derive(ResourceKind::LoadBalancer, LogVariant::Health, "x")
        .unwrap_or_else(|_| unreachable!());
    let connection = CatalogEntry::derive(ResourceKind::LoadBalancer, LogVariant::Connection, "x")
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(health.to_string(), "alb_health_logs_db.alb_x");
    assert_eq!(connection.to_string(), "alb_connection_logs_db.alb_x");
}

#[test]
fn distribution_lookup_name_is_lower_case() {
    let entry = CatalogEntry::derive(ResourceKind::Distribution, LogVariant::Standard, "E2QWRUHAPOMQZL")
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(entry.table(), "cloudfront_E2QWRUHAPOMQZL");
    assert_eq!(entry.lookup_table(), "cloudfront_e2qwruhapomqzl");
}

#[test]
fn unsupported_pair_is_an_internal_error() {
    assert!(CatalogEntry::derive(ResourceKind::Distribution, LogVariant::Access, "x").is_err());
}

#[test]
fn health_ddl_is_stable() {
    let destination = Destination::new("alb-logs-1-eu-west-1", "alb/my-app")
        .unwrap_or_else(|_| unreachable!());
    let ddl = ddl_for(ResourceKind::LoadBalancer, LogVariant::Health, "my-app", &destination);

    let expected = "CREATE EXTERNAL TABLE IF NOT EXISTS alb_health_logs_db.alb_my_app (\n  \
timestamp STRING,\n  \
target_address STRING,\n  \
target_port INT,\n  \
target_group STRING,\n  \
target_health_status STRING,\n  \
target_health_reason STRING,\n  \
target_health_description STRING\n\
)\n\
ROW FORMAT DELIMITED FIELDS TERMINATED BY ' '\n\
LOCATION 's3://alb-logs-1-eu-west-1/alb/my-app/health/'\n\
TBLPROPERTIES ('skip.header.line.count'='2');";

    assert_eq!(ddl, expected);
}

#[test]
fn distribution_ddl_uses_tab_delimiter_and_skips_two_header_lines() {
    let destination = Destination::new("cloudfront-logs", "cloudfront/E1/")
        .unwrap_or_else(|_| unreachable!());
    let ddl = ddl_for(ResourceKind::Distribution, LogVariant::Standard, "E1", &destination);

    assert!(ddl.starts_with(
        "CREATE EXTERNAL TABLE IF NOT EXISTS cloudfront_access_logs_db.cloudfront_E1 (\n  `date` DATE,\n"
    ));
    assert!(ddl.contains("  fle_encrypted_fields INT\n)\n"));
    assert!(ddl.contains("ROW FORMAT DELIMITED FIELDS TERMINATED BY '\t'\n"));
    assert!(ddl.contains("LOCATION 's3://cloudfront-logs/cloudfront/E1/'\n"));
    assert!(ddl.ends_with("TBLPROPERTIES ('skip.header.line.count'='2');"));
}

#[test]
fn access_ddl_uses_regex_serde() {
    let destination =
        Destination::new("alb-logs", "alb/my-app").unwrap_or_else(|_| unreachable!());
    let ddl = ddl_for(ResourceKind::LoadBalancer, LogVariant::Access, "my-app", &destination);

    assert!(ddl.contains("  type STRING,\n  time STRING,\n  elb STRING,\n"));
    assert!(ddl.contains("ROW FORMAT SERDE 'org.apache.hadoop.hive.serde2.RegexSerDe'\n"));
    assert!(ddl.contains("  'serialization.format' = '1',\n"));
    assert!(ddl.contains(
        "  'input.regex' = '([^ ]*) ([^ ]*) ([^ ]*) ([^ ]*):([0-9]*) ([^ ]*)[:-]([0-9]*) "
    ));
    assert!(ddl.contains(r#""([^\s]+?)" "([^\s]+)" "([^ ]*)" "([^ ]*)"'"#));
    assert!(ddl.ends_with(")\nLOCATION 's3://alb-logs/alb/my-app/';"));
    assert!(!ddl.contains("TBLPROPERTIES"));
}

#[test]
fn firewall_ddl_reads_json_under_delivery_folder() {
    let destination =
        Destination::new("aws-waf-logs-1-eu-west-1", "").unwrap_or_else(|_| unreachable!());
    let ddl = ddl_for(ResourceKind::WebFirewall, LogVariant::Standard, "edge-acl", &destination);

    assert!(ddl.starts_with("CREATE EXTERNAL TABLE IF NOT EXISTS acl_traffic_logs_db.waf_edge_acl (\n"));
    assert!(ddl.contains("  rulegrouplist ARRAY<STRING>,\n"));
    assert!(ddl.contains(
        "  httprequest STRUCT<clientip:STRING, country:STRING, headers:ARRAY<STRUCT<name:STRING,value:STRING>>, uri:STRING, args:STRING, httpversion:STRING, httpmethod:STRING, requestid:STRING>\n)\n"
    ));
    assert!(ddl.ends_with(
        "ROW FORMAT SERDE 'org.openx.data.jsonserde.JsonSerDe'\nLOCATION 's3://aws-waf-logs-1-eu-west-1/AWSLogs/';"
    ));
}

proptest! {
    #[test]
    fn table_names_are_deterministic_and_dash_free(identity in "[a-zA-Z0-9][a-zA-Z0-9-]{0,30}") {
        for kind in ResourceKind::all() {
            for variant in kind.supported_variants() {
                let first = CatalogEntry::derive(*kind, *variant, &identity);
                let second = CatalogEntry::derive(*kind, *variant, &identity);
                prop_assert!(first.is_ok());
                prop_assert_eq!(first.clone().ok(), second.ok());

                let entry = first.unwrap_or_else(|_| unreachable!());
                let expected_prefix = format!("{}_", kind.tag());
                prop_assert!(!entry.table().contains('-'));
                prop_assert!(entry.table().starts_with(&expected_prefix));
                prop_assert_eq!(entry.lookup_table(), entry.table().to_lowercase());
            }
        }
    }
}
