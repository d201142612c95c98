//! Static table schemas for every supported (resource kind, log variant) pair.
//!
//! The column lists, SerDe settings and patterns must stay byte-for-byte stable:
//! catalogs created by earlier releases are compared against them.

use crate::descriptor::{Destination, join_path};
use crate::resource::{LogVariant, ResourceKind};

/// One typed table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Column name as written in the DDL, including any quoting.
    pub name: &'static str,
    /// Catalog type expression.
    pub data_type: &'static str,
}

const fn column(name: &'static str, data_type: &'static str) -> Column {
    Column { name, data_type }
}

/// Rule used by the query engine to split a log line into columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFormat {
    /// Fields separated by a fixed delimiter.
    Delimited {
        /// Field delimiter, written verbatim between quotes.
        delimiter: &'static str,
        /// Header lines skipped at the top of each file.
        header_lines: u8,
    },
    /// Fields captured by a regular expression.
    Regex {
        /// `input.regex` pattern; one capture group per column.
        pattern: &'static str,
    },
    /// Self-describing JSON records.
    Json,
}

/// Where the table data lives relative to the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationTemplate {
    /// Under the variant's prefix.
    VariantPrefix,
    /// Under a fixed folder written by the delivery service.
    Fixed(&'static str),
}

/// Table schema, row format and location rule for one (kind, variant) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    /// Resource kind producing the logs.
    pub resource_kind: ResourceKind,
    /// Log variant described by this schema.
    pub log_variant: LogVariant,
    /// Catalog database hosting tables of this schema.
    pub database: &'static str,
    /// Ordered table columns.
    pub columns: &'static [Column],
    /// Row parsing rule.
    pub row_format: RowFormat,
    /// Location rule.
    pub location: LocationTemplate,
}

impl TableSchema {
    /// Resolves the table location for a destination.
    #[must_use]
    pub fn location_for(&self, destination: &Destination) -> String {
        match self.location {
            LocationTemplate::VariantPrefix => {
                destination.uri(&destination.prefix_for(self.log_variant))
            }
            LocationTemplate::Fixed(folder) => destination.uri(&join_path(&[folder])),
        }
    }
}

/// Returns the schema for a (kind, variant) pair.
///
/// Every pair accepted by [`ResourceKind::supports`] has a schema.
#[must_use]
pub fn schema_for(kind: ResourceKind, variant: LogVariant) -> Option<&'static TableSchema> {
    SCHEMAS
        .iter()
        .find(|schema| schema.resource_kind == kind && schema.log_variant == variant)
}

/// Returns every registered schema.
#[must_use]
pub fn all_schemas() -> &'static [TableSchema] {
    SCHEMAS
}

const LOAD_BALANCER_ACCESS_PATTERN: &str = r#"([^ ]*) ([^ ]*) ([^ ]*) ([^ ]*):([0-9]*) ([^ ]*)[:-]([0-9]*) ([-.0-9]*) ([-.0-9]*) ([-.0-9]*) (|[-0-9]*) (-|[-0-9]*) ([-0-9]*) ([-0-9]*) "([^ ]*) ([^ ]*) (- |[^ ]*)" "([^"]*)" ([A-Z0-9-]+) ([A-Za-z0-9.-]*) ([^ ]*) "([^"]*)" "([^"]*)" "([^"]*)" ([-.0-9]*) ([^ ]*) "([^"]*)" "([^"]*)" "([^ ]*)" "([^\s]+?)" "([^\s]+)" "([^ ]*)" "([^ ]*)""#;

const LOAD_BALANCER_ACCESS_COLUMNS: &[Column] = &[
    column("type", "STRING"),
    column("time", "STRING"),
    column("elb", "STRING"),
    column("client_ip", "STRING"),
    column("client_port", "INT"),
    column("target_ip", "STRING"),
    column("target_port", "INT"),
    column("request_processing_time", "DOUBLE"),
    column("target_processing_time", "DOUBLE"),
    column("response_processing_time", "DOUBLE"),
    column("elb_status_code", "STRING"),
    column("target_status_code", "STRING"),
    column("received_bytes", "BIGINT"),
    column("sent_bytes", "BIGINT"),
    column("request_verb", "STRING"),
    column("request_url", "STRING"),
    column("request_proto", "STRING"),
    column("user_agent", "STRING"),
    column("ssl_cipher", "STRING"),
    column("ssl_protocol", "STRING"),
    column("target_group_arn", "STRING"),
    column("trace_id", "STRING"),
    column("domain_name", "STRING"),
    column("chosen_cert_arn", "STRING"),
    column("matched_rule_priority", "STRING"),
    column("request_creation_time", "STRING"),
    column("actions_executed", "STRING"),
    column("redirect_url", "STRING"),
    column("lambda_error_reason", "STRING"),
    column("target_port_list", "STRING"),
    column("target_status_code_list", "STRING"),
    column("classification", "STRING"),
    column("classification_reason", "STRING"),
];

const LOAD_BALANCER_CONNECTION_COLUMNS: &[Column] = &[
    column("timestamp", "STRING"),
    column("client_ip", "STRING"),
    column("client_port", "INT"),
    column("listener_port", "INT"),
    column("tls_protocol", "STRING"),
    column("tls_cipher", "STRING"),
    column("tls_handshake_latency", "DOUBLE"),
    column("leaf_client_cert_subject", "STRING"),
    column("leaf_client_cert_validity", "STRING"),
    column("leaf_client_cert_serial_number", "STRING"),
    column("tls_verify_status", "STRING"),
];

const LOAD_BALANCER_HEALTH_COLUMNS: &[Column] = &[
    column("timestamp", "STRING"),
    column("target_address", "STRING"),
    column("target_port", "INT"),
    column("target_group", "STRING"),
    column("target_health_status", "STRING"),
    column("target_health_reason", "STRING"),
    column("target_health_description", "STRING"),
];

const WEB_FIREWALL_COLUMNS: &[Column] = &[
    column("timestamp", "BIGINT"),
    column("formatversion", "INT"),
    column("webaclid", "STRING"),
    column("terminatingruleid", "STRING"),
    column("terminatingruletype", "STRING"),
    column("action", "STRING"),
    column("httpsourcename", "STRING"),
    column("httpsourceid", "STRING"),
    column("rulegrouplist", "ARRAY<STRING>"),
    column("ratebasedrulelist", "ARRAY<STRING>"),
    column("nonterminatingmatchingrules", "ARRAY<STRING>"),
    column(
        "httprequest",
        "STRUCT<clientip:STRING, country:STRING, headers:ARRAY<STRUCT<name:STRING,value:STRING>>, uri:STRING, args:STRING, httpversion:STRING, httpmethod:STRING, requestid:STRING>",
    ),
];

const DISTRIBUTION_COLUMNS: &[Column] = &[
    column("`date`", "DATE"),
    column("time", "STRING"),
    column("location", "STRING"),
    column("bytes", "BIGINT"),
    column("request_ip", "STRING"),
    column("method", "STRING"),
    column("host", "STRING"),
    column("uri", "STRING"),
    column("status", "INT"),
    column("referrer", "STRING"),
    column("user_agent", "STRING"),
    column("query_string", "STRING"),
    column("cookie", "STRING"),
    column("result_type", "STRING"),
    column("request_id", "STRING"),
    column("host_header", "STRING"),
    column("request_protocol", "STRING"),
    column("request_bytes", "BIGINT"),
    column("time_taken", "FLOAT"),
    column("xforwarded_for", "STRING"),
    column("ssl_protocol", "STRING"),
    column("ssl_cipher", "STRING"),
    column("response_result_type", "STRING"),
    column("http_version", "STRING"),
    column("fle_status", "STRING"),
    column("fle_encrypted_fields", "INT"),
];

const SCHEMAS: &[TableSchema] = &[
    TableSchema {
        resource_kind: ResourceKind::LoadBalancer,
        log_variant: LogVariant::Access,
        database: "alb_access_logs_db",
        columns: LOAD_BALANCER_ACCESS_COLUMNS,
        row_format: RowFormat::Regex {
            pattern: LOAD_BALANCER_ACCESS_PATTERN,
        },
        location: LocationTemplate::VariantPrefix,
    },
    TableSchema {
        resource_kind: ResourceKind::LoadBalancer,
        log_variant: LogVariant::Connection,
        database: "alb_connection_logs_db",
        columns: LOAD_BALANCER_CONNECTION_COLUMNS,
        row_format: RowFormat::Delimited {
            delimiter: " ",
            header_lines: 2,
        },
        location: LocationTemplate::VariantPrefix,
    },
    TableSchema {
        resource_kind: ResourceKind::LoadBalancer,
        log_variant: LogVariant::Health,
        database: "alb_health_logs_db",
        columns: LOAD_BALANCER_HEALTH_COLUMNS,
        row_format: RowFormat::Delimited {
            delimiter: " ",
            header_lines: 2,
        },
        location: LocationTemplate::VariantPrefix,
    },
    TableSchema {
        resource_kind: ResourceKind::WebFirewall,
        log_variant: LogVariant::Standard,
        database: "acl_traffic_logs_db",
        columns: WEB_FIREWALL_COLUMNS,
        row_format: RowFormat::Json,
        location: LocationTemplate::Fixed("AWSLogs"),
    },
    TableSchema {
        resource_kind: ResourceKind::Distribution,
        log_variant: LogVariant::Standard,
        database: "cloudfront_access_logs_db",
        columns: DISTRIBUTION_COLUMNS,
        row_format: RowFormat::Delimited {
            delimiter: "\t",
            header_lines: 2,
        },
        location: LocationTemplate::VariantPrefix,
    },
];
