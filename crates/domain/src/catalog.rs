use std::fmt::{Display, Formatter};

use loglake_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::descriptor::Destination;
use crate::resource::{LogVariant, ResourceKind};
use crate::schema::{RowFormat, TableSchema, schema_for};

/// Catalog database and table describing one log stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogEntry {
    database: String,
    table: String,
}

impl CatalogEntry {
    /// Derives the catalog entry for a resource's log variant.
    ///
    /// The table is `{kind tag}_{identity}` with dashes replaced by underscores; the
    /// variants of one resource share the table name and differ by database.
    pub fn derive(
        kind: ResourceKind,
        variant: LogVariant,
        resource_identity: &str,
    ) -> AppResult<Self> {
        let schema = schema_for(kind, variant).ok_or_else(|| {
            AppError::Internal(format!(
                "no table schema registered for resource kind '{kind}' and variant '{variant}'"
            ))
        })?;

        Ok(Self {
            database: schema.database.to_owned(),
            table: format!("{}_{}", kind.tag(), resource_identity.replace('-', "_")),
        })
    }

    /// Returns the database name.
    #[must_use]
    pub fn database(&self) -> &str {
        self.database.as_str()
    }

    /// Returns the table name as written in the DDL.
    #[must_use]
    pub fn table(&self) -> &str {
        self.table.as_str()
    }

    /// Returns the lower-cased table name the catalog stores.
    #[must_use]
    pub fn lookup_table(&self) -> String {
        self.table.to_lowercase()
    }
}

impl Display for CatalogEntry {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}.{}", self.database, self.table)
    }
}

/// Renders the `CREATE EXTERNAL TABLE` statement for a catalog entry.
#[must_use]
pub fn render_table_ddl(
    entry: &CatalogEntry,
    schema: &TableSchema,
    destination: &Destination,
) -> String {
    let mut ddl = format!("CREATE EXTERNAL TABLE IF NOT EXISTS {entry} (\n");

    let columns: Vec<String> = schema
        .columns
        .iter()
        .map(|column| format!("  {} {}", column.name, column.data_type))
        .collect();
    ddl.push_str(&columns.join(",\n"));
    ddl.push_str("\n)\n");

    let location = schema.location_for(destination);
    let row_format = match schema.row_format {
        RowFormat::Delimited {
            delimiter,
            header_lines,
        } => format!(
            "ROW FORMAT DELIMITED FIELDS TERMINATED BY '{delimiter}'\n\
             LOCATION '{location}'\n\
             TBLPROPERTIES ('skip.header.line.count'='{header_lines}');"
        ),
        RowFormat::Regex { pattern } => format!(
            "ROW FORMAT SERDE 'org.apache.hadoop.hive.serde2.RegexSerDe'\n\
             WITH SERDEPROPERTIES (\n  \
             'serialization.format' = '1',\n  \
             'input.regex' = '{pattern}'\n\
             )\n\
             LOCATION '{location}';"
        ),
        RowFormat::Json => format!(
            "ROW FORMAT SERDE 'org.openx.data.jsonserde.JsonSerDe'\n\
             LOCATION '{location}';"
        ),
    };
    ddl.push_str(&row_format);

    ddl
}

#[cfg(test)]
mod tests;
