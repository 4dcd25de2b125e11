//! Table, column and relationship definitions for a semantic model.

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Supporting Enums
// ============================================================================

/// Data type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Integer,
    Float,
    Decimal,
    Date,
    Datetime,
    Boolean,
    #[default]
    Unknown,
}

impl ColumnType {
    /// Map a warehouse type name (`VARCHAR(100)`, `NUMBER(38,2)`, `TIMESTAMP_NTZ`)
    /// to a column type. Unrecognized names map to [`ColumnType::Unknown`].
    pub fn from_warehouse_type(type_name: &str) -> Self {
        let upper = type_name.trim().to_ascii_uppercase();
        let base = upper.split('(').next().unwrap_or_default().trim();
        match base {
            "VARCHAR" | "STRING" | "TEXT" | "CHAR" | "CHARACTER" | "NVARCHAR" | "NCHAR" => {
                ColumnType::String
            }
            "INTEGER" | "INT" | "BIGINT" | "SMALLINT" | "TINYINT" | "BYTEINT" | "INT64" => {
                ColumnType::Integer
            }
            "FLOAT" | "FLOAT4" | "FLOAT8" | "DOUBLE" | "DOUBLE PRECISION" | "REAL" | "FLOAT64" => {
                ColumnType::Float
            }
            "NUMBER" | "DECIMAL" | "NUMERIC" | "BIGNUMERIC" => ColumnType::Decimal,
            "DATE" => ColumnType::Date,
            "DATETIME" | "TIMESTAMP" | "TIMESTAMP_NTZ" | "TIMESTAMP_LTZ" | "TIMESTAMP_TZ"
            | "TIMESTAMPTZ" | "DATETIME2" => ColumnType::Datetime,
            "BOOLEAN" | "BOOL" | "BIT" => ColumnType::Boolean,
            _ => ColumnType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Decimal => "decimal",
            ColumnType::Date => "date",
            ColumnType::Datetime => "datetime",
            ColumnType::Boolean => "boolean",
            ColumnType::Unknown => "unknown",
        }
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, ColumnType::Date | ColumnType::Datetime)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cardinality of a relationship, read from the `from` side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    #[default]
    ManyToOne,
    ManyToMany,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::OneToOne => write!(f, "1:1"),
            Cardinality::OneToMany => write!(f, "1:N"),
            Cardinality::ManyToOne => write!(f, "N:1"),
            Cardinality::ManyToMany => write!(f, "N:N"),
        }
    }
}

/// Which way filters propagate across a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrossFilterDirection {
    #[default]
    Single,
    Both,
    None,
}

// ============================================================================
// Column / Table
// ============================================================================

/// A physical column, optionally exposed under a different DAX name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name in SQL
    pub name: String,
    /// Column name as referenced in DAX, when it differs
    #[serde(default)]
    pub dax_name: Option<String>,
    #[serde(default)]
    pub data_type: ColumnType,
    #[serde(default)]
    pub is_key: bool,
    #[serde(default = "default_true")]
    pub is_nullable: bool,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            dax_name: None,
            data_type,
            is_key: false,
            is_nullable: true,
            description: None,
        }
    }

    pub fn with_dax_name(mut self, dax_name: impl Into<String>) -> Self {
        self.dax_name = Some(dax_name.into());
        self
    }

    /// Mark as a key column (implies not nullable).
    pub fn key(mut self) -> Self {
        self.is_key = true;
        self.is_nullable = false;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The DAX name, or the SQL name when no alias is set.
    pub fn effective_dax_name(&self) -> &str {
        self.dax_name.as_deref().unwrap_or(&self.name)
    }

    /// Does `name` (any case) match the SQL or DAX name?
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self
                .dax_name
                .as_deref()
                .is_some_and(|dax| dax.eq_ignore_ascii_case(name))
    }
}

/// A physical table, optionally exposed under a different DAX name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Table name in SQL
    pub name: String,
    #[serde(default)]
    pub dax_name: Option<String>,
    /// Schema qualifier
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dax_name: None,
            schema: None,
            columns: Vec::new(),
            primary_key: Vec::new(),
            description: None,
        }
    }

    pub fn with_dax_name(mut self, dax_name: impl Into<String>) -> Self {
        self.dax_name = Some(dax_name.into());
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn effective_dax_name(&self) -> &str {
        self.dax_name.as_deref().unwrap_or(&self.name)
    }

    /// Schema-qualified SQL name.
    pub fn full_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }

    /// Find a column by SQL or DAX name (any case).
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.matches(name))
    }
}

// ============================================================================
// Relationship
// ============================================================================

/// A relationship between two tables.
///
/// Endpoints are table names as written; they are checked against the
/// registered tables only when a path is looked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    #[serde(default, alias = "relationship_type")]
    pub cardinality: Cardinality,
    #[serde(default)]
    pub cross_filter: CrossFilterDirection,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Relationship {
    /// An active many-to-one, single-direction relationship.
    pub fn new(
        from_table: impl Into<String>,
        from_column: impl Into<String>,
        to_table: impl Into<String>,
        to_column: impl Into<String>,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            from_column: from_column.into(),
            to_table: to_table.into(),
            to_column: to_column.into(),
            cardinality: Cardinality::ManyToOne,
            cross_filter: CrossFilterDirection::Single,
            is_active: true,
        }
    }

    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    pub fn with_cross_filter(mut self, cross_filter: CrossFilterDirection) -> Self {
        self.cross_filter = cross_filter;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// The join condition, `from.col = to.col`.
    pub fn as_join(&self) -> String {
        format!(
            "{}.{} = {}.{}",
            self.from_table, self.from_column, self.to_table, self.to_column
        )
    }

    /// Does either endpoint name `table` (any case)?
    pub fn involves(&self, table: &str) -> bool {
        self.from_table.eq_ignore_ascii_case(table) || self.to_table.eq_ignore_ascii_case(table)
    }
}
