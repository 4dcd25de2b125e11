//! Schema registry used during translation.
//!
//! Holds tables and relationships with uppercase-normalized indices, so every
//! name lookup is case-insensitive and O(1). The relationship graph used for
//! join paths is maintained alongside (see `path.rs`).
//!
//! A `SchemaContext` is read-only once built and can be shared across threads;
//! per-call filter state lives in [`FilterContext`](super::FilterContext).

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};

use super::error::SchemaResult;
use super::types::{Cardinality, Column, Relationship, Table};

/// Uppercase key used by every index.
pub(crate) fn normalize(name: &str) -> String {
    name.to_uppercase()
}

#[derive(Debug, Clone, Default)]
pub struct SchemaContext {
    tables: Vec<Table>,
    relationships: Vec<Relationship>,

    /// SQL name → table position
    sql_index: HashMap<String, usize>,
    /// DAX name → SQL name
    dax_to_sql: HashMap<String, String>,
    /// SQL name → DAX name
    sql_to_dax: HashMap<String, String>,
    /// Per table: column SQL/DAX name → column position
    column_index: Vec<HashMap<String, usize>>,

    /// Undirected relationship graph; edge weight is the relationship position.
    pub(crate) graph: UnGraph<String, usize>,
    pub(crate) graph_nodes: HashMap<String, NodeIndex>,
}

/// On-disk JSON layout.
#[derive(Serialize, Deserialize)]
struct SchemaDocument {
    #[serde(default)]
    tables: Vec<Table>,
    #[serde(default)]
    relationships: Vec<Relationship>,
}

impl SchemaContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table. A table with the same SQL name is replaced.
    pub fn add_table(&mut self, table: Table) {
        let sql_key = normalize(&table.name);
        let dax_key = normalize(table.effective_dax_name());

        let mut columns = HashMap::new();
        for (i, column) in table.columns.iter().enumerate() {
            columns.entry(normalize(&column.name)).or_insert(i);
            if let Some(dax) = &column.dax_name {
                columns.entry(normalize(dax)).or_insert(i);
            }
        }

        match self.sql_index.get(&sql_key) {
            Some(&pos) => {
                if let Some(old_dax) = self.sql_to_dax.remove(&sql_key) {
                    self.dax_to_sql.remove(&old_dax);
                }
                self.tables[pos] = table;
                self.column_index[pos] = columns;
            }
            None => {
                self.sql_index.insert(sql_key.clone(), self.tables.len());
                self.tables.push(table);
                self.column_index.push(columns);
            }
        }

        self.dax_to_sql.insert(dax_key.clone(), sql_key.clone());
        self.sql_to_dax.insert(sql_key, dax_key);
    }

    /// Register a relationship. Endpoints are not validated here.
    pub fn add_relationship(&mut self, relationship: Relationship) {
        let position = self.relationships.len();
        if relationship.is_active {
            let from = self.graph_node(&relationship.from_table);
            let to = self.graph_node(&relationship.to_table);
            self.graph.add_edge(from, to, position);
        }
        self.relationships.push(relationship);
    }

    fn graph_node(&mut self, name: &str) -> NodeIndex {
        let key = normalize(name);
        if let Some(&idx) = self.graph_nodes.get(&key) {
            return idx;
        }
        let idx = self.graph.add_node(key.clone());
        self.graph_nodes.insert(key, idx);
        idx
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn table_position(&self, name: &str) -> Option<usize> {
        let key = normalize(name);
        self.sql_index.get(&key).copied().or_else(|| {
            self.dax_to_sql
                .get(&key)
                .and_then(|sql| self.sql_index.get(sql).copied())
        })
    }

    /// Look a table up by SQL or DAX name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.table_position(name).map(|pos| &self.tables[pos])
    }

    /// SQL table name for a DAX (or SQL) table name.
    pub fn sql_table_name(&self, dax_name: &str) -> Option<&str> {
        self.table(dax_name).map(|t| t.name.as_str())
    }

    /// DAX table name for a SQL table name.
    pub fn dax_table_name(&self, sql_name: &str) -> Option<&str> {
        self.table(sql_name).map(|t| t.effective_dax_name())
    }

    pub fn column(&self, table: &str, column: &str) -> Option<&Column> {
        let pos = self.table_position(table)?;
        let col = self.column_index[pos].get(&normalize(column))?;
        Some(&self.tables[pos].columns[*col])
    }

    /// SQL column name for a `Table[Column]` reference.
    pub fn sql_column_name(&self, table: &str, column: &str) -> Option<&str> {
        self.column(table, column).map(|c| c.name.as_str())
    }

    /// Find an unqualified column, preferring `preferred` tables first and
    /// then registration order.
    pub fn find_column(&self, column: &str, preferred: &[&str]) -> Option<(&Table, &Column)> {
        let key = normalize(column);
        let preferred_positions = preferred.iter().filter_map(|t| self.table_position(t));
        preferred_positions
            .chain(0..self.tables.len())
            .find_map(|pos| {
                self.column_index[pos]
                    .get(&key)
                    .map(|&col| (&self.tables[pos], &self.tables[pos].columns[col]))
            })
    }

    /// Every relationship with `table` at either end.
    pub fn relationships_for_table(&self, table: &str) -> Vec<&Relationship> {
        let names = self.aliases(table);
        self.relationships
            .iter()
            .filter(|r| names.iter().any(|n| r.involves(n)))
            .collect()
    }

    /// Every spelling (input, SQL name, DAX name) a table may go by.
    pub(crate) fn aliases(&self, name: &str) -> Vec<String> {
        let mut names = vec![name.to_string()];
        if let Some(table) = self.table(name) {
            names.push(table.name.clone());
            names.push(table.effective_dax_name().to_string());
        }
        names.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
        names
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    pub fn to_json(&self) -> SchemaResult<String> {
        let doc = SchemaDocument {
            tables: self.tables.clone(),
            relationships: self.relationships.clone(),
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    pub fn from_json(json: &str) -> SchemaResult<Self> {
        let doc: SchemaDocument = serde_json::from_str(json)?;
        let mut ctx = Self::new();
        for table in doc.tables {
            ctx.add_table(table);
        }
        for relationship in doc.relationships {
            ctx.add_relationship(relationship);
        }
        Ok(ctx)
    }

    /// Schema description in Markdown, for an external LLM prompt.
    pub fn to_prompt_context(&self) -> String {
        let mut lines = vec!["# Schema Context".to_string(), String::new()];
        lines.push("## Tables".to_string());
        lines.push(String::new());

        for table in &self.tables {
            lines.push(format!(
                "### {} (SQL: {})",
                table.effective_dax_name(),
                table.full_name()
            ));
            if let Some(description) = &table.description {
                lines.push(format!("Description: {}", description));
            }
            lines.push("Columns:".to_string());
            for column in &table.columns {
                let key_marker = if column.is_key { " [KEY]" } else { "" };
                lines.push(format!(
                    "  - {}: {}{}",
                    column.effective_dax_name(),
                    column.data_type,
                    key_marker
                ));
            }
            lines.push(String::new());
        }

        if !self.relationships.is_empty() {
            lines.push("## Relationships".to_string());
            lines.push(String::new());
            for rel in &self.relationships {
                let arrow = match rel.cardinality {
                    Cardinality::ManyToOne => "→",
                    _ => "↔",
                };
                let inactive = if rel.is_active { "" } else { " (inactive)" };
                lines.push(format!(
                    "- {}.{} {} {}.{}{}",
                    rel.from_table, rel.from_column, arrow, rel.to_table, rel.to_column, inactive
                ));
            }
        }

        lines.join("\n")
    }
}
