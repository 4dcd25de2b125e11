//! Call-scoped filter context.
//!
//! Approximates DAX filter context as a map from `TABLE.COLUMN` to a list of
//! SQL predicates. `CALCULATE` adds predicates; `ALL`/`REMOVEFILTERS`
//! remove them. A `FilterContext` belongs to exactly one translation call and
//! nested `CALCULATE` scopes work on clones, so nothing leaks between calls.

use std::collections::HashSet;

/// Predicates registered for one `table.column` key.
#[derive(Debug, Clone, PartialEq)]
struct FilterEntry {
    key: String,
    conditions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterContext {
    /// Insertion-ordered so the generated WHERE clause is deterministic.
    filters: Vec<FilterEntry>,
    removed: HashSet<String>,
}

fn filter_key(table: &str, column: &str) -> String {
    format!("{}.{}", table.to_uppercase(), column.to_uppercase())
}

impl FilterContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a predicate for `table.column`.
    ///
    /// Re-adding a filter to a removed key makes the key effective again,
    /// which is how `CALCULATE(expr, ALL(T[c]), T[c] = 1)` keeps its own filter.
    pub fn add_filter(&mut self, table: &str, column: &str, condition: impl Into<String>) {
        let key = filter_key(table, column);
        self.removed.remove(&key);
        match self.filters.iter_mut().find(|f| f.key == key) {
            Some(entry) => entry.conditions.push(condition.into()),
            None => self.filters.push(FilterEntry {
                key,
                conditions: vec![condition.into()],
            }),
        }
    }

    /// Remove filters on one column (`Some`) or on every column of a table (`None`).
    pub fn remove_filter(&mut self, table: &str, column: Option<&str>) {
        match column {
            Some(column) => {
                let key = filter_key(table, column);
                self.drop_conditions(|k| k == key);
                self.removed.insert(key);
            }
            None => {
                let prefix = format!("{}.", table.to_uppercase());
                let keys: Vec<String> = self
                    .filters
                    .iter()
                    .filter(|f| f.key.starts_with(&prefix))
                    .map(|f| f.key.clone())
                    .collect();
                self.drop_conditions(|k| k.starts_with(&prefix));
                self.removed.extend(keys);
            }
        }
    }

    /// Remove filters on every column of `table` except `keep`.
    pub fn remove_all_except(&mut self, table: &str, keep: &[&str]) {
        let keep: HashSet<String> = keep.iter().map(|c| filter_key(table, c)).collect();
        let prefix = format!("{}.", table.to_uppercase());
        let keys: Vec<String> = self
            .filters
            .iter()
            .filter(|f| f.key.starts_with(&prefix) && !keep.contains(&f.key))
            .map(|f| f.key.clone())
            .collect();
        self.drop_conditions(|k| keys.iter().any(|removed| removed == k));
        self.removed.extend(keys);
    }

    fn drop_conditions(&mut self, pred: impl Fn(&str) -> bool) {
        self.filters.retain(|f| !pred(&f.key));
    }

    pub fn is_removed(&self, table: &str, column: &str) -> bool {
        self.removed.contains(&filter_key(table, column))
    }

    /// Filters whose key has not been removed, in insertion order.
    pub fn effective_filters(&self) -> Vec<(&str, &[String])> {
        self.filters
            .iter()
            .filter(|f| !self.removed.contains(&f.key))
            .map(|f| (f.key.as_str(), f.conditions.as_slice()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.effective_filters().is_empty()
    }

    /// All effective predicates joined with `AND`; empty when there are none.
    pub fn to_where_clause(&self) -> String {
        self.effective_filters()
            .into_iter()
            .flat_map(|(_, conditions)| conditions.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    pub fn reset(&mut self) {
        self.filters.clear();
        self.removed.clear();
    }
}
