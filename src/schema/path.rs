//! Join path finding over the relationship graph.
//!
//! Relationships are traversed in either direction: filter propagation in a
//! star schema runs both ways for the purpose of building joins.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::debug;

use super::context::{normalize, SchemaContext};
use super::error::{SchemaError, SchemaResult};
use super::types::Relationship;

/// Parent node and the edge used to reach a node during BFS.
struct ParentInfo {
    parent: NodeIndex,
    edge_idx: EdgeIndex,
}

impl SchemaContext {
    /// Graph node for a table, trying every name the table goes by.
    fn node_for(&self, table: &str) -> Option<NodeIndex> {
        self.aliases(table)
            .iter()
            .find_map(|name| self.graph_nodes.get(&normalize(name)).copied())
    }

    /// Canonical key for a table: its SQL name when registered.
    fn table_key(&self, table: &str) -> String {
        normalize(self.sql_table_name(table).unwrap_or(table))
    }

    fn missing(&self, table: &str, from: &str, to: &str) -> SchemaError {
        if self.table(table).is_some() {
            SchemaError::NoPath {
                from: from.into(),
                to: to.into(),
            }
        } else {
            SchemaError::UnknownTable(table.into())
        }
    }

    /// Shortest chain of active relationships from `from` to `to` (BFS).
    ///
    /// Returns an empty path when both names denote the same table,
    /// [`SchemaError::NoPath`] when the tables are disconnected, and
    /// [`SchemaError::UnknownTable`] when a name is neither a registered table
    /// nor a relationship endpoint.
    pub fn join_path(&self, from: &str, to: &str) -> SchemaResult<Vec<&Relationship>> {
        if self.table_key(from) == self.table_key(to) {
            return Ok(Vec::new());
        }

        let from_idx = self
            .node_for(from)
            .ok_or_else(|| self.missing(from, from, to))?;
        let to_idx = self
            .node_for(to)
            .ok_or_else(|| self.missing(to, from, to))?;

        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut parents: HashMap<NodeIndex, ParentInfo> = HashMap::new();
        let mut queue: VecDeque<NodeIndex> = VecDeque::new();

        queue.push_back(from_idx);
        visited.insert(from_idx);

        while let Some(current) = queue.pop_front() {
            for edge_ref in self.graph.edges(current) {
                let neighbor = if edge_ref.source() == current {
                    edge_ref.target()
                } else {
                    edge_ref.source()
                };
                if visited.contains(&neighbor) {
                    continue;
                }

                parents.insert(
                    neighbor,
                    ParentInfo {
                        parent: current,
                        edge_idx: edge_ref.id(),
                    },
                );

                if neighbor == to_idx {
                    return Ok(self.reconstruct_path(from_idx, neighbor, &parents));
                }

                visited.insert(neighbor);
                queue.push_back(neighbor);
            }
        }

        Err(SchemaError::NoPath {
            from: from.into(),
            to: to.into(),
        })
    }

    fn reconstruct_path(
        &self,
        from_idx: NodeIndex,
        to_idx: NodeIndex,
        parents: &HashMap<NodeIndex, ParentInfo>,
    ) -> Vec<&Relationship> {
        let mut path = Vec::new();
        let mut current = to_idx;
        while current != from_idx {
            let Some(info) = parents.get(&current) else {
                break;
            };
            path.push(&self.relationships()[self.graph[info.edge_idx]]);
            current = info.parent;
        }
        path.reverse();
        path
    }

    /// Is there any route between the two tables?
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        self.join_path(from, to).is_ok()
    }

    /// One `JOIN <table> ON <condition>` clause per relationship needed to
    /// reach every table in `tables` from the first one.
    ///
    /// Each later table is connected through the shortest path from any table
    /// already joined. A table that cannot be reached is an error.
    pub fn join_clauses(&self, tables: &[&str]) -> SchemaResult<Vec<String>> {
        let Some((base, rest)) = tables.split_first() else {
            return Ok(Vec::new());
        };

        let mut joined: Vec<String> = vec![self.table_key(base)];
        let mut joined_names: Vec<&str> = vec![*base];
        let mut clauses = Vec::new();

        for table in rest {
            if joined.contains(&self.table_key(table)) {
                continue;
            }

            let best = joined_names
                .iter()
                .filter_map(|start| self.join_path(start, table).ok())
                .min_by_key(|path| path.len());

            let Some(path) = best else {
                debug!(base = *base, table = *table, "table unreachable from join base");
                return Err(SchemaError::NoPath {
                    from: base.to_string(),
                    to: table.to_string(),
                });
            };

            for rel in path {
                let from_key = self.table_key(&rel.from_table);
                let join_table = if joined.contains(&from_key) {
                    &rel.to_table
                } else {
                    &rel.from_table
                };
                let key = self.table_key(join_table);
                if joined.contains(&key) {
                    continue;
                }
                let physical = self
                    .table(join_table)
                    .map(|t| t.full_name())
                    .unwrap_or_else(|| join_table.clone());
                clauses.push(format!("JOIN {} ON {}", physical, rel.as_join()));
                joined.push(key);
                joined_names.push(join_table);
            }
        }

        Ok(clauses)
    }

    /// [`join_clauses`](Self::join_clauses) joined by newlines.
    pub fn generate_joins(&self, tables: &[&str]) -> SchemaResult<String> {
        Ok(self.join_clauses(tables)?.join("\n"))
    }
}
