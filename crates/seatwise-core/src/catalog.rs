//! # Table Catalog
//!
//! A venue's tables plus the combinability graph: which tables may be
//! physically joined. The candidate generator asks this module two
//! questions: "which tables exist?" and "do these tables form a clique?".

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::types::{Table, TableId};

// =============================================================================
// Table Catalog
// =============================================================================

/// The venue's tables and which of them may be joined.
///
/// ## Combinability Graph
/// Edges are undirected: if T2 may be joined with T3, T3 may be joined with
/// T2. A combination candidate is valid only if *all* member tables are
/// pairwise joined - a clique - so probing a pair checks one edge and a
/// triple checks three.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableCatalog {
    tables: HashMap<TableId, Table>,
    /// Undirected combinability edges, stored per table.
    edges: HashMap<TableId, BTreeSet<TableId>>,
}

impl TableCatalog {
    /// Builds a catalog from tables and undirected combinability edges.
    ///
    /// Edges referencing unknown table ids are dropped; the graph only ever
    /// speaks about tables the catalog knows.
    pub fn new(tables: Vec<Table>, edges: Vec<(TableId, TableId)>) -> Self {
        let tables: HashMap<TableId, Table> =
            tables.into_iter().map(|t| (t.id.clone(), t)).collect();

        let mut adjacency: HashMap<TableId, BTreeSet<TableId>> = HashMap::new();
        for (a, b) in edges {
            if a == b || !tables.contains_key(&a) || !tables.contains_key(&b) {
                continue;
            }
            adjacency.entry(a.clone()).or_default().insert(b.clone());
            adjacency.entry(b).or_default().insert(a);
        }

        TableCatalog {
            tables,
            edges: adjacency,
        }
    }

    /// Looks up a table by id.
    pub fn table(&self, id: &str) -> Option<&Table> {
        self.tables.get(id)
    }

    /// All active tables, sorted by id for deterministic enumeration.
    pub fn active_tables(&self) -> Vec<&Table> {
        let mut tables: Vec<&Table> = self.tables.values().filter(|t| t.is_active).collect();
        tables.sort_by(|a, b| a.id.cmp(&b.id));
        tables
    }

    /// Whether two tables may be physically joined.
    pub fn joinable(&self, a: &str, b: &str) -> bool {
        self.edges.get(a).map_or(false, |set| set.contains(b))
    }

    /// Whether every pair in `ids` is joinable (the clique test).
    ///
    /// A single id is trivially a clique; the empty set is not a candidate
    /// and returns false.
    pub fn is_clique(&self, ids: &[TableId]) -> bool {
        match ids.len() {
            0 => false,
            1 => self.tables.contains_key(&ids[0]),
            _ => ids.iter().enumerate().all(|(i, a)| {
                ids[i + 1..].iter().all(|b| self.joinable(a, b))
            }),
        }
    }

    /// Combined maximum capacity over `ids`; `None` if any id is unknown.
    pub fn combined_capacity(&self, ids: &[TableId]) -> Option<u32> {
        ids.iter()
            .map(|id| self.tables.get(id).map(|t| t.capacity_max))
            .sum()
    }

    /// Number of tables in the catalog (active or not).
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// True when the catalog holds no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
