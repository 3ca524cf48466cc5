//! Authoritative adjacency list of cell connections

use cellular_types::{CellId, CellularConnection, ConnectionType};
use std::collections::HashMap;

/// Outgoing edges per source cell.
///
/// At most one edge exists per `(source, target)` pair. Inserting an edge to
/// an existing target replaces it.
#[derive(Debug, Default, Clone)]
pub struct ConnectionGraph {
    adjacency: HashMap<CellId, Vec<CellularConnection>>,
}

impl ConnectionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the edge `connection.source_cell -> connection.target_cell`.
    ///
    /// Returns the replaced edge, if any.
    pub fn upsert(&mut self, connection: CellularConnection) -> Option<CellularConnection> {
        let edges = self
            .adjacency
            .entry(connection.source_cell.clone())
            .or_default();

        match edges
            .iter_mut()
            .find(|e| e.target_cell == connection.target_cell)
        {
            Some(existing) => Some(std::mem::replace(existing, connection)),
            None => {
                edges.push(connection);
                None
            }
        }
    }

    /// Outgoing edges of `source`, optionally filtered by type
    pub fn outgoing(
        &self,
        source: &CellId,
        filter: Option<ConnectionType>,
    ) -> Vec<CellularConnection> {
        self.adjacency
            .get(source)
            .map(|edges| edges.iter().filter(|e| e.matches(filter)).cloned().collect())
            .unwrap_or_default()
    }

    pub fn get(&self, source: &CellId, target: &CellId) -> Option<&CellularConnection> {
        self.adjacency
            .get(source)?
            .iter()
            .find(|e| &e.target_cell == target)
    }

    /// Remove a single directed edge.
    pub fn remove(&mut self, source: &CellId, target: &CellId) -> Option<CellularConnection> {
        let edges = self.adjacency.get_mut(source)?;
        let index = edges.iter().position(|e| &e.target_cell == target)?;
        let removed = edges.remove(index);
        if edges.is_empty() {
            self.adjacency.remove(source);
        }
        Some(removed)
    }

    /// Remove every edge touching `cell`, in either direction.
    ///
    /// Returns the sources that lost an edge into `cell`.
    pub fn remove_cell(&mut self, cell: &CellId) -> Vec<CellId> {
        self.adjacency.remove(cell);

        let mut sources = Vec::new();
        self.adjacency.retain(|source, edges| {
            let before = edges.len();
            edges.retain(|e| &e.target_cell != cell);
            if edges.len() != before {
                sources.push(source.clone());
            }
            !edges.is_empty()
        });
        sources
    }

    /// Stamp `last_used` on an edge.
    pub fn touch(&mut self, source: &CellId, target: &CellId) -> bool {
        match self.get_mut(source, target) {
            Some(edge) => {
                edge.touch();
                true
            }
            None => false,
        }
    }

    /// Change the weight of one direction only.
    pub fn set_strength(&mut self, source: &CellId, target: &CellId, strength: f64) -> bool {
        match self.get_mut(source, target) {
            Some(edge) => {
                edge.strength = strength;
                true
            }
            None => false,
        }
    }

    pub fn out_degree(&self, source: &CellId) -> usize {
        self.adjacency.get(source).map_or(0, Vec::len)
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    fn get_mut(&mut self, source: &CellId, target: &CellId) -> Option<&mut CellularConnection> {
        self.adjacency
            .get_mut(source)?
            .iter_mut()
            .find(|e| &e.target_cell == target)
    }
}
