//! Dependency graph over extracted import lists.
//!
//! The graph is an arena: file paths are interned into `nodes` and edges
//! refer to them by path. It is built once from a complete set of
//! [`FileSchema`]s and never mutated afterwards.

use crate::model::{FileSchema, ImportKind};
use resolve::{ModuleResolver, Resolution};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

pub mod cycles;
pub mod report;
pub mod resolve;

pub use cycles::{Cycle, find_cycles};
pub use report::DependencyReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Internal,
    External,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub source: String,
    /// Scanned file path for resolved internal edges, raw specifier otherwise.
    pub target: String,
    pub kind: EdgeKind,
    pub import_kind: ImportKind,
    /// False for internal-looking specifiers that matched no scanned file.
    pub resolved: bool,
    pub line: usize,
}

impl DependencyEdge {
    pub fn is_internal(&self) -> bool {
        self.kind == EdgeKind::Internal
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DependencyGraph {
    nodes: Vec<String>,
    edges: Vec<DependencyEdge>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl DependencyGraph {
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    pub fn node_index(&self, path: &str) -> Option<usize> {
        self.index.get(path).copied()
    }

    pub fn internal_edges(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.edges.iter().filter(|edge| edge.is_internal())
    }

    pub fn external_edges(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.edges.iter().filter(|edge| !edge.is_internal())
    }

    pub fn edges_from<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a DependencyEdge> + 'a {
        self.edges.iter().filter(move |edge| edge.source == path)
    }

    /// Successor lists over resolved internal edges, by node index. Each
    /// list is sorted and duplicate-free.
    pub fn internal_adjacency(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.nodes.len()];
        for edge in self.internal_edges().filter(|edge| edge.resolved) {
            if let (Some(from), Some(to)) = (self.node_index(&edge.source), self.node_index(&edge.target)) {
                adjacency[from].push(to);
            }
        }
        for successors in &mut adjacency {
            successors.sort_unstable();
            successors.dedup();
        }
        adjacency
    }
}

/// Builds the graph. Nodes are every schema's path (sorted); one edge is
/// emitted per import occurrence, repeats included.
pub fn build<'a>(schemas: impl IntoIterator<Item = &'a FileSchema>) -> DependencyGraph {
    let schemas: Vec<&FileSchema> = schemas.into_iter().collect();
    let mut nodes: Vec<String> = schemas.iter().map(|schema| schema.path.clone()).collect();
    nodes.sort();
    nodes.dedup();
    let index = nodes
        .iter()
        .enumerate()
        .map(|(idx, path)| (path.clone(), idx))
        .collect();
    let resolver = ModuleResolver::new(nodes.iter().cloned());

    let mut edges = Vec::new();
    for schema in &schemas {
        for import in &schema.imports {
            let (target, kind, resolved) =
                match resolver.resolve(&schema.path, &schema.language, import) {
                    Resolution::Internal(path) => (path, EdgeKind::Internal, true),
                    Resolution::Unresolved => (import.name.clone(), EdgeKind::Internal, false),
                    Resolution::External => (import.name.clone(), EdgeKind::External, false),
                };
            edges.push(DependencyEdge {
                source: schema.path.clone(),
                target,
                kind,
                import_kind: import.kind,
                resolved,
                line: import.line,
            });
        }
    }
    debug!(nodes = nodes.len(), edges = edges.len(), "dependency graph built");
    DependencyGraph {
        nodes,
        edges,
        index,
    }
}
