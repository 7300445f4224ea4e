use crate::graph::{Cycle, DependencyGraph};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

const TOP_FILES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageUsage {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDependencies {
    pub path: String,
    pub total: usize,
    pub internal: usize,
    pub external: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DependencyReport {
    pub files: usize,
    pub total: usize,
    pub internal: usize,
    pub external: usize,
    pub resolved_internal: usize,
    pub unresolved_internal: usize,
    pub by_import_kind: BTreeMap<String, usize>,
    /// Most used first, ties by name.
    pub external_packages: Vec<PackageUsage>,
    pub top_files: Vec<FileDependencies>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycles: Option<Vec<Cycle>>,
}

impl DependencyReport {
    pub fn from_graph(graph: &DependencyGraph) -> Self {
        let mut report = DependencyReport {
            files: graph.nodes().len(),
            ..Default::default()
        };
        let mut packages: HashMap<&str, usize> = HashMap::new();
        let mut per_file: HashMap<&str, FileDependencies> = HashMap::new();

        for edge in graph.edges() {
            report.total += 1;
            *report
                .by_import_kind
                .entry(edge.import_kind.as_str().to_string())
                .or_insert(0) += 1;
            let entry = per_file
                .entry(edge.source.as_str())
                .or_insert_with(|| FileDependencies {
                    path: edge.source.clone(),
                    total: 0,
                    internal: 0,
                    external: 0,
                });
            entry.total += 1;
            if edge.is_internal() {
                report.internal += 1;
                entry.internal += 1;
                if edge.resolved {
                    report.resolved_internal += 1;
                } else {
                    report.unresolved_internal += 1;
                }
            } else {
                report.external += 1;
                entry.external += 1;
                *packages.entry(edge.target.as_str()).or_insert(0) += 1;
            }
        }

        report.external_packages = packages
            .into_iter()
            .map(|(name, count)| PackageUsage {
                name: name.to_string(),
                count,
            })
            .collect();
        report
            .external_packages
            .sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

        let mut files: Vec<FileDependencies> = per_file.into_values().collect();
        files.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.path.cmp(&b.path)));
        files.truncate(TOP_FILES);
        report.top_files = files;
        report
    }

    pub fn with_cycles(mut self, cycles: Vec<Cycle>) -> Self {
        self.cycles = Some(cycles);
        self
    }
}
