use crate::graph::DependencyGraph;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// A closed walk over internal files: the first path is repeated at the end.
/// A self-import is `[a, a]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cycle(pub Vec<String>);

impl Cycle {
    pub fn path(&self) -> &[String] {
        &self.0
    }

    /// Files in the cycle, without the closing repeat.
    pub fn files(&self) -> &[String] {
        &self.0[..self.0.len().saturating_sub(1)]
    }

    pub fn edge_count(&self) -> usize {
        self.0.len().saturating_sub(1)
    }
}

/// Reports cycles found as back edges of a depth-first traversal over
/// resolved internal edges.
///
/// Each node is expanded at most once, so the traversal is O(nodes + edges).
/// Every cycle reported is real, but this is not an exhaustive enumeration:
/// a cycle that can only be closed through a node already fully explored
/// from an earlier branch or root is not reported separately. At least one
/// cycle is reported for every strongly connected component that has one.
pub fn find_cycles(graph: &DependencyGraph) -> Vec<Cycle> {
    let adjacency = graph.internal_adjacency();
    let nodes = graph.nodes();
    let mut visited = vec![false; nodes.len()];
    let mut on_stack = vec![false; nodes.len()];
    let mut seen: HashSet<Vec<usize>> = HashSet::new();
    let mut cycles = Vec::new();

    for start in 0..nodes.len() {
        if visited[start] {
            continue;
        }
        // (node, index of the next successor to look at)
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        let mut path: Vec<usize> = vec![start];
        on_stack[start] = true;

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let Some(&next) = adjacency[node].get(frame.1) else {
                visited[node] = true;
                on_stack[node] = false;
                path.pop();
                stack.pop();
                continue;
            };
            frame.1 += 1;

            if on_stack[next] {
                if let Some(pos) = path.iter().position(|&idx| idx == next) {
                    let mut cycle = path[pos..].to_vec();
                    cycle.push(next);
                    if seen.insert(cycle.clone()) {
                        cycles.push(Cycle(
                            cycle.into_iter().map(|idx| nodes[idx].clone()).collect(),
                        ));
                    }
                }
            } else if !visited[next] {
                on_stack[next] = true;
                path.push(next);
                stack.push((next, 0));
            }
        }
    }
    debug!(cycles = cycles.len(), "cycle detection complete");
    cycles
}
