//! Dependency closure resolution.
//!
//! Depth-first traversal from a project node collecting every reachable
//! external registry package, with peer dependency expansion per external
//! node. Visited sets keep cycles and diamonds from recursing forever.

use serde::{Deserialize, Serialize};
use std::collections::{btree_map, BTreeMap, HashSet};

use crate::graph::{external_node_name, DependencyGraph, ProjectKind};
use crate::peers::PeerLookup;

/// Closure of external packages a project needs: package name to installed
/// version. Keys are unique and iteration order is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageClosure(BTreeMap<String, String>);

impl PackageClosure {
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Record a package version. The first recorded version wins; later
    /// records of the same package are ignored.
    pub fn record(&mut self, package: impl Into<String>, version: impl Into<String>) {
        self.0.entry(package.into()).or_insert_with(|| version.into());
    }

    /// Merge another closure in, keeping existing entries on conflict.
    pub fn merge(&mut self, other: PackageClosure) {
        for (package, version) in other.0 {
            self.0.entry(package).or_insert(version);
        }
    }

    #[must_use]
    pub fn version(&self, package: &str) -> Option<&str> {
        self.0.get(package).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, package: &str) -> bool {
        self.0.contains_key(package)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a PackageClosure {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for PackageClosure {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Resolve the full external dependency closure of `project`.
///
/// Each graph node is processed at most once per call, so cycles and diamonds
/// terminate. An external node contributes its own package plus the peers it
/// transitively requires; edges whose target is missing from the node map are
/// dead ends.
#[must_use]
pub fn resolve_closure(
    project: &str,
    graph: &DependencyGraph,
    peer_lookup: &dyn PeerLookup,
) -> PackageClosure {
    let mut closure = PackageClosure::new();
    let mut visited: HashSet<String> = HashSet::new();
    visit(project, graph, peer_lookup, &mut visited, &mut closure);
    closure
}

fn visit(
    name: &str,
    graph: &DependencyGraph,
    peer_lookup: &dyn PeerLookup,
    visited: &mut HashSet<String>,
    closure: &mut PackageClosure,
) {
    if !visited.insert(name.to_string()) {
        return;
    }

    let Some(node) = graph.node(name) else {
        return;
    };

    if let ProjectKind::External {
        package_name,
        version,
    } = &node.kind
    {
        closure.record(package_name.clone(), version.clone());
        closure.merge(collect_peers(name, graph, peer_lookup));
    }

    for edge in graph.edges_of(name) {
        visit(&edge.target, graph, peer_lookup, visited, closure);
    }
}

/// Collect the peer packages an external node transitively requires.
///
/// Runs with its own visited set per call. Peer metadata is advisory: a
/// failed lookup yields whatever was gathered so far, and declared peers
/// with no matching `npm:` node are skipped.
#[must_use]
pub fn collect_peers(
    project: &str,
    graph: &DependencyGraph,
    peer_lookup: &dyn PeerLookup,
) -> PackageClosure {
    let mut closure = PackageClosure::new();
    let mut visited: HashSet<String> = HashSet::new();
    visit_peers(project, graph, peer_lookup, &mut visited, &mut closure);
    closure
}

fn visit_peers(
    name: &str,
    graph: &DependencyGraph,
    peer_lookup: &dyn PeerLookup,
    visited: &mut HashSet<String>,
    closure: &mut PackageClosure,
) {
    if !visited.insert(name.to_string()) {
        return;
    }

    let Some(node) = graph.node(name) else {
        return;
    };
    let ProjectKind::External { package_name, .. } = &node.kind else {
        return;
    };
    let Some(peers) = peer_lookup.declared_peers(package_name) else {
        return;
    };

    for peer in peers {
        let peer_node_name = external_node_name(&peer);
        let Some(peer_node) = graph.node(&peer_node_name) else {
            continue;
        };

        if let ProjectKind::External {
            package_name,
            version,
        } = &peer_node.kind
        {
            closure.record(package_name.clone(), version.clone());
        }

        visit_peers(&peer_node_name, graph, peer_lookup, visited, closure);
    }
}
