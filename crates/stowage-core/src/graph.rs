//! Workspace project graph.
//!
//! The graph is an immutable snapshot for one packaging run: project nodes
//! (workspace members and external registry packages) plus directed dependency
//! edges. External packages are keyed under the `npm:` namespace so peer names
//! can be resolved back to nodes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Namespace prefix for external registry packages in the node map.
pub const EXTERNAL_PREFIX: &str = "npm:";

/// Graph node name for an external registry package.
#[must_use]
pub fn external_node_name(package: &str) -> String {
    format!("{EXTERNAL_PREFIX}{package}")
}

/// What a project node represents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProjectKind {
    /// A workspace member. Paths are relative to the workspace root.
    #[serde(rename_all = "camelCase")]
    Workspace {
        /// Directory containing the project's manifest.
        source_root: String,
        /// Directory the packaged output is rooted at.
        root_dir: String,
    },
    /// An installed external registry package.
    #[serde(rename_all = "camelCase")]
    External {
        /// Registry package name (e.g. `react` or `@types/node`).
        package_name: String,
        /// Installed version.
        version: String,
    },
}

/// A node in the project graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectNode {
    /// Unique node name (`npm:`-prefixed for external packages).
    pub name: String,
    pub kind: ProjectKind,
}

impl ProjectNode {
    /// Create a workspace member node.
    #[must_use]
    pub fn workspace(
        name: impl Into<String>,
        source_root: impl Into<String>,
        root_dir: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ProjectKind::Workspace {
                source_root: source_root.into(),
                root_dir: root_dir.into(),
            },
        }
    }

    /// Create an external package node, keyed under the `npm:` namespace.
    #[must_use]
    pub fn external(package_name: impl Into<String>, version: impl Into<String>) -> Self {
        let package_name = package_name.into();
        Self {
            name: external_node_name(&package_name),
            kind: ProjectKind::External {
                package_name,
                version: version.into(),
            },
        }
    }

    #[must_use]
    pub fn is_workspace(&self) -> bool {
        matches!(self.kind, ProjectKind::Workspace { .. })
    }

    #[must_use]
    pub fn is_external(&self) -> bool {
        matches!(self.kind, ProjectKind::External { .. })
    }
}

/// A directed dependency edge between two node names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub source: String,
    pub target: String,
}

impl DependencyEdge {
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Immutable workspace graph snapshot.
///
/// Edges may reference names missing from the node map; traversals treat those
/// as dead ends. Cycles are allowed.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Absolute path to the workspace root.
    pub workspace_root: PathBuf,
    nodes: HashMap<String, ProjectNode>,
    edges: HashMap<String, Vec<DependencyEdge>>,
}

impl DependencyGraph {
    /// Create an empty graph rooted at `workspace_root`.
    #[must_use]
    pub fn new(workspace_root: PathBuf) -> Self {
        Self {
            workspace_root,
            nodes: HashMap::new(),
            edges: HashMap::new(),
        }
    }

    /// Insert a node, replacing any node with the same name.
    pub fn add_node(&mut self, node: ProjectNode) {
        self.nodes.insert(node.name.clone(), node);
    }

    /// Append a directed edge. The target need not exist in the node map.
    pub fn add_edge(&mut self, source: impl Into<String>, target: impl Into<String>) {
        let source = source.into();
        let edge = DependencyEdge::new(source.clone(), target);
        self.edges.entry(source).or_default().push(edge);
    }

    /// Look up a node by name.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<&ProjectNode> {
        self.nodes.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Outgoing edges of a node, in insertion order. Empty for unknown names.
    #[must_use]
    pub fn edges_of(&self, name: &str) -> &[DependencyEdge] {
        self.edges.get(name).map_or(&[], Vec::as_slice)
    }

    /// All workspace member nodes, sorted by name.
    #[must_use]
    pub fn workspace_projects(&self) -> Vec<&ProjectNode> {
        let mut projects: Vec<&ProjectNode> =
            self.nodes.values().filter(|n| n.is_workspace()).collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        projects
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
