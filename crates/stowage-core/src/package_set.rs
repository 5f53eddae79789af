//! Package set builder.
//!
//! Turns a list of target projects into synthesized manifests paired with
//! absolute output directories, preserving the caller's target order.

use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::closure::resolve_closure;
use crate::graph::{DependencyGraph, ProjectKind};
use crate::manifest::{synthesize, Manifest};
use crate::paths;
use crate::peers::PeerLookup;

/// Options for a packaging run.
#[derive(Debug, Clone)]
pub struct PackOptions {
    /// Restrict packaging to projects affected by pending changes. Consumed
    /// by the orchestration layer before the builder runs.
    pub only_affected: bool,

    /// Base directory project roots are resolved against for output.
    pub working_directory: PathBuf,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            only_affected: true,
            working_directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

/// One packaged project: its synthesized manifest and absolute output
/// directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageEntry {
    pub manifest: Manifest,
    pub dir: PathBuf,
}

/// Build the package set for `targets`, preserving input order.
///
/// Each target resolves its closure, synthesizes its manifest, and maps its
/// declared root to an absolute directory under the working directory. A
/// relative working directory is resolved against the process working
/// directory first, so entry dirs are always absolute.
/// Targets with no workspace node in the graph are skipped; callers that take
/// explicit target names validate them up front. Duplicate targets collapse
/// to their first occurrence.
#[must_use]
pub fn build_package_set(
    targets: &[String],
    graph: &DependencyGraph,
    root_manifest: &Manifest,
    scope: &str,
    peer_lookup: &dyn PeerLookup,
    opts: &PackOptions,
) -> Vec<PackageEntry> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let out_base = paths::absolutize(&cwd, &opts.working_directory);

    let mut seen = HashSet::with_capacity(targets.len());
    let mut entries = Vec::with_capacity(targets.len());

    for target in targets {
        if !seen.insert(target.as_str()) {
            continue;
        }
        let Some(node) = graph.node(target) else {
            continue;
        };
        let ProjectKind::Workspace { root_dir, .. } = &node.kind else {
            continue;
        };

        let closure = resolve_closure(target, graph, peer_lookup);
        let manifest = synthesize(target, &closure, graph, root_manifest, scope);
        let dir = paths::absolutize(&out_base, Path::new(root_dir));

        entries.push(PackageEntry { manifest, dir });
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ProjectNode;
    use crate::peers::StaticPeerLookup;
    use std::fs;
    use tempfile::tempdir;

    fn opts(working_directory: &Path) -> PackOptions {
        PackOptions {
            only_affected: false,
            working_directory: working_directory.to_path_buf(),
        }
    }

    fn scenario_graph(root: &Path) -> DependencyGraph {
        let mut g = DependencyGraph::new(root.to_path_buf());
        g.add_node(ProjectNode::workspace("A", "packages/A", "packages/A"));
        g.add_node(ProjectNode::workspace("B", "packages/B", "packages/B"));
        g.add_node(ProjectNode::external("x", "2.0.0"));
        g.add_edge("A", "B");
        g.add_edge("A", "npm:x");
        g.add_edge("B", "npm:x");
        g
    }

    #[test]
    fn test_build_scenario_package_set() {
        let dir = tempdir().unwrap();
        let g = scenario_graph(dir.path());
        let targets = vec!["A".to_string(), "B".to_string()];

        let entries = build_package_set(
            &targets,
            &g,
            &Manifest::default(),
            "acme",
            &StaticPeerLookup::default(),
            &opts(dir.path()),
        );

        assert_eq!(entries.len(), 2);

        let a = &entries[0];
        assert_eq!(a.manifest.name, "@acme/A");
        assert_eq!(
            a.manifest.dependencies.get("x").map(String::as_str),
            Some("2.0.0")
        );
        assert_eq!(
            a.manifest.dependencies.get("@acme/B").map(String::as_str),
            Some("*")
        );
        assert!(a.manifest.dev_dependencies.is_empty());
        assert_eq!(a.dir, dir.path().join("packages/A"));

        let b = &entries[1];
        assert_eq!(
            b.manifest.dependencies.get("x").map(String::as_str),
            Some("2.0.0")
        );
        assert!(!b.manifest.dependencies.contains_key("@acme/A"));
    }

    #[test]
    fn test_target_order_is_preserved() {
        let dir = tempdir().unwrap();
        let g = scenario_graph(dir.path());
        let targets = vec!["B".to_string(), "A".to_string()];

        let entries = build_package_set(
            &targets,
            &g,
            &Manifest::default(),
            "acme",
            &StaticPeerLookup::default(),
            &opts(dir.path()),
        );

        assert_eq!(entries[0].manifest.name, "@acme/B");
        assert_eq!(entries[1].manifest.name, "@acme/A");
    }

    #[test]
    fn test_unknown_and_external_targets_are_skipped() {
        let dir = tempdir().unwrap();
        let g = scenario_graph(dir.path());
        let targets = vec![
            "ghost".to_string(),
            "npm:x".to_string(),
            "A".to_string(),
        ];

        let entries = build_package_set(
            &targets,
            &g,
            &Manifest::default(),
            "acme",
            &StaticPeerLookup::default(),
            &opts(dir.path()),
        );

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].manifest.name, "@acme/A");
    }

    #[test]
    fn test_relative_working_directory_yields_absolute_dirs() {
        let dir = tempdir().unwrap();
        let g = scenario_graph(dir.path());
        let targets = vec!["A".to_string()];
        let o = PackOptions {
            only_affected: false,
            working_directory: PathBuf::from("build"),
        };

        let entries = build_package_set(
            &targets,
            &g,
            &Manifest::default(),
            "acme",
            &StaticPeerLookup::default(),
            &o,
        );

        let cwd = std::env::current_dir().unwrap();
        assert!(entries[0].dir.is_absolute(), "dir must be absolute");
        assert!(entries[0].dir.starts_with(&cwd));
        assert!(entries[0].dir.ends_with("build/packages/A"));
    }

    #[test]
    fn test_duplicate_targets_collapse_to_first() {
        let dir = tempdir().unwrap();
        let g = scenario_graph(dir.path());
        let targets = vec![
            "A".to_string(),
            "A".to_string(),
            "B".to_string(),
            "A".to_string(),
        ];

        let entries = build_package_set(
            &targets,
            &g,
            &Manifest::default(),
            "acme",
            &StaticPeerLookup::default(),
            &opts(dir.path()),
        );

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].manifest.name, "@acme/A");
        assert_eq!(entries[1].manifest.name, "@acme/B");
    }

    #[test]
    fn test_build_is_idempotent() {
        let dir = tempdir().unwrap();
        // Real on-disk manifest so the second run reads the same state.
        let a_dir = dir.path().join("packages/A");
        fs::create_dir_all(&a_dir).unwrap();
        fs::write(
            a_dir.join("package.json"),
            r#"{"name": "@acme/A", "version": "1.0.0"}"#,
        )
        .unwrap();

        let g = scenario_graph(dir.path());
        let targets = vec!["A".to_string()];
        let root = Manifest::default();
        let lookup = StaticPeerLookup::default();
        let o = opts(dir.path());

        let first = build_package_set(&targets, &g, &root, "acme", &lookup, &o);
        let second = build_package_set(&targets, &g, &root, "acme", &lookup, &o);

        assert_eq!(first, second);
    }

    #[test]
    fn test_default_options() {
        let o = PackOptions::default();
        assert!(o.only_affected);
        assert!(!o.working_directory.as_os_str().is_empty());
    }
}
