//! Filesystem graph provider.
//!
//! Scans a workspace rooted at a `package.json` with a `workspaces` field and
//! builds the project graph: one node per member, workspace edges between
//! members, and `npm:` external nodes for registry dependencies found
//! installed under the root `node_modules/`. Supports the array form
//! (`"workspaces": ["packages/*"]`) and the yarn-style object form.

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::Error;
use crate::graph::{external_node_name, DependencyGraph, ProjectNode};
use crate::manifest::Manifest;

/// A discovered workspace member.
#[derive(Debug, Clone)]
struct Member {
    /// Project name: the package name with its scope stripped.
    project: String,
    /// Full package name from the member manifest.
    package_name: String,
    /// Member directory, relative to the workspace root, forward slashes.
    rel_dir: String,
    manifest: Manifest,
}

/// Build the project graph for the workspace rooted at `root`.
///
/// The root manifest is a precondition: missing, malformed, or without a
/// usable `workspaces` configuration is a hard failure. Members that fail to
/// load and dependencies that are not installed are skipped silently.
///
/// Member and dependency iteration is sorted, so the resulting graph is
/// deterministic for a given tree.
///
/// # Errors
/// Returns an error if the root manifest cannot be loaded or declares no
/// workspace patterns.
pub fn load_graph(root: &Path) -> Result<DependencyGraph, Error> {
    let manifest_path = root.join("package.json");
    let root_manifest = Manifest::load_root(&manifest_path)?;

    let patterns = workspace_patterns(&root_manifest);
    if patterns.is_empty() {
        return Err(Error::NoWorkspaces {
            path: manifest_path,
        });
    }

    let members = discover_members(root, &patterns);

    let by_package: BTreeMap<&str, &str> = members
        .values()
        .map(|m| (m.package_name.as_str(), m.project.as_str()))
        .collect();

    let mut graph = DependencyGraph::new(root.to_path_buf());

    for member in members.values() {
        graph.add_node(ProjectNode::workspace(
            member.project.clone(),
            member.rel_dir.clone(),
            member.rel_dir.clone(),
        ));
    }

    for member in members.values() {
        let mut deps: BTreeSet<&String> = member.manifest.dependencies.keys().collect();
        deps.extend(member.manifest.dev_dependencies.keys());

        for dep in deps {
            if let Some(project) = by_package.get(dep.as_str()) {
                if *project != member.project {
                    graph.add_edge(member.project.clone(), (*project).to_string());
                }
            } else if let Some(version) = installed_version(root, dep) {
                let node_name = external_node_name(dep);
                if !graph.contains(&node_name) {
                    graph.add_node(ProjectNode::external(dep.clone(), version));
                }
                graph.add_edge(member.project.clone(), node_name);
            }
        }
    }

    Ok(graph)
}

/// Workspace glob patterns from the root manifest, or empty if none.
fn workspace_patterns(root_manifest: &Manifest) -> Vec<String> {
    let Some(workspaces) = root_manifest.extra.get("workspaces") else {
        return Vec::new();
    };

    match workspaces {
        Value::Array(arr) => arr
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        // { "packages": ["packages/*"] } format (yarn-style)
        Value::Object(obj) => obj
            .get("packages")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Expand patterns and load member manifests, keyed by project name.
fn discover_members(root: &Path, patterns: &[String]) -> BTreeMap<String, Member> {
    let mut members = BTreeMap::new();

    for pattern in patterns {
        let full_pattern = root.join(pattern);
        let pattern_str = full_pattern.to_string_lossy();

        if let Ok(entries) = glob::glob(&pattern_str) {
            for entry in entries.flatten() {
                if let Some(member) = read_member(root, &entry) {
                    members.entry(member.project.clone()).or_insert(member);
                }
            }
        }
    }

    members
}

/// Load one member directory, or `None` if it has no usable manifest.
fn read_member(root: &Path, dir: &Path) -> Option<Member> {
    if !dir.is_dir() {
        return None;
    }

    let manifest = Manifest::load(&dir.join("package.json"))?;
    if manifest.name.is_empty() {
        return None;
    }

    let rel = dir.strip_prefix(root).ok()?;
    let rel_dir = rel.to_string_lossy().replace('\\', "/");
    let project = project_name(&manifest.name).to_string();

    Some(Member {
        project,
        package_name: manifest.name.clone(),
        rel_dir,
        manifest,
    })
}

/// Project name for a package: `@acme/util` becomes `util`.
fn project_name(package_name: &str) -> &str {
    if package_name.starts_with('@') {
        package_name.split('/').nth(1).unwrap_or(package_name)
    } else {
        package_name
    }
}

/// Version of a package installed under the root `node_modules/`, if any.
fn installed_version(root: &Path, package: &str) -> Option<String> {
    let mut path = root.join("node_modules");
    for part in package.split('/') {
        path.push(part);
    }

    let text = stowage_util::fs::read_to_string_lossy(&path.join("package.json")).ok()?;
    let value: Value = serde_json::from_str(&text).ok()?;
    Some(value.get("version")?.as_str()?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closure::resolve_closure;
    use crate::graph::ProjectKind;
    use crate::peers::StaticPeerLookup;
    use std::fs;
    use tempfile::tempdir;

    fn write_json(root: &Path, rel: &str, json: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, json).unwrap();
    }

    fn fixture_workspace(root: &Path) {
        write_json(
            root,
            "package.json",
            r#"{"name": "@acme/root", "workspaces": ["packages/*"]}"#,
        );
        write_json(
            root,
            "packages/app/package.json",
            r#"{"name": "@acme/app", "version": "1.0.0",
                "dependencies": {"@acme/util": "*", "react": "^18"}}"#,
        );
        write_json(
            root,
            "packages/util/package.json",
            r#"{"name": "@acme/util", "version": "1.0.0",
                "dependencies": {"react": "^18"}}"#,
        );
        write_json(
            root,
            "node_modules/react/package.json",
            r#"{"name": "react", "version": "18.2.0"}"#,
        );
    }

    #[test]
    fn test_load_graph_array_form() {
        let dir = tempdir().unwrap();
        fixture_workspace(dir.path());

        let graph = load_graph(dir.path()).unwrap();

        let names: Vec<&str> = graph
            .workspace_projects()
            .iter()
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(names, vec!["app", "util"]);

        let react = graph.node("npm:react").unwrap();
        assert_eq!(
            react.kind,
            ProjectKind::External {
                package_name: "react".to_string(),
                version: "18.2.0".to_string()
            }
        );

        let app_targets: Vec<&str> = graph
            .edges_of("app")
            .iter()
            .map(|e| e.target.as_str())
            .collect();
        assert_eq!(app_targets, vec!["util", "npm:react"]);
    }

    #[test]
    fn test_load_graph_object_form() {
        let dir = tempdir().unwrap();
        write_json(
            dir.path(),
            "package.json",
            r#"{"name": "root", "workspaces": {"packages": ["libs/*"]}}"#,
        );
        write_json(
            dir.path(),
            "libs/core/package.json",
            r#"{"name": "core", "version": "0.1.0"}"#,
        );

        let graph = load_graph(dir.path()).unwrap();
        assert!(graph.contains("core"));
    }

    #[test]
    fn test_member_paths_are_relative() {
        let dir = tempdir().unwrap();
        fixture_workspace(dir.path());

        let graph = load_graph(dir.path()).unwrap();
        let app = graph.node("app").unwrap();
        assert_eq!(
            app.kind,
            ProjectKind::Workspace {
                source_root: "packages/app".to_string(),
                root_dir: "packages/app".to_string()
            }
        );
    }

    #[test]
    fn test_missing_root_manifest_is_hard_error() {
        let dir = tempdir().unwrap();
        let err = load_graph(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ManifestRead { .. }));
    }

    #[test]
    fn test_no_workspaces_is_hard_error() {
        let dir = tempdir().unwrap();
        write_json(dir.path(), "package.json", r#"{"name": "plain"}"#);

        let err = load_graph(dir.path()).unwrap_err();
        assert!(matches!(err, Error::NoWorkspaces { .. }));
    }

    #[test]
    fn test_broken_member_is_skipped() {
        let dir = tempdir().unwrap();
        write_json(
            dir.path(),
            "package.json",
            r#"{"workspaces": ["packages/*"]}"#,
        );
        write_json(
            dir.path(),
            "packages/good/package.json",
            r#"{"name": "good", "version": "1.0.0"}"#,
        );
        write_json(dir.path(), "packages/bad/package.json", "{{{");

        let graph = load_graph(dir.path()).unwrap();
        assert!(graph.contains("good"));
        assert_eq!(graph.workspace_projects().len(), 1);
    }

    #[test]
    fn test_uninstalled_dependency_is_skipped() {
        let dir = tempdir().unwrap();
        write_json(
            dir.path(),
            "package.json",
            r#"{"workspaces": ["packages/*"]}"#,
        );
        write_json(
            dir.path(),
            "packages/app/package.json",
            r#"{"name": "app", "dependencies": {"left-pad": "^1"}}"#,
        );

        let graph = load_graph(dir.path()).unwrap();
        assert!(graph.edges_of("app").is_empty());
        assert!(!graph.contains("npm:left-pad"));
    }

    #[test]
    fn test_scoped_external_dependency() {
        let dir = tempdir().unwrap();
        write_json(
            dir.path(),
            "package.json",
            r#"{"workspaces": ["packages/*"]}"#,
        );
        write_json(
            dir.path(),
            "packages/app/package.json",
            r#"{"name": "app", "devDependencies": {"@types/node": "^20"}}"#,
        );
        write_json(
            dir.path(),
            "node_modules/@types/node/package.json",
            r#"{"name": "@types/node", "version": "20.11.5"}"#,
        );

        let graph = load_graph(dir.path()).unwrap();
        let node = graph.node("npm:@types/node").unwrap();
        assert!(node.is_external());
        assert_eq!(graph.edges_of("app").len(), 1);
    }

    #[test]
    fn test_scanned_graph_resolves_closure() {
        let dir = tempdir().unwrap();
        fixture_workspace(dir.path());

        let graph = load_graph(dir.path()).unwrap();
        let closure = resolve_closure("app", &graph, &StaticPeerLookup::default());

        assert_eq!(closure.version("react"), Some("18.2.0"));
        assert_eq!(closure.len(), 1);
    }
}
