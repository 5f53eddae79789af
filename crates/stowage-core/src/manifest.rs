//! Package manifests and manifest synthesis.
//!
//! A manifest models `package.json`. The four fields stowage manages are
//! typed; anything else an existing manifest carries (`scripts`, `main`, ...)
//! is preserved through a flattened extra map so a deployed manifest stays
//! runnable.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::closure::PackageClosure;
use crate::error::Error;
use crate::graph::{DependencyGraph, ProjectKind};

/// A `package.json` manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,

    #[serde(
        default,
        rename = "devDependencies",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub dev_dependencies: BTreeMap<String, String>,

    /// Fields stowage does not manage, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Manifest {
    /// Fresh manifest for a project with no `package.json` of its own.
    #[must_use]
    pub fn scaffold(project: &str, scope: &str) -> Self {
        Self {
            name: scoped_name(scope, project),
            version: "0.0.0".to_string(),
            ..Default::default()
        }
    }

    /// Load a manifest, returning `None` if the file is missing, unreadable,
    /// or not valid JSON. Callers scaffold on `None`.
    #[must_use]
    pub fn load(path: &Path) -> Option<Self> {
        let text = stowage_util::fs::read_to_string_lossy(path).ok()?;
        serde_json::from_str(&text).ok()
    }

    /// Load the workspace root manifest. Unlike project manifests this one is
    /// a precondition, so failures propagate.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_root(path: &Path) -> Result<Self, Error> {
        let text = stowage_util::fs::read_to_string_lossy(path).map_err(|source| {
            Error::ManifestRead {
                path: path.to_path_buf(),
                source,
            }
        })?;
        serde_json::from_str(&text).map_err(|source| Error::ManifestParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Set a runtime dependency, dropping any development entry of the same
    /// name so the two maps stay disjoint.
    pub fn set_runtime(&mut self, package: impl Into<String>, version: impl Into<String>) {
        let package = package.into();
        self.dev_dependencies.remove(&package);
        self.dependencies.insert(package, version.into());
    }

    /// Set a development dependency, dropping any runtime entry of the same
    /// name so the two maps stay disjoint.
    pub fn set_development(&mut self, package: impl Into<String>, version: impl Into<String>) {
        let package = package.into();
        self.dependencies.remove(&package);
        self.dev_dependencies.insert(package, version.into());
    }

    /// The scope of a scoped name: `@acme/tool` yields `acme`.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        let rest = self.name.strip_prefix('@')?;
        let (scope, _) = rest.split_once('/')?;
        (!scope.is_empty()).then_some(scope)
    }
}

/// Prefix a project name with a scope: `("acme", "util")` yields
/// `@acme/util`. A leading `@` on the scope is tolerated; an empty scope
/// leaves the name bare.
#[must_use]
pub fn scoped_name(scope: &str, project: &str) -> String {
    let scope = scope.trim_start_matches('@');
    if scope.is_empty() {
        project.to_string()
    } else {
        format!("@{scope}/{project}")
    }
}

/// Synthesize the deployable manifest for one workspace project.
///
/// Starts from the project's own manifest (scaffolding if it has none),
/// classifies each closure entry as runtime or development against the root
/// manifest's `devDependencies`, then merges `"*"` entries for the project's
/// direct workspace dependencies. Inputs are not mutated.
#[must_use]
pub fn synthesize(
    project: &str,
    closure: &PackageClosure,
    graph: &DependencyGraph,
    root_manifest: &Manifest,
    scope: &str,
) -> Manifest {
    let manifest_path = match graph.node(project).map(|n| &n.kind) {
        Some(ProjectKind::Workspace { source_root, .. }) => {
            Some(graph.workspace_root.join(source_root).join("package.json"))
        }
        _ => None,
    };

    let mut manifest = manifest_path
        .as_deref()
        .and_then(Manifest::load)
        .unwrap_or_else(|| Manifest::scaffold(project, scope));

    for (package, version) in closure {
        if root_manifest.dev_dependencies.contains_key(package) {
            manifest.set_development(package, version);
        } else {
            manifest.set_runtime(package, version);
        }
    }

    for edge in graph.edges_of(project) {
        if let Some(target) = graph.node(&edge.target) {
            if target.is_workspace() {
                manifest.set_runtime(scoped_name(scope, &target.name), "*");
            }
        }
    }

    manifest
}
