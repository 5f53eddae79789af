//! CLI subcommand implementations.

pub mod closure;
pub mod list;
pub mod manifest;
pub mod pack;
pub mod version;

use std::path::{Path, PathBuf};
use stowage_core::{scan, DependencyGraph, Manifest};

/// Print an error envelope (or human message) and exit with code 1.
pub(crate) fn fail(code: &str, message: &str, json: bool) -> ! {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "ok": false,
                "error": { "code": code, "message": message }
            })
        );
    } else {
        eprintln!("error: {message}");
    }
    std::process::exit(1);
}

/// Locate the workspace and load its graph and root manifest.
pub(crate) fn load_workspace(cwd: &Path, json: bool) -> (PathBuf, DependencyGraph, Manifest) {
    let root = match stowage_core::paths::workspace_root(cwd) {
        Ok(root) => root,
        Err(e) => fail("WORKSPACE_NOT_FOUND", &e.to_string(), json),
    };

    let graph = match scan::load_graph(&root) {
        Ok(g) => g,
        Err(e) => fail("GRAPH_LOAD_FAILED", &e.to_string(), json),
    };

    let root_manifest = match Manifest::load_root(&root.join("package.json")) {
        Ok(m) => m,
        Err(e) => fail("ROOT_MANIFEST_INVALID", &e.to_string(), json),
    };

    (root, graph, root_manifest)
}

/// Effective scope: the `--scope` flag, else the root manifest's scope, else
/// the root manifest's name.
pub(crate) fn effective_scope(flag: Option<&str>, root_manifest: &Manifest) -> String {
    if let Some(scope) = flag {
        return scope.trim_start_matches('@').to_string();
    }
    if let Some(scope) = root_manifest.scope() {
        return scope.to_string();
    }
    root_manifest.name.clone()
}
