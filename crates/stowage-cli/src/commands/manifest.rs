//! `stowage manifest` command implementation.
//!
//! Synthesizes the deployable manifest for one project and prints it.

use miette::{IntoDiagnostic, Result};
use std::path::Path;
use stowage_core::{resolve_closure, synthesize, NodeModulesPeerLookup};

/// Run the manifest command.
pub fn run(cwd: &Path, project: &str, scope: Option<&str>, json: bool) -> Result<()> {
    let (root, graph, root_manifest) = super::load_workspace(cwd, json);

    let is_workspace = graph.node(project).is_some_and(|n| n.is_workspace());
    if !is_workspace {
        super::fail(
            "UNKNOWN_PROJECT",
            &format!("unknown workspace project: {project}"),
            json,
        );
    }

    let scope = super::effective_scope(scope, &root_manifest);
    let lookup = NodeModulesPeerLookup::new(&root);

    let closure = resolve_closure(project, &graph, &lookup);
    let manifest = synthesize(project, &closure, &graph, &root_manifest, &scope);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "ok": true,
                "project": project,
                "manifest": manifest
            })
        );
    } else {
        let pretty = serde_json::to_string_pretty(&manifest).into_diagnostic()?;
        println!("{pretty}");
    }

    Ok(())
}
