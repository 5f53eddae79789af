//! `stowage closure` command implementation.
//!
//! Resolves and prints the external dependency closure of one project.

use miette::Result;
use std::path::Path;
use stowage_core::{resolve_closure, NodeModulesPeerLookup};

/// Run the closure command.
pub fn run(cwd: &Path, project: &str, json: bool) -> Result<()> {
    let (root, graph, _) = super::load_workspace(cwd, json);

    if !graph.contains(project) {
        super::fail(
            "UNKNOWN_PROJECT",
            &format!("unknown project: {project}"),
            json,
        );
    }

    let lookup = NodeModulesPeerLookup::new(&root);
    let closure = resolve_closure(project, &graph, &lookup);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "ok": true,
                "project": project,
                "closure": closure
            })
        );
    } else {
        println!("External closure for {project} ({} packages):", closure.len());
        for (package, version) in &closure {
            println!("  {package} {version}");
        }
    }

    Ok(())
}
