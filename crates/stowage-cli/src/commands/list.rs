//! `stowage list` command implementation.

use miette::Result;
use std::path::Path;
use stowage_core::ProjectKind;

/// Run the list command.
pub fn run(cwd: &Path, json: bool) -> Result<()> {
    let (root, graph, _) = super::load_workspace(cwd, json);

    let projects = graph.workspace_projects();

    if json {
        let list: Vec<_> = projects
            .iter()
            .filter_map(|p| match &p.kind {
                ProjectKind::Workspace {
                    source_root,
                    root_dir,
                } => Some(serde_json::json!({
                    "name": p.name,
                    "sourceRoot": source_root,
                    "rootDir": root_dir,
                })),
                ProjectKind::External { .. } => None,
            })
            .collect();

        println!(
            "{}",
            serde_json::json!({
                "ok": true,
                "root": root.to_string_lossy(),
                "projects": list
            })
        );
    } else {
        println!("Workspace root: {}", root.display());
        println!();
        println!("Projects ({}):", projects.len());
        for project in &projects {
            if let ProjectKind::Workspace { source_root, .. } = &project.kind {
                println!("  {}  {}", project.name, source_root);
            }
        }
    }

    Ok(())
}
