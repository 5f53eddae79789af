//! `stowage pack` command implementation.
//!
//! The full packaging pipeline: workspace scan, change detection, closure
//! resolution, manifest synthesis, and optional persistence.

use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use stowage_core::affected::{
    affected_projects, filter_targets, ChangeDetector, GitChangeDetector,
};
use stowage_core::package_set::{build_package_set, PackOptions};
use stowage_core::NodeModulesPeerLookup;

/// Arguments for one pack invocation.
#[derive(Debug)]
pub struct PackAction {
    pub cwd: PathBuf,
    /// Explicit projects; empty means all workspace projects.
    pub projects: Vec<String>,
    pub all: bool,
    pub base: Option<String>,
    pub scope: Option<String>,
    pub out_root: Option<PathBuf>,
    pub write: bool,
}

/// Run the pack command.
pub fn run(action: PackAction, json: bool) -> Result<()> {
    let (root, graph, root_manifest) = super::load_workspace(&action.cwd, json);
    let scope = super::effective_scope(action.scope.as_deref(), &root_manifest);

    // A relative --out-root is anchored to the effective cwd, not wherever
    // the process happens to run.
    let out_root = match &action.out_root {
        Some(dir) => stowage_core::paths::absolutize(&action.cwd, dir),
        None => root.join("dist"),
    };
    let opts = PackOptions {
        // Explicitly named projects are packed as-is; change detection only
        // narrows the default everything set.
        only_affected: action.projects.is_empty() && !action.all,
        working_directory: out_root,
    };

    let targets = if action.projects.is_empty() {
        let mut targets: Vec<String> = graph
            .workspace_projects()
            .iter()
            .map(|n| n.name.clone())
            .collect();

        if opts.only_affected {
            let detector = GitChangeDetector::new(&root, action.base.clone());
            let changed = match detector.changed_files() {
                Ok(c) => c,
                Err(e) => super::fail("CHANGE_DETECTION_FAILED", &e.to_string(), json),
            };
            tracing::debug!(files = changed.len(), "change detection complete");

            let affected = affected_projects(&graph, &changed);
            targets = filter_targets(&targets, &affected);
        }

        targets
    } else {
        for project in &action.projects {
            let known = graph.node(project).is_some_and(|n| n.is_workspace());
            if !known {
                super::fail(
                    "UNKNOWN_PROJECT",
                    &format!("unknown workspace project: {project}"),
                    json,
                );
            }
        }
        action.projects
    };

    let lookup = NodeModulesPeerLookup::new(&root);
    let entries = build_package_set(&targets, &graph, &root_manifest, &scope, &lookup, &opts);
    tracing::debug!(projects = entries.len(), "package set built");

    if action.write {
        for entry in &entries {
            let mut body = serde_json::to_string_pretty(&entry.manifest).into_diagnostic()?;
            body.push('\n');

            if let Err(e) = std::fs::create_dir_all(&entry.dir) {
                super::fail(
                    "WRITE_FAILED",
                    &format!("failed to create {}: {e}", entry.dir.display()),
                    json,
                );
            }

            let path = entry.dir.join("package.json");
            if let Err(e) = stowage_util::fs::atomic_write(&path, body.as_bytes()) {
                super::fail(
                    "WRITE_FAILED",
                    &format!("failed to write {}: {e}", path.display()),
                    json,
                );
            }
        }
    }

    if json {
        let packages: Vec<_> = entries
            .iter()
            .map(|e| {
                serde_json::json!({
                    "name": e.manifest.name,
                    "dir": e.dir.to_string_lossy(),
                    "manifest": e.manifest,
                })
            })
            .collect();

        println!(
            "{}",
            serde_json::json!({
                "ok": true,
                "root": root.to_string_lossy(),
                "written": action.write,
                "packages": packages,
            })
        );
    } else if entries.is_empty() {
        println!("No projects to pack.");
        if opts.only_affected {
            println!("hint: use --all to pack every workspace project");
        }
    } else {
        println!("Packed {} project(s):", entries.len());
        for entry in &entries {
            let deps = entry.manifest.dependencies.len() + entry.manifest.dev_dependencies.len();
            println!(
                "  {}  {} deps  ->  {}",
                entry.manifest.name,
                deps,
                entry.dir.display()
            );
        }
        if !action.write {
            println!();
            println!("(dry run; use --write to persist package.json files)");
        }
    }

    Ok(())
}
