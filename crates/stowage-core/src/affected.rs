//! Change detection and affected-project mapping.
//!
//! Packaging defaults to affected-only: a changeset (from `git diff`) maps to
//! the projects owning the changed files, expanded to every workspace project
//! that transitively depends on them.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::path::PathBuf;
use std::process::Command;

use crate::error::Error;
use crate::graph::{DependencyGraph, ProjectKind};

/// Capability for listing pending changes as workspace-relative paths.
///
/// Unlike peer metadata, change detection is a precondition: failures
/// propagate.
pub trait ChangeDetector: Send + Sync + std::fmt::Debug {
    /// Changed file paths relative to the workspace root.
    ///
    /// # Errors
    /// Returns an error if the changeset cannot be determined.
    fn changed_files(&self) -> Result<Vec<String>, Error>;
}

/// Detects changes by shelling out to the system git.
///
/// Runs `git -C <workspace_root> diff --name-only <base>` with `HEAD` as the
/// default base, so staged and unstaged changes both count as pending.
#[derive(Debug, Clone)]
pub struct GitChangeDetector {
    workspace_root: PathBuf,
    base: Option<String>,
}

impl GitChangeDetector {
    #[must_use]
    pub fn new(workspace_root: impl Into<PathBuf>, base: Option<String>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            base,
        }
    }
}

impl ChangeDetector for GitChangeDetector {
    fn changed_files(&self) -> Result<Vec<String>, Error> {
        let mut cmd = Command::new("git");
        cmd.arg("-C")
            .arg(&self.workspace_root)
            .args(["diff", "--name-only"])
            .arg(self.base.as_deref().unwrap_or("HEAD"));

        let output = cmd.output().map_err(|e| Error::Git {
            message: format!("failed to run git diff: {e}"),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Git {
                message: format!("git diff failed: {}", stderr.trim()),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }
}

/// Fixed changeset, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticChanges {
    files: Vec<String>,
}

impl StaticChanges {
    #[must_use]
    pub fn new<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
        }
    }
}

impl ChangeDetector for StaticChanges {
    fn changed_files(&self) -> Result<Vec<String>, Error> {
        Ok(self.files.clone())
    }
}

/// Map changed files to affected workspace projects.
///
/// A file belongs to the project with the longest owning `root_dir` prefix;
/// files outside every project root (workspace-level files) belong to none.
/// The directly affected set is then expanded with every workspace project
/// that transitively depends on it.
#[must_use]
pub fn affected_projects(graph: &DependencyGraph, changed: &[String]) -> BTreeSet<String> {
    let roots: Vec<(&str, &str)> = graph
        .workspace_projects()
        .iter()
        .filter_map(|n| match &n.kind {
            ProjectKind::Workspace { root_dir, .. } => Some((n.name.as_str(), root_dir.as_str())),
            ProjectKind::External { .. } => None,
        })
        .collect();

    let mut affected: BTreeSet<String> = BTreeSet::new();
    for file in changed {
        let file = file.replace('\\', "/");
        let owner = roots
            .iter()
            .filter(|(_, root)| {
                file == *root || file.starts_with(&format!("{root}/"))
            })
            .max_by_key(|(_, root)| root.len());
        if let Some((project, _)) = owner {
            affected.insert((*project).to_string());
        }
    }

    // Expand to reverse-dependents over workspace edges.
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for node in graph.workspace_projects() {
        for edge in graph.edges_of(&node.name) {
            if graph.node(&edge.target).is_some_and(|t| t.is_workspace()) {
                dependents
                    .entry(edge.target.as_str())
                    .or_default()
                    .push(node.name.as_str());
            }
        }
    }

    let mut queue: VecDeque<String> = affected.iter().cloned().collect();
    while let Some(project) = queue.pop_front() {
        if let Some(parents) = dependents.get(project.as_str()) {
            for parent in parents {
                if affected.insert((*parent).to_string()) {
                    queue.push_back((*parent).to_string());
                }
            }
        }
    }

    affected
}

/// Keep only affected targets, preserving input order.
#[must_use]
pub fn filter_targets(targets: &[String], affected: &BTreeSet<String>) -> Vec<String> {
    targets
        .iter()
        .filter(|t| affected.contains(*t))
        .cloned()
        .collect()
}
