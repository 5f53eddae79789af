use std::path::{Component, Path, PathBuf};

use crate::error::Error;

/// Find the workspace root by walking up from `cwd` looking for a
/// `package.json` that declares `workspaces`.
///
/// A `package.json` that cannot be read or parsed is skipped and the walk
/// continues upward.
///
/// # Errors
/// Returns [`Error::WorkspaceNotFound`] if no ancestor declares workspaces.
pub fn workspace_root(cwd: &Path) -> Result<PathBuf, Error> {
    let mut current = cwd.to_path_buf();

    loop {
        let manifest = current.join("package.json");
        if manifest.exists() && declares_workspaces(&manifest) {
            return Ok(current);
        }

        if !current.pop() {
            return Err(Error::WorkspaceNotFound {
                start: cwd.to_path_buf(),
            });
        }
    }
}

fn declares_workspaces(manifest: &Path) -> bool {
    let Ok(text) = stowage_util::fs::read_to_string_lossy(manifest) else {
        return false;
    };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) else {
        return false;
    };
    value.get("workspaces").is_some()
}

/// Resolve `path` against `base` and fold `.` and `..` segments lexically.
///
/// No filesystem access: the result is well-defined even when the path does
/// not exist yet (output directories are created later). On Windows the
/// result is simplified to strip UNC verbatim prefixes.
#[must_use]
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Never pop past the root of a relative path.
                if !out.pop() {
                    out.push(Component::ParentDir.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }

    dunce::simplified(&out).to_path_buf()
}
