//! Peer dependency metadata lookup.
//!
//! Provides the capability trait the closure resolver uses to learn which
//! peers an external package declares, plus a filesystem adapter over an
//! installed `node_modules/` tree and a map-backed adapter for tests.

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Capability for loading the declared peer dependencies of an external
/// package.
///
/// Lookups are advisory: `None` means no usable metadata, and callers treat
/// that as "no peers". Implementations should be thread-safe (Send + Sync).
pub trait PeerLookup: Send + Sync + std::fmt::Debug {
    /// Names of the packages `package` declares as required peers, or `None`
    /// when metadata is missing or unreadable.
    fn declared_peers(&self, package: &str) -> Option<Vec<String>>;
}

/// Reads peer metadata from the `node_modules/` tree under a workspace root.
///
/// Required peers are the `peerDependencies` keys minus any marked optional
/// in `peerDependenciesMeta`, per npm semantics.
#[derive(Debug, Clone)]
pub struct NodeModulesPeerLookup {
    root: PathBuf,
}

impl NodeModulesPeerLookup {
    /// `root` is the workspace root containing `node_modules/`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn manifest_path(&self, package: &str) -> PathBuf {
        // Scoped packages install under their scope directory.
        let mut path = self.root.join("node_modules");
        for part in package.split('/') {
            path.push(part);
        }
        path.join("package.json")
    }
}

impl PeerLookup for NodeModulesPeerLookup {
    fn declared_peers(&self, package: &str) -> Option<Vec<String>> {
        let path = self.manifest_path(package);
        let text = stowage_util::fs::read_to_string_lossy(&path).ok()?;
        let value: Value = serde_json::from_str(&text).ok()?;

        let Some(peers) = value.get("peerDependencies").and_then(Value::as_object) else {
            // Metadata is readable but declares no peers.
            return Some(Vec::new());
        };

        let optional: Vec<&str> = value
            .get("peerDependenciesMeta")
            .and_then(Value::as_object)
            .map(|meta| {
                meta.iter()
                    .filter(|(_, v)| v.get("optional").and_then(Value::as_bool) == Some(true))
                    .map(|(name, _)| name.as_str())
                    .collect()
            })
            .unwrap_or_default();

        let mut names: Vec<String> = peers
            .keys()
            .filter(|name| !optional.contains(&name.as_str()))
            .cloned()
            .collect();
        names.sort();
        Some(names)
    }
}

/// Map-backed adapter for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticPeerLookup {
    peers: BTreeMap<String, Vec<String>>,
}

impl StaticPeerLookup {
    /// Add an entry, returning self for chained setup.
    #[must_use]
    pub fn with<I, S>(mut self, package: impl Into<String>, peers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.peers
            .insert(package.into(), peers.into_iter().map(Into::into).collect());
        self
    }
}

impl PeerLookup for StaticPeerLookup {
    fn declared_peers(&self, package: &str) -> Option<Vec<String>> {
        self.peers.get(package).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn install_package(root: &Path, name: &str, manifest: &str) {
        let mut dir = root.join("node_modules");
        for part in name.split('/') {
            dir.push(part);
        }
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("package.json"), manifest).unwrap();
    }

    #[test]
    fn test_reads_required_peers_sorted() {
        let dir = tempdir().unwrap();
        install_package(
            dir.path(),
            "plugin",
            r#"{"name": "plugin", "peerDependencies": {"zeta": "^1", "alpha": "^2"}}"#,
        );

        let lookup = NodeModulesPeerLookup::new(dir.path());
        assert_eq!(
            lookup.declared_peers("plugin"),
            Some(vec!["alpha".to_string(), "zeta".to_string()])
        );
    }

    #[test]
    fn test_optional_peers_are_filtered() {
        let dir = tempdir().unwrap();
        install_package(
            dir.path(),
            "plugin",
            r#"{
                "peerDependencies": {"host": "^1", "extras": "^1"},
                "peerDependenciesMeta": {"extras": {"optional": true}}
            }"#,
        );

        let lookup = NodeModulesPeerLookup::new(dir.path());
        assert_eq!(
            lookup.declared_peers("plugin"),
            Some(vec!["host".to_string()])
        );
    }

    #[test]
    fn test_scoped_package_path() {
        let dir = tempdir().unwrap();
        install_package(
            dir.path(),
            "@scope/plugin",
            r#"{"peerDependencies": {"host": "^1"}}"#,
        );

        let lookup = NodeModulesPeerLookup::new(dir.path());
        assert_eq!(
            lookup.declared_peers("@scope/plugin"),
            Some(vec!["host".to_string()])
        );
    }

    #[test]
    fn test_missing_package_is_none() {
        let dir = tempdir().unwrap();
        let lookup = NodeModulesPeerLookup::new(dir.path());
        assert_eq!(lookup.declared_peers("absent"), None);
    }

    #[test]
    fn test_corrupt_manifest_is_none() {
        let dir = tempdir().unwrap();
        install_package(dir.path(), "broken", "{{{ not json");

        let lookup = NodeModulesPeerLookup::new(dir.path());
        assert_eq!(lookup.declared_peers("broken"), None);
    }

    #[test]
    fn test_manifest_without_peers_is_empty() {
        let dir = tempdir().unwrap();
        install_package(dir.path(), "plain", r#"{"name": "plain", "version": "1.0.0"}"#);

        let lookup = NodeModulesPeerLookup::new(dir.path());
        assert_eq!(lookup.declared_peers("plain"), Some(Vec::new()));
    }

    #[test]
    fn test_static_lookup() {
        let lookup = StaticPeerLookup::default().with("a", ["b", "c"]);

        assert_eq!(
            lookup.declared_peers("a"),
            Some(vec!["b".to_string(), "c".to_string()])
        );
        assert_eq!(lookup.declared_peers("unknown"), None);
    }
}
