#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod affected;
pub mod closure;
pub mod config;
pub mod error;
pub mod graph;
pub mod manifest;
pub mod package_set;
pub mod paths;
pub mod peers;
pub mod scan;
pub mod version;

pub use closure::{collect_peers, resolve_closure, PackageClosure};
pub use config::Config;
pub use error::Error;
pub use graph::{
    external_node_name, DependencyEdge, DependencyGraph, ProjectKind, ProjectNode,
    EXTERNAL_PREFIX,
};
pub use manifest::{scoped_name, synthesize, Manifest};
pub use package_set::{build_package_set, PackOptions, PackageEntry};
pub use peers::{NodeModulesPeerLookup, PeerLookup, StaticPeerLookup};
pub use version::VERSION;
