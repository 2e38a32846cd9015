//! Talks to a Kubernetes API server on behalf of `migrator-core`'s archive and
//! resource model: discovery, apply, category transforms, and the export/import
//! orchestrators built on top of them.

pub mod applier;
pub mod category;
pub mod crossplane;
pub mod discovery;
pub mod error;
pub mod exporter;
pub mod fetcher;
pub mod importer;
pub mod pause;
pub mod progress;
pub mod wait;

pub use discovery::DiscoveryClient;
pub use error::{KubeError, Result};
