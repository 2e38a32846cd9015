//! Archive format, resource model and pause protocol shared by the export/import engine.
//!
//! This crate is cluster-agnostic: it knows how to shape, sanitize, hash and
//! serialize resource objects, but never talks to a Kubernetes API server. That
//! lives in `migrator-kube`.

pub mod annotations;
pub mod archive;
pub mod claim;
pub mod error;
pub mod hashing;
pub mod hostgate;
pub mod manifest;
pub mod resource;
pub mod skip;

pub use error::{CoreError, Result};
pub use resource::ResourceObject;
