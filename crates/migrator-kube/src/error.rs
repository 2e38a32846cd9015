//! Error types for migrator-kube.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur while driving the export/import engine against a live cluster.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// Kubernetes API error, not yet classified as transient or permanent.
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// Rate-limit, conflict, or server-timeout: retried with backoff (§7 APIErrorTransient).
    #[error("transient API error: {0}")]
    ApiTransient(#[source] kube::Error),

    /// Not-found, forbidden, invalid: propagated unwrapped (§7 APIErrorPermanent).
    #[error("permanent API error: {0}")]
    ApiPermanent(#[source] kube::Error),

    /// No REST mapping for a kind; retried under apply backoff, fatal after mapper reset.
    #[error("no REST mapping known for {group}/{kind}")]
    MappingUnknown { group: String, kind: String },

    /// Malformed archive entry or YAML; fatal per export/import invocation.
    #[error("archive format error: {0}")]
    Core(#[from] migrator_core::CoreError),

    /// Wait-for-condition loop exceeded its deadline.
    #[error("timed out after {elapsed} waiting for {what}")]
    Timeout { what: String, elapsed: String },

    /// The apply retry budget was exhausted without success.
    #[error("apply of {kind}/{name} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        kind: String,
        name: String,
        attempts: u32,
        #[source]
        source: Box<KubeError>,
    },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for KubeError {
    fn from(e: serde_json::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for KubeError {
    fn from(e: serde_yaml::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl KubeError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, KubeError::Api(kube::Error::Api(resp)) if resp.code == 404)
            || matches!(self, KubeError::ApiPermanent(kube::Error::Api(resp)) if resp.code == 404)
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, KubeError::Api(kube::Error::Api(resp)) if resp.code == 409)
            || matches!(self, KubeError::ApiTransient(kube::Error::Api(resp)) if resp.code == 409)
    }

    /// Classify a raw `kube::Error` per §7: rate-limit/conflict/timeout are transient,
    /// everything else (not-found, forbidden, invalid) is permanent.
    pub fn classify(err: kube::Error) -> KubeError {
        if let kube::Error::Api(resp) = &err {
            match resp.code {
                409 | 429 | 500..=599 => return KubeError::ApiTransient(err),
                _ => return KubeError::ApiPermanent(err),
            }
        }
        KubeError::ApiTransient(err)
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            KubeError::ApiTransient(_) | KubeError::MappingUnknown { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_kinds() {
        assert!(KubeError::MappingUnknown {
            group: "pkg.crossplane.io".to_string(),
            kind: "Provider".to_string()
        }
        .is_retryable());
        assert!(!KubeError::Timeout {
            what: "packages healthy".to_string(),
            elapsed: "10m".to_string()
        }
        .is_retryable());
    }
}
