//! Target host gate (§6): only certain API server hosts are eligible import targets.

use regex::Regex;
use std::sync::LazyLock;

static SPACES_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https://[^/]+/apis/spaces\.upbound\.io/").unwrap());

static LEGACY_CLOUD_SPACES_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https://[^/]+/v1/control[Pp]lanes/").unwrap());

static LOOPBACK_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https://127\.0\.0\.1(:\d+)?(/|$)").unwrap());

/// True if `host` matches one of the three allowed shapes: a local-path spaces URL,
/// a legacy cloud-spaces URL (either casing of `controlPlanes`), or a loopback address.
pub fn is_allowed_target_host(host: &str) -> bool {
    SPACES_URL.is_match(host) || LEGACY_CLOUD_SPACES_URL.is_match(host) || LOOPBACK_URL.is_match(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_spaces_url() {
        assert!(is_allowed_target_host(
            "https://spaces.example.com/apis/spaces.upbound.io/v1alpha1"
        ));
    }

    #[test]
    fn allows_legacy_cloud_spaces_url_either_casing() {
        assert!(is_allowed_target_host(
            "https://proxy.upbound.io/v1/controlplanes/acme/default/ctp1"
        ));
        assert!(is_allowed_target_host(
            "https://proxy.upbound.io/v1/controlPlanes/acme/default/ctp1"
        ));
    }

    #[test]
    fn allows_loopback() {
        assert!(is_allowed_target_host("https://127.0.0.1:6443"));
        assert!(is_allowed_target_host("https://127.0.0.1"));
    }

    #[test]
    fn rejects_foreign_hosts() {
        assert!(!is_allowed_target_host(
            "https://my-cluster.eks.amazonaws.com"
        ));
        assert!(!is_allowed_target_host(
            "https://my-cluster.hcp.westus2.azmk8s.io"
        ));
        assert!(!is_allowed_target_host("https://10.0.0.5:6443"));
    }
}
