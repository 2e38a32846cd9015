//! Deterministic claim renaming for the connector topology (§4.11).

use sha2::{Digest, Sha256};

pub const CLAIM_NAME_PREFIX: &str = "claim-";
const HASH_PREFIX_LEN: usize = 16;

pub const LABEL_APP_NAMESPACE: &str = "mcp-connector.upbound.io/app-namespace";
pub const LABEL_APP_RESOURCE_NAME: &str = "mcp-connector.upbound.io/app-resource-name";
pub const LABEL_APP_CLUSTER: &str = "mcp-connector.upbound.io/app-cluster";

/// `claim-` followed by the first 16 lowercase hex characters of
/// `SHA-256(name + "-x-" + namespace + "-x-" + clusterID)`.
pub fn connector_claim_name(name: &str, namespace: &str, cluster_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(b"-x-");
    hasher.update(namespace.as_bytes());
    hasher.update(b"-x-");
    hasher.update(cluster_id.as_bytes());
    let digest = hasher.finalize();
    let hex = hex::encode(digest);
    format!("{CLAIM_NAME_PREFIX}{}", &hex[..HASH_PREFIX_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_the_worked_example() {
        // SHA-256("web-x-team-a-x-cid1"), first 16 hex chars of the digest.
        let mut hasher = Sha256::new();
        hasher.update(b"web-x-team-a-x-cid1");
        let expected_hex = hex::encode(hasher.finalize());
        let expected = format!("claim-{}", &expected_hex[..16]);
        assert_eq!(connector_claim_name("web", "team-a", "cid1"), expected);
    }

    #[test]
    fn name_has_expected_shape() {
        let name = connector_claim_name("web", "team-a", "cid1");
        assert!(name.starts_with(CLAIM_NAME_PREFIX));
        let hex_part = &name[CLAIM_NAME_PREFIX.len()..];
        assert_eq!(hex_part.len(), 16);
        assert!(hex_part.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn deterministic_and_collision_free_on_distinct_inputs() {
        let a = connector_claim_name("web", "team-a", "cid1");
        let b = connector_claim_name("web", "team-a", "cid1");
        assert_eq!(a, b);

        let c = connector_claim_name("web", "team-b", "cid1");
        assert_ne!(a, c);

        let d = connector_claim_name("api", "team-a", "cid1");
        assert_ne!(a, d);

        let e = connector_claim_name("web", "team-a", "cid2");
        assert_ne!(a, e);
    }
}
