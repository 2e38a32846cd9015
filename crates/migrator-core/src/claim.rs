//! Applies deterministic connector renaming to claims and the composites that
//! reference them (§4.11). Pure transforms over in-memory objects; the caller
//! decides which archive group each function runs over.

use serde_json::Value;

use crate::hashing::{connector_claim_name, LABEL_APP_CLUSTER, LABEL_APP_NAMESPACE, LABEL_APP_RESOURCE_NAME};
use crate::resource::ResourceObject;

/// Rename every claim in place: `metadata.name`/`metadata.namespace` become the
/// connector-derived name and the shared claim namespace, and the original
/// identity is recorded in labels.
pub fn rename_claims(objects: &mut [ResourceObject], cluster_id: &str, claim_namespace: &str) {
    for object in objects.iter_mut() {
        let (Some(original_name), Some(original_namespace)) =
            (object.name().map(str::to_string), object.namespace().map(str::to_string))
        else {
            continue;
        };
        let new_name = connector_claim_name(&original_name, &original_namespace, cluster_id);
        object.set_name(&new_name);
        object.set_namespace(claim_namespace);
        object.set_label(LABEL_APP_NAMESPACE, &original_namespace);
        object.set_label(LABEL_APP_RESOURCE_NAME, &original_name);
        object.set_label(LABEL_APP_CLUSTER, cluster_id);
    }
}

/// Rewrite every composite's `spec.claimRef` to point at the renamed claim.
/// Composites without a claimRef are left unchanged.
pub fn retarget_claim_refs(objects: &mut [ResourceObject], cluster_id: &str, claim_namespace: &str) {
    for object in objects.iter_mut() {
        let (Some(name), Some(namespace)) = (
            object.get_nested_string(&["spec", "claimRef", "name"]),
            object.get_nested_string(&["spec", "claimRef", "namespace"]),
        ) else {
            continue;
        };
        let new_name = connector_claim_name(&name, &namespace, cluster_id);
        object.set_nested_field(&["spec", "claimRef", "name"], Value::String(new_name));
        object.set_nested_field(
            &["spec", "claimRef", "namespace"],
            Value::String(claim_namespace.to_string()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claim(name: &str, namespace: &str) -> ResourceObject {
        ResourceObject::new(json!({
            "apiVersion": "example.org/v1",
            "kind": "WidgetClaim",
            "metadata": {"name": name, "namespace": namespace},
        }))
    }

    fn composite(claim_name: &str, claim_namespace: &str) -> ResourceObject {
        ResourceObject::new(json!({
            "apiVersion": "example.org/v1",
            "kind": "XWidget",
            "metadata": {"name": "xwidget-abc"},
            "spec": {"claimRef": {"name": claim_name, "namespace": claim_namespace}},
        }))
    }

    #[test]
    fn rename_claims_sets_new_identity_and_labels() {
        let mut claims = vec![claim("web", "team-a")];
        rename_claims(&mut claims, "cid1", "central");
        let renamed = &claims[0];
        assert_eq!(renamed.namespace(), Some("central"));
        assert!(renamed.name().unwrap().starts_with("claim-"));
        assert_eq!(renamed.labels().get("mcp-connector.upbound.io/app-namespace"), Some(&"team-a".to_string()));
        assert_eq!(renamed.labels().get("mcp-connector.upbound.io/app-resource-name"), Some(&"web".to_string()));
        assert_eq!(renamed.labels().get("mcp-connector.upbound.io/app-cluster"), Some(&"cid1".to_string()));
    }

    #[test]
    fn retarget_claim_refs_matches_rename_claims_output() {
        let mut claims = vec![claim("web", "team-a")];
        rename_claims(&mut claims, "cid1", "central");
        let expected_name = claims[0].name().unwrap().to_string();

        let mut composites = vec![composite("web", "team-a")];
        retarget_claim_refs(&mut composites, "cid1", "central");
        let claim_ref_name = composites[0].get_nested_string(&["spec", "claimRef", "name"]).unwrap();
        let claim_ref_namespace = composites[0].get_nested_string(&["spec", "claimRef", "namespace"]).unwrap();
        assert_eq!(claim_ref_name, expected_name);
        assert_eq!(claim_ref_namespace, "central");
    }

    #[test]
    fn composite_without_claim_ref_is_unchanged() {
        let mut composites = vec![ResourceObject::new(json!({
            "apiVersion": "example.org/v1",
            "kind": "XWidget",
            "metadata": {"name": "xwidget-abc"},
            "spec": {},
        }))];
        retarget_claim_refs(&mut composites, "cid1", "central");
        assert!(composites[0].get_nested_string(&["spec", "claimRef", "name"]).is_none());
    }
}
