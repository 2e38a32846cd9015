//! Pure skip-rule predicates for the resource fetcher (§4.1).
//!
//! Kept separate from the cluster-facing fetcher so the rules themselves can be
//! exercised without a live API server.

use crate::resource::ResourceObject;

const HELM_RELEASE_SECRET_TYPE: &str = "helm.sh/release.v1";
const KUBE_ROOT_CA_CONFIGMAP: &str = "kube-root-ca.crt";
const PACKAGE_OWNER_PREFIX: &str = "pkg.crossplane.io/";

/// Namespace include/exclude filter. Empty `included` matches every namespace;
/// `excluded` only takes effect when `included` is empty.
pub fn namespace_matches(namespace: &str, included: &[String], excluded: &[String]) -> bool {
    if !included.is_empty() {
        return included.iter().any(|n| n == namespace);
    }
    !excluded.iter().any(|n| n == namespace)
}

/// True if `object` should be skipped per the ordered rules of §4.1.
pub fn should_skip(object: &ResourceObject, included_namespaces: &[String], excluded_namespaces: &[String]) -> bool {
    let kind = object.kind().unwrap_or_default();

    if kind == "Namespace" {
        let name = object.name().unwrap_or_default();
        if !namespace_matches(name, included_namespaces, excluded_namespaces) {
            return true;
        }
    }

    if let Some(namespace) = object.namespace() {
        if !namespace_matches(namespace, included_namespaces, excluded_namespaces) {
            return true;
        }
    }

    if kind == "ConfigMap" && object.name() == Some(KUBE_ROOT_CA_CONFIGMAP) {
        return true;
    }

    if kind == "Secret"
        && object
            .value()
            .get("type")
            .and_then(serde_json::Value::as_str)
            == Some(HELM_RELEASE_SECRET_TYPE)
    {
        return true;
    }

    if object.has_owner_reference_with_prefix(PACKAGE_OWNER_PREFIX) {
        return true;
    }

    if kind == "Lock" && object.api_version().is_some_and(|v| v.starts_with("pkg.crossplane.io/")) {
        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: serde_json::Value) -> ResourceObject {
        ResourceObject::new(value)
    }

    #[test]
    fn namespace_filter_empty_included_matches_all_except_excluded() {
        assert!(namespace_matches("team-a", &[], &[]));
        assert!(!namespace_matches(
            "team-a",
            &[],
            &["team-a".to_string()]
        ));
    }

    #[test]
    fn namespace_filter_included_takes_precedence_over_excluded() {
        let included = vec!["team-a".to_string()];
        let excluded = vec!["team-a".to_string()];
        assert!(namespace_matches("team-a", &included, &excluded));
        assert!(!namespace_matches("team-b", &included, &excluded));
    }

    #[test]
    fn skips_kube_root_ca_configmap() {
        let cm = obj(json!({"kind": "ConfigMap", "metadata": {"name": "kube-root-ca.crt", "namespace": "default"}}));
        assert!(should_skip(&cm, &[], &[]));
    }

    #[test]
    fn skips_helm_release_secret() {
        let secret = obj(json!({
            "kind": "Secret", "type": "helm.sh/release.v1",
            "metadata": {"name": "sh.helm.release.v1.foo.v1", "namespace": "default"}
        }));
        assert!(should_skip(&secret, &[], &[]));
    }

    #[test]
    fn keeps_plain_configmap() {
        let cm = obj(json!({"kind": "ConfigMap", "metadata": {"name": "app-config", "namespace": "default"}}));
        assert!(!should_skip(&cm, &[], &[]));
    }

    #[test]
    fn skips_package_owned_objects() {
        let crd_instance = obj(json!({
            "kind": "Table", "metadata": {
                "name": "t1", "namespace": "default",
                "ownerReferences": [{"apiVersion": "pkg.crossplane.io/v1", "kind": "Provider"}]
            }
        }));
        assert!(should_skip(&crd_instance, &[], &[]));
    }

    #[test]
    fn skips_lock() {
        let lock = obj(json!({"apiVersion": "pkg.crossplane.io/v1", "kind": "Lock", "metadata": {"name": "lock"}}));
        assert!(should_skip(&lock, &[], &[]));
    }

    #[test]
    fn skips_namespace_outside_filter() {
        let ns = obj(json!({"kind": "Namespace", "metadata": {"name": "team-b"}}));
        assert!(should_skip(&ns, &["team-a".to_string()], &[]));
    }
}
