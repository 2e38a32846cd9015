//! Packages-Healthy and XRDs-Established wait loops (§4.9 steps 4-5).

use chrono::{Duration as ChronoDuration, Utc};
use kube::api::{Api, DynamicObject, ListParams};
use kube::core::GroupVersionKind;
use serde_json::Value;

use crate::discovery::DiscoveryClient;
use crate::error::{KubeError, Result};

const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(5);
const DEADLINE_MINUTES: i64 = 10;

const PACKAGE_KINDS: [&str; 3] = ["Provider", "Function", "Configuration"];
const PACKAGE_GROUP: &str = "pkg.crossplane.io";
const PACKAGE_VERSION: &str = "v1";

const XRD_GROUP: &str = "apiextensions.crossplane.io";
const XRD_VERSION: &str = "v1";
const XRD_KIND: &str = "CompositeResourceDefinition";

fn condition_is_true(object: &Value, condition_type: &str) -> bool {
    object
        .pointer("/status/conditions")
        .and_then(Value::as_array)
        .is_some_and(|conditions| {
            conditions.iter().any(|c| {
                c.get("type").and_then(Value::as_str) == Some(condition_type)
                    && c.get("status").and_then(Value::as_str) == Some("True")
            })
        })
}

async fn list_objects(discovery: &DiscoveryClient, gvk: &GroupVersionKind) -> Result<Vec<Value>> {
    let Some((api_resource, _capabilities)) = discovery.resolve_gvk(gvk) else {
        return Err(KubeError::MappingUnknown {
            group: gvk.group.clone(),
            kind: gvk.kind.clone(),
        });
    };
    let api: Api<DynamicObject> = Api::all_with(discovery.client().clone(), &api_resource);
    let list = api.list(&ListParams::default()).await.map_err(KubeError::classify)?;
    list.items
        .into_iter()
        .map(|item| serde_json::to_value(&item).map_err(KubeError::from))
        .collect()
}

/// Wait for every Provider/Function/Configuration to report `Installed=True` and
/// `Healthy=True`. Polls every 5s for up to 10 minutes (§4.9 step 4).
pub async fn wait_for_packages_healthy(discovery: &DiscoveryClient) -> Result<()> {
    let deadline = Utc::now() + ChronoDuration::minutes(DEADLINE_MINUTES);
    loop {
        let mut all_healthy = true;
        for kind in PACKAGE_KINDS {
            let gvk = GroupVersionKind::gvk(PACKAGE_GROUP, PACKAGE_VERSION, kind);
            for item in list_objects(discovery, &gvk).await? {
                if !(condition_is_true(&item, "Installed") && condition_is_true(&item, "Healthy")) {
                    all_healthy = false;
                }
            }
        }
        if all_healthy {
            return Ok(());
        }
        if Utc::now() >= deadline {
            return Err(KubeError::Timeout {
                what: "packages to report Installed=True and Healthy=True".to_string(),
                elapsed: format!("{DEADLINE_MINUTES}m"),
            });
        }
        tracing::debug!("packages not yet healthy, sleeping before next poll");
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Wait for every CompositeResourceDefinition to report `Established=True`.
/// Polls every 5s for up to 10 minutes (§4.9 step 5).
pub async fn wait_for_xrds_established(discovery: &DiscoveryClient) -> Result<()> {
    let deadline = Utc::now() + ChronoDuration::minutes(DEADLINE_MINUTES);
    let gvk = GroupVersionKind::gvk(XRD_GROUP, XRD_VERSION, XRD_KIND);
    loop {
        let items = list_objects(discovery, &gvk).await?;
        let all_established = items.iter().all(|item| condition_is_true(item, "Established"));
        if all_established {
            return Ok(());
        }
        if Utc::now() >= deadline {
            return Err(KubeError::Timeout {
                what: "XRDs to report Established=True".to_string(),
                elapsed: format!("{DEADLINE_MINUTES}m"),
            });
        }
        tracing::debug!("XRDs not yet established, sleeping before next poll");
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn condition_is_true_matches_status() {
        let obj = json!({"status": {"conditions": [
            {"type": "Installed", "status": "True"},
            {"type": "Healthy", "status": "False"},
        ]}});
        assert!(condition_is_true(&obj, "Installed"));
        assert!(!condition_is_true(&obj, "Healthy"));
        assert!(!condition_is_true(&obj, "Established"));
    }

    #[test]
    fn condition_is_true_handles_missing_status() {
        let obj = json!({});
        assert!(!condition_is_true(&obj, "Installed"));
    }
}
