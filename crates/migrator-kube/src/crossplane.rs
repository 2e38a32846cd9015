//! Reads the installed Crossplane version and enabled feature flags from its
//! own Deployment, for the export manifest's `crossplane` field (§3).

use k8s_openapi::api::apps::v1::Deployment;
use kube::api::Api;
use kube::Client;

use migrator_core::manifest::CrossplaneInfo;

use crate::error::{KubeError, Result};

const CROSSPLANE_NAMESPACE: &str = "crossplane-system";
const CROSSPLANE_DEPLOYMENT: &str = "crossplane";
const CROSSPLANE_CONTAINER: &str = "crossplane";
const FEATURE_FLAG_PREFIX: &str = "--enable-";

pub async fn read_crossplane_info(client: &Client) -> Result<CrossplaneInfo> {
    let api: Api<Deployment> = Api::namespaced(client.clone(), CROSSPLANE_NAMESPACE);
    let deployment = api
        .get(CROSSPLANE_DEPLOYMENT)
        .await
        .map_err(KubeError::classify)?;

    let containers = deployment
        .spec
        .and_then(|spec| spec.template.spec)
        .map(|spec| spec.containers)
        .unwrap_or_default();

    let container = containers
        .into_iter()
        .find(|c| c.name == CROSSPLANE_CONTAINER);

    let version = container
        .as_ref()
        .and_then(|c| c.image.as_deref())
        .and_then(|image| image.rsplit_once(':'))
        .map(|(_, tag)| tag.to_string())
        .unwrap_or_default();

    let feature_flags = container
        .and_then(|c| c.args)
        .map(|args| extract_feature_flags(&args))
        .unwrap_or_default();

    Ok(CrossplaneInfo {
        version,
        feature_flags,
    })
}

fn extract_feature_flags(args: &[String]) -> Vec<String> {
    args.iter()
        .filter_map(|arg| arg.strip_prefix(FEATURE_FLAG_PREFIX).map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_enable_flags_from_container_args() {
        let args = vec![
            "--debug".to_string(),
            "--enable-usages".to_string(),
            "--enable-environment-configs".to_string(),
        ];
        let flags = extract_feature_flags(&args);
        assert_eq!(flags, vec!["usages", "environment-configs"]);
    }

    #[test]
    fn no_flags_when_none_present() {
        assert!(extract_feature_flags(&["--debug".to_string()]).is_empty());
    }
}
