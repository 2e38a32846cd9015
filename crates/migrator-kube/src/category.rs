//! Category Modifier (§4.6): discover every group-resource in a category, iterate
//! its objects, and apply a caller-supplied per-object transform.

use kube::api::{Api, DynamicObject, ListParams};

use migrator_core::resource::ResourceObject;

use crate::applier;
use crate::discovery::DiscoveryClient;
use crate::error::Result;

/// Apply `transform` to every object whose group-resource advertises `category`.
/// Returns the number of objects transformed.
pub async fn modify_category<F>(discovery: &DiscoveryClient, category: &str, transform: F) -> Result<usize>
where
    F: Fn(&mut ResourceObject) + Send + Sync,
{
    let group_resources = discovery.group_resources_in_category(category).await?;
    let mut count = 0;

    for info in group_resources {
        let gvk = info.gvk();
        let Some((api_resource, _capabilities)) = discovery.resolve_gvk(&gvk) else {
            continue;
        };
        let api: Api<DynamicObject> = Api::all_with(discovery.client().clone(), &api_resource);
        let list = api.list(&ListParams::default()).await?;

        for item in list.items {
            let name = match item.metadata.name.clone() {
                Some(name) => name,
                None => continue,
            };
            let namespace = item.metadata.namespace.clone();
            applier::modify(discovery, &gvk, namespace.as_deref(), &name, &transform).await?;
            count += 1;
        }
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    // `modify_category` drives live discovery + list + patch calls end to end; it
    // is exercised by migrator-kube's integration tests against a mocked API
    // server rather than here. The per-object transforms it wraps (pause/unpause)
    // are unit-tested in `migrator_core::annotations`.
}
