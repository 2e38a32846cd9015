//! Cached discovery: GVK→GVR resolution and server-driven category lookup.
//!
//! Categories are not a static table (§9): user-installed XRDs extend `claim` /
//! `composite` / `managed` at runtime, so the category index is rebuilt from the
//! server's own discovery documents rather than hardcoded.

use std::collections::{BTreeMap, BTreeSet};

use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResourceList;
use kube::core::{GroupVersionKind, TypeMeta};
use kube::discovery::{ApiCapabilities, ApiResource, Discovery};
use kube::Client;

use crate::error::Result;

/// Derive a `GroupVersionKind` from an object's `apiVersion`/`kind`, matching
/// `sherpack-kube`'s `gvk_from_type_meta` convention of splitting on the last `/`.
pub fn gvk_from_type_meta(type_meta: &TypeMeta) -> GroupVersionKind {
    match type_meta.api_version.rsplit_once('/') {
        Some((group, version)) => GroupVersionKind::gvk(group, version, &type_meta.kind),
        None => GroupVersionKind::gvk("", &type_meta.api_version, &type_meta.kind),
    }
}

/// Wraps a `kube::discovery::Discovery` snapshot with an explicit reset operation,
/// since the importer must discard cached mappings once between steps 5 and 7 (§9).
pub struct DiscoveryClient {
    client: Client,
    discovery: Discovery,
}

impl DiscoveryClient {
    pub async fn new(client: Client) -> Result<Self> {
        let discovery = Discovery::new(client.clone()).run().await?;
        Ok(Self { client, discovery })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Discard cached REST mappings; an on-demand refresh backs the next lookup.
    pub async fn reset(&mut self) -> Result<()> {
        self.discovery = Discovery::new(self.client.clone()).run().await?;
        Ok(())
    }

    pub fn resolve_gvk(&self, gvk: &GroupVersionKind) -> Option<(ApiResource, ApiCapabilities)> {
        self.discovery.resolve_gvk(gvk)
    }

    /// Build the group-resource index from the server's discovery documents.
    /// Keys are formatted `<plural>.<group>` to match the archive tree's directory
    /// naming, and `<plural>` alone for the core group.
    pub async fn group_resource_index(&self) -> Result<BTreeMap<String, GroupResourceInfo>> {
        let mut index = BTreeMap::new();

        let core_versions = self.client.list_core_api_versions().await?;
        for version in core_versions.versions {
            let list = self.client.list_core_api_resources(&version).await?;
            merge_resources(&mut index, "", &version, &list);
        }

        let groups = self.client.list_api_groups().await?;
        for group in groups.groups {
            for gv in &group.versions {
                let list = self.client.list_api_group_resources(&gv.group_version).await?;
                merge_resources(&mut index, &group.name, &gv.version, &list);
            }
        }

        Ok(index)
    }

    /// Which group-resources currently advertise `category`?
    pub async fn group_resources_in_category(&self, category: &str) -> Result<Vec<GroupResourceInfo>> {
        let index = self.group_resource_index().await?;
        Ok(index
            .into_values()
            .filter(|info| info.categories.contains(category))
            .collect())
    }
}

/// A group-resource as seen through server discovery: enough to build a GVK and
/// to know whether it carries a given category.
#[derive(Debug, Clone)]
pub struct GroupResourceInfo {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub namespaced: bool,
    pub categories: BTreeSet<String>,
}

impl GroupResourceInfo {
    pub fn gvk(&self) -> GroupVersionKind {
        GroupVersionKind::gvk(&self.group, &self.version, &self.kind)
    }
}

fn merge_resources(
    index: &mut BTreeMap<String, GroupResourceInfo>,
    group: &str,
    version: &str,
    list: &APIResourceList,
) {
    for resource in &list.resources {
        if resource.name.contains('/') {
            continue; // subresources like pods/status carry no independent category set
        }
        let group_resource = if group.is_empty() {
            resource.name.clone()
        } else {
            format!("{}.{group}", resource.name)
        };
        let categories: BTreeSet<String> = resource.categories.clone().unwrap_or_default().into_iter().collect();
        index
            .entry(group_resource)
            .and_modify(|info| info.categories.extend(categories.clone()))
            .or_insert_with(|| GroupResourceInfo {
                group: group.to_string(),
                version: version.to_string(),
                kind: resource.kind.clone(),
                namespaced: resource.namespaced,
                categories,
            });
    }
}
