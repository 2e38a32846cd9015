//! Exporter Orchestrator (§4.8): discover, optionally pause, fetch, sanitize,
//! and pack every in-scope group-resource into a gzipped tar archive.

use std::collections::BTreeMap;
use std::io::Write;

use kube::api::{Api, DynamicObject, ListParams};

use migrator_core::archive::{ArchiveWriter, ObjectScope};
use migrator_core::manifest::{ExportManifest, ExportOptions, TypeMetadata};

use crate::crossplane::read_crossplane_info;
use crate::discovery::{DiscoveryClient, GroupResourceInfo};
use crate::error::Result;
use crate::fetcher::ResourceFetcher;
use crate::pause::pause_before_export;
use crate::progress::ProgressSink;

const DEFAULT_EXTRA_RESOURCES: [&str; 3] = ["namespaces", "configmaps", "secrets"];
const CROSSPLANE_CATEGORIES: [&str; 3] = ["claim", "composite", "managed"];

/// Run a full export, writing the packed archive to `output`. Returns the
/// manifest that was embedded in the archive, for the caller to report on.
pub async fn export<W: Write>(
    discovery: &DiscoveryClient,
    options: ExportOptions,
    progress: &dyn ProgressSink,
    output: W,
) -> Result<ExportManifest> {
    progress.phase_start("discovering in-scope resources");
    let group_resources = discover_group_resources_to_export(discovery, &options).await?;
    progress.phase_done("discovering in-scope resources");

    if options.paused_before_export {
        progress.phase_start("pausing before export");
        for (category, count) in pause_before_export(discovery).await? {
            progress.step(&format!("paused {count} {category} resource(s)"));
        }
        progress.phase_done("pausing before export");
    }

    let crossplane = read_crossplane_info(discovery.client()).await?;
    let mut manifest = ExportManifest::new(options.clone(), crossplane, chrono::Utc::now());

    progress.phase_start("fetching and packing resources");
    let fetcher = ResourceFetcher::new(discovery.client().clone());
    let mut writer = ArchiveWriter::new(output);

    for (group_resource, info) in &group_resources {
        let Some((api_resource, capabilities)) = discovery.resolve_gvk(&info.gvk()) else {
            continue;
        };
        progress.step(&format!("fetching {group_resource}"));

        let mut objects = fetcher
            .fetch(&api_resource, &options.included_namespaces, &options.excluded_namespaces)
            .await?;
        for object in &mut objects {
            object.sanitize()?;
        }

        let type_metadata = TypeMetadata {
            categories: info.categories.clone(),
            with_status_subresource: has_status_subresource(&capabilities),
        };
        writer.write_type_metadata(group_resource, &type_metadata)?;

        for object in &objects {
            let scope = match object.namespace() {
                Some(ns) => ObjectScope::Namespaced(ns.to_string()),
                None => ObjectScope::Cluster,
            };
            writer.write_object(group_resource, &scope, object)?;
        }

        manifest
            .stats
            .record(group_resource, info.group.is_empty(), objects.len() as u64);
    }
    progress.phase_done("fetching and packing resources");

    writer.write_manifest(&manifest)?;
    writer.finish()?;

    Ok(manifest)
}

fn has_status_subresource(capabilities: &kube::discovery::ApiCapabilities) -> bool {
    capabilities
        .subresources
        .iter()
        .any(|sub| sub.0.plural.ends_with("status"))
}

/// Which group-resources are in scope: every Crossplane-defined kind, plus the
/// caller's extra resources (defaulting to namespaces/configmaps/secrets), minus
/// anything explicitly excluded.
async fn discover_group_resources_to_export(
    discovery: &DiscoveryClient,
    options: &ExportOptions,
) -> Result<Vec<(String, GroupResourceInfo)>> {
    let index = discovery.group_resource_index().await?;
    let mut selected: BTreeMap<String, GroupResourceInfo> = index
        .iter()
        .filter(|(_, info)| is_crossplane_defined(info))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let extras = if options.included_extra_resources.is_empty() {
        DEFAULT_EXTRA_RESOURCES.iter().map(|s| s.to_string()).collect()
    } else {
        options.included_extra_resources.clone()
    };
    for extra in extras {
        if let Some(info) = index.get(&extra) {
            selected.insert(extra, info.clone());
        }
    }

    for excluded in &options.excluded_resources {
        selected.remove(excluded);
    }

    Ok(selected.into_iter().collect())
}

fn is_crossplane_defined(info: &GroupResourceInfo) -> bool {
    info.group.ends_with("crossplane.io")
        || info
            .categories
            .iter()
            .any(|c| CROSSPLANE_CATEGORIES.contains(&c.as_str()))
}

/// Used by the importer's "Import Base" step (§4.9) to know which group-resources
/// must land before packages and XRDs are waited on.
pub async fn list_namespace_objects(discovery: &DiscoveryClient) -> Result<Vec<DynamicObject>> {
    let gvk = kube::core::GroupVersionKind::gvk("", "v1", "Namespace");
    let Some((api_resource, _)) = discovery.resolve_gvk(&gvk) else {
        return Ok(Vec::new());
    };
    let api: Api<DynamicObject> = Api::all_with(discovery.client().clone(), &api_resource);
    let list = api.list(&ListParams::default()).await?;
    Ok(list.items)
}
