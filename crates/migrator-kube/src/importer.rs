//! Importer Orchestrator (§4.9): a linear, fail-fast state machine. Any step's
//! error aborts the run; the caller decides what to do with a declined preflight.

use std::io::Read;

use migrator_core::annotations::pause;
use migrator_core::archive::{read_archive, ArchiveTree};
use migrator_core::claim::{rename_claims, retarget_claim_refs};
use migrator_core::manifest::{preflight, ExportManifest, ImportOptions, PreflightWarning};
use migrator_core::resource::ResourceObject;
use migrator_core::CoreError;

use crate::applier;
use crate::crossplane::read_crossplane_info;
use crate::discovery::DiscoveryClient;
use crate::error::{KubeError, Result};
use crate::pause::unpause_category;
use crate::progress::ProgressSink;
use crate::wait::{wait_for_packages_healthy, wait_for_xrds_established};

/// Fixed ordered list of group-resources imported before any wait loop runs (§4.9 step 3).
pub const BASE_RESOURCES: &[&str] = &[
    "namespaces",
    "configmaps",
    "secrets",
    "controllerconfigs.pkg.crossplane.io",
    "deploymentruntimeconfigs.pkg.crossplane.io",
    "storeconfigs.secrets.crossplane.io",
    "compositionrevisions.apiextensions.crossplane.io",
    "compositions.apiextensions.crossplane.io",
    "compositeresourcedefinitions.apiextensions.crossplane.io",
    "providers.pkg.crossplane.io",
    "functions.pkg.crossplane.io",
    "configurations.pkg.crossplane.io",
];

/// Unpacked archive plus the preflight warnings the caller must act on before
/// `run` is invoked.
pub struct ImportPreflight {
    pub archive: ArchiveTree,
    pub manifest: ExportManifest,
    pub warnings: Vec<PreflightWarning>,
}

/// Step 1 (Read) and step 2 (Preflight). Does not touch the target cluster
/// beyond reading the Crossplane Deployment used for the version comparison.
pub async fn read_and_preflight<R: Read>(discovery: &DiscoveryClient, input: R) -> Result<ImportPreflight> {
    let archive = read_archive(input)?;
    let manifest = archive.manifest.clone().ok_or_else(|| {
        KubeError::Core(CoreError::Format {
            message: "archive is missing export.yaml".to_string(),
        })
    })?;
    let target_crossplane = read_crossplane_info(discovery.client()).await?;
    let warnings = preflight(&manifest.crossplane, &target_crossplane);
    Ok(ImportPreflight {
        archive,
        manifest,
        warnings,
    })
}

/// Steps 3-9. Requires a preflight the caller has already inspected and decided
/// to proceed with.
pub async fn run(
    discovery: &mut DiscoveryClient,
    preflight: ImportPreflight,
    options: ImportOptions,
    progress: &dyn ProgressSink,
) -> Result<()> {
    let ImportPreflight { archive, manifest, .. } = preflight;

    progress.phase_start("importing base resources");
    for group_resource in BASE_RESOURCES {
        if archive.groups.contains_key(*group_resource) {
            progress.step(&format!("importing {group_resource}"));
            pausing_import(discovery, &archive, group_resource, false, &manifest, &options).await?;
        }
    }
    progress.phase_done("importing base resources");

    progress.phase_start("waiting for packages to become healthy");
    wait_for_packages_healthy(discovery).await?;
    progress.phase_done("waiting for packages to become healthy");

    progress.phase_start("waiting for XRDs to become established");
    wait_for_xrds_established(discovery).await?;
    progress.phase_done("waiting for XRDs to become established");

    tracing::debug!("resetting REST mapper cache before importing remaining resources");
    discovery.reset().await?;

    progress.phase_start("importing remaining resources");
    for group_resource in archive.groups.keys() {
        if BASE_RESOURCES.contains(&group_resource.as_str()) {
            continue;
        }
        let entry = &archive.groups[group_resource];
        if options.import_claims_only && !entry.metadata.has_category("claim") {
            continue;
        }
        progress.step(&format!("importing {group_resource}"));
        pausing_import(discovery, &archive, group_resource, true, &manifest, &options).await?;
    }
    progress.phase_done("importing remaining resources");

    progress.phase_start("unpausing user-facing APIs");
    for category in ["composite", "claim"] {
        let count = unpause_category(discovery, category).await?;
        progress.step(&format!("unpaused {count} {category} resource(s)"));
    }
    progress.phase_done("unpausing user-facing APIs");

    if options.unpause_after_import {
        progress.phase_start("unpausing managed resources");
        let count = unpause_category(discovery, "managed").await?;
        progress.step(&format!("unpaused {count} managed resource(s)"));
        progress.phase_done("unpausing managed resources");
    }

    Ok(())
}

/// PausingImport(gr, applyStatus) (§4.10).
async fn pausing_import(
    discovery: &DiscoveryClient,
    archive: &ArchiveTree,
    group_resource: &str,
    apply_status: bool,
    manifest: &ExportManifest,
    options: &ImportOptions,
) -> Result<()> {
    let Some(entry) = archive.groups.get(group_resource) else {
        return Ok(());
    };
    let mut objects = entry.objects.clone();

    if let Some((cluster_id, claim_namespace)) = options.connector_topology() {
        let is_claim = entry.metadata.has_category("claim");
        let is_composite = entry.metadata.has_category("composite");
        if is_claim || is_composite {
            if claim_namespace != "default" {
                ensure_namespace_exists(discovery, claim_namespace).await?;
            }
            if is_claim {
                rename_claims(&mut objects, cluster_id, claim_namespace);
            } else {
                retarget_claim_refs(&mut objects, cluster_id, claim_namespace);
            }
        }
    }

    if !manifest.options.paused_before_export
        && ["managed", "claim", "composite"]
            .iter()
            .any(|category| entry.metadata.has_category(category))
    {
        for object in &mut objects {
            pause(object);
        }
    }

    for object in &objects {
        applier::apply(discovery, object, apply_status, entry.metadata.with_status_subresource).await?;
    }

    Ok(())
}

async fn ensure_namespace_exists(discovery: &DiscoveryClient, namespace: &str) -> Result<()> {
    let object = ResourceObject::new(serde_json::json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {"name": namespace},
    }));
    applier::apply(discovery, &object, false, false).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_resources_lists_package_kinds_last() {
        assert_eq!(BASE_RESOURCES[0], "namespaces");
        assert_eq!(BASE_RESOURCES.last(), Some(&"configurations.pkg.crossplane.io"));
        assert_eq!(BASE_RESOURCES.len(), 12);
    }
}
