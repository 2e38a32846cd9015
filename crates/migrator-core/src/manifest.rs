//! The export manifest (`export.yaml`) and per-group type metadata (`metadata.yaml`).

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const MANIFEST_VERSION: &str = "v1alpha1";

/// Top-level descriptor written once per export as `export.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportManifest {
    pub version: String,
    #[serde(rename = "exportedAt")]
    pub exported_at: DateTime<Utc>,
    pub options: ExportOptions,
    pub crossplane: CrossplaneInfo,
    pub stats: ExportStats,
}

impl ExportManifest {
    pub fn new(options: ExportOptions, crossplane: CrossplaneInfo, exported_at: DateTime<Utc>) -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            exported_at,
            options,
            crossplane,
            stats: ExportStats::default(),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportOptions {
    #[serde(rename = "includedNamespaces", default)]
    pub included_namespaces: Vec<String>,
    #[serde(rename = "excludedNamespaces", default)]
    pub excluded_namespaces: Vec<String>,
    #[serde(rename = "includedExtraResources", default)]
    pub included_extra_resources: Vec<String>,
    #[serde(rename = "excludedResources", default)]
    pub excluded_resources: Vec<String>,
    #[serde(rename = "pausedBeforeExport", default)]
    pub paused_before_export: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrossplaneInfo {
    pub version: String,
    #[serde(rename = "featureFlags", default)]
    pub feature_flags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportStats {
    pub total: u64,
    #[serde(rename = "nativeResources", default)]
    pub native_resources: BTreeMap<String, u64>,
    #[serde(rename = "customResources", default)]
    pub custom_resources: BTreeMap<String, u64>,
}

impl ExportStats {
    pub fn record(&mut self, group_resource: &str, is_native: bool, count: u64) {
        self.total += count;
        let bucket = if is_native {
            &mut self.native_resources
        } else {
            &mut self.custom_resources
        };
        *bucket.entry(group_resource.to_string()).or_insert(0) += count;
    }
}

/// Per-group sidecar embedded in the archive as `<group-resource>/metadata.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypeMetadata {
    pub categories: BTreeSet<String>,
    #[serde(rename = "withStatusSubresource", default)]
    pub with_status_subresource: bool,
}

impl TypeMetadata {
    pub fn has_category(&self, category: &str) -> bool {
        self.categories.contains(category)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Caller-supplied import options (CLI `import` subcommand flags).
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub unpause_after_import: bool,
    pub mcp_connector_cluster_id: Option<String>,
    pub mcp_connector_claim_namespace: Option<String>,
    pub import_claims_only: bool,
    pub skip_target_check: bool,
}

impl ImportOptions {
    /// Both connector fields must be set for claim renaming to apply (§4.10 step 2).
    pub fn connector_topology(&self) -> Option<(&str, &str)> {
        match (
            self.mcp_connector_cluster_id.as_deref(),
            self.mcp_connector_claim_namespace.as_deref(),
        ) {
            (Some(cluster_id), Some(claim_namespace)) => Some((cluster_id, claim_namespace)),
            _ => None,
        }
    }
}

/// Non-fatal preflight mismatch, collected and returned as a list for the caller to judge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreflightWarning {
    VersionMismatch { archive: String, target: String },
    MissingFeatureFlag { flag: String },
}

impl std::fmt::Display for PreflightWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreflightWarning::VersionMismatch { archive, target } => write!(
                f,
                "archive was exported from Crossplane {archive} but target is running {target}"
            ),
            PreflightWarning::MissingFeatureFlag { flag } => {
                write!(f, "archive requires feature flag {flag} not enabled on target")
            }
        }
    }
}

/// Compare the archive's recorded Crossplane version/flags against the target's.
pub fn preflight(archive: &CrossplaneInfo, target: &CrossplaneInfo) -> Vec<PreflightWarning> {
    let mut warnings = Vec::new();
    if archive.version != target.version {
        warnings.push(PreflightWarning::VersionMismatch {
            archive: archive.version.clone(),
            target: target.version.clone(),
        });
    }
    for flag in &archive.feature_flags {
        if !target.feature_flags.contains(flag) {
            warnings.push(PreflightWarning::MissingFeatureFlag { flag: flag.clone() });
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_roundtrips_through_yaml() {
        let mut manifest = ExportManifest::new(
            ExportOptions::default(),
            CrossplaneInfo {
                version: "v1.18.0".to_string(),
                feature_flags: vec!["Foo".to_string()],
            },
            Utc::now(),
        );
        manifest.stats.record("widgets.example.org", false, 3);
        let yaml = manifest.to_yaml().unwrap();
        let parsed = ExportManifest::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.version, MANIFEST_VERSION);
        assert_eq!(parsed.stats.total, 3);
        assert_eq!(
            parsed.stats.custom_resources.get("widgets.example.org"),
            Some(&3)
        );
    }

    #[test]
    fn preflight_reports_version_and_flag_mismatch() {
        let archive = CrossplaneInfo {
            version: "v1.18.0".to_string(),
            feature_flags: vec!["Foo".to_string()],
        };
        let target = CrossplaneInfo {
            version: "v1.17.0".to_string(),
            feature_flags: vec![],
        };
        let warnings = preflight(&archive, &target);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn preflight_clean_when_matching() {
        let info = CrossplaneInfo {
            version: "v1.18.0".to_string(),
            feature_flags: vec!["Foo".to_string()],
        };
        assert!(preflight(&info, &info).is_empty());
    }

    #[test]
    fn type_metadata_yaml_roundtrip() {
        let mut meta = TypeMetadata::default();
        meta.categories.insert("claim".to_string());
        meta.with_status_subresource = true;
        let yaml = meta.to_yaml().unwrap();
        let parsed = TypeMetadata::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, meta);
        assert!(parsed.has_category("claim"));
    }
}
