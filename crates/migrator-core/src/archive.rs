//! The deterministic archive tree (§3) and its gzipped-tar packing/unpacking.
//!
//! Export writes are one file per object into a layout keyed by group-resource and
//! scope; the whole tree is then streamed through a single tar+gzip pass. Import is
//! the mirror image: one decompression pass yields an in-memory tree that the
//! importer orchestrator walks group by group.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::sync::LazyLock;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use regex::Regex;
use tar::{Archive, Builder, Header};

use crate::error::{CoreError, Result};
use crate::manifest::{ExportManifest, TypeMetadata};
use crate::resource::ResourceObject;

pub const EXPORT_MANIFEST_NAME: &str = "export.yaml";
const METADATA_FILE_NAME: &str = "metadata.yaml";

const DNS_LABEL: &str = "[a-z0-9]([a-z0-9-]*[a-z0-9])?";

static OBJECT_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(cluster|namespaces/{DNS_LABEL})/{DNS_LABEL}(\.{DNS_LABEL})*\.yaml$"
    ))
    .unwrap()
});

/// Where an object lives within its group-resource directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectScope {
    Cluster,
    Namespaced(String),
}

impl ObjectScope {
    fn relative_dir(&self) -> String {
        match self {
            ObjectScope::Cluster => "cluster".to_string(),
            ObjectScope::Namespaced(ns) => format!("namespaces/{ns}"),
        }
    }
}

fn object_path(group_resource: &str, scope: &ObjectScope, name: &str) -> String {
    format!("{group_resource}/{}/{name}.yaml", scope.relative_dir())
}

fn metadata_path(group_resource: &str) -> String {
    format!("{group_resource}/{METADATA_FILE_NAME}")
}

/// Validate a path relative to its group-resource directory against the §3 invariant.
pub fn validate_relative_object_path(relative: &str) -> Result<()> {
    if OBJECT_PATH.is_match(relative) {
        Ok(())
    } else {
        Err(CoreError::InvalidPath {
            path: relative.to_string(),
        })
    }
}

/// Streams a sanitized export tree into a single gzipped tar writer.
pub struct ArchiveWriter<W: Write> {
    builder: Builder<GzEncoder<W>>,
}

impl<W: Write> ArchiveWriter<W> {
    pub fn new(writer: W) -> Self {
        let encoder = GzEncoder::new(writer, Compression::default());
        Self {
            builder: Builder::new(encoder),
        }
    }

    pub fn write_manifest(&mut self, manifest: &ExportManifest) -> Result<()> {
        self.append(EXPORT_MANIFEST_NAME, manifest.to_yaml()?.as_bytes())
    }

    pub fn write_type_metadata(&mut self, group_resource: &str, metadata: &TypeMetadata) -> Result<()> {
        self.append(&metadata_path(group_resource), metadata.to_yaml()?.as_bytes())
    }

    pub fn write_object(
        &mut self,
        group_resource: &str,
        scope: &ObjectScope,
        object: &ResourceObject,
    ) -> Result<()> {
        let name = object.name().ok_or_else(|| CoreError::Format {
            message: format!("object in {group_resource} has no metadata.name"),
        })?;
        let path = object_path(group_resource, scope, name);
        let yaml = serde_yaml::to_string(object.value())?;
        self.append(&path, yaml.as_bytes())
    }

    fn append(&mut self, path: &str, content: &[u8]) -> Result<()> {
        let mut header = Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o600);
        header.set_mtime(0);
        header.set_cksum();
        self.builder.append_data(&mut header, path, content)?;
        Ok(())
    }

    pub fn finish(self) -> Result<()> {
        let encoder = self.builder.into_inner()?;
        encoder.finish()?;
        Ok(())
    }
}

/// The decoded in-memory tree produced by reading an archive.
#[derive(Debug, Clone, Default)]
pub struct ArchiveTree {
    pub manifest: Option<ExportManifest>,
    pub groups: BTreeMap<String, GroupEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct GroupEntry {
    pub metadata: TypeMetadata,
    pub objects: Vec<ResourceObject>,
}

/// Decode a gzipped tar stream into an [`ArchiveTree`], enforcing the path invariant.
pub fn read_archive<R: Read>(reader: R) -> Result<ArchiveTree> {
    let decoder = GzDecoder::new(reader);
    let mut archive = Archive::new(decoder);
    let mut tree = ArchiveTree::default();

    for entry in archive.entries()? {
        let mut entry = entry?;
        if entry.header().entry_type().is_dir() {
            continue;
        }
        let path = entry.path()?.to_string_lossy().to_string();
        let mut content = String::new();
        entry.read_to_string(&mut content)?;

        if path == EXPORT_MANIFEST_NAME {
            tree.manifest = Some(ExportManifest::from_yaml(&content)?);
            continue;
        }

        let Some((group_resource, relative)) = path.split_once('/') else {
            return Err(CoreError::InvalidPath { path });
        };

        if relative == METADATA_FILE_NAME {
            let metadata = TypeMetadata::from_yaml(&content)?;
            tree.groups.entry(group_resource.to_string()).or_default().metadata = metadata;
            continue;
        }

        validate_relative_object_path(relative).map_err(|_| CoreError::InvalidPath {
            path: path.clone(),
        })?;
        let object: ResourceObject = ResourceObject::new(serde_yaml::from_str(&content)?);
        tree.groups
            .entry(group_resource.to_string())
            .or_default()
            .objects
            .push(object);
    }

    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{CrossplaneInfo, ExportOptions};
    use chrono::Utc;
    use serde_json::json;

    fn widget(name: &str, namespace: Option<&str>) -> ResourceObject {
        let mut metadata = serde_json::Map::new();
        metadata.insert("name".to_string(), json!(name));
        if let Some(ns) = namespace {
            metadata.insert("namespace".to_string(), json!(ns));
        }
        ResourceObject::new(json!({
            "apiVersion": "example.org/v1",
            "kind": "Widget",
            "metadata": metadata,
        }))
    }

    #[test]
    fn round_trips_objects_and_manifest() {
        let mut buf = Vec::new();
        {
            let mut writer = ArchiveWriter::new(&mut buf);
            let manifest = ExportManifest::new(
                ExportOptions::default(),
                CrossplaneInfo {
                    version: "v1.18.0".to_string(),
                    feature_flags: vec![],
                },
                Utc::now(),
            );
            writer.write_manifest(&manifest).unwrap();
            writer
                .write_type_metadata("widgets.example.org", &TypeMetadata::default())
                .unwrap();
            writer
                .write_object(
                    "widgets.example.org",
                    &ObjectScope::Namespaced("team-a".to_string()),
                    &widget("w1", Some("team-a")),
                )
                .unwrap();
            writer
                .write_object("namespaces", &ObjectScope::Cluster, &widget("team-a", None))
                .unwrap();
            writer.finish().unwrap();
        }

        let tree = read_archive(buf.as_slice()).unwrap();
        assert!(tree.manifest.is_some());
        let group = tree.groups.get("widgets.example.org").unwrap();
        assert_eq!(group.objects.len(), 1);
        assert_eq!(group.objects[0].name(), Some("w1"));
        let namespaces = tree.groups.get("namespaces").unwrap();
        assert_eq!(namespaces.objects[0].name(), Some("team-a"));
    }

    #[test]
    fn rejects_malformed_object_path() {
        let mut buf = Vec::new();
        {
            let encoder = GzEncoder::new(&mut buf, Compression::default());
            let mut builder = Builder::new(encoder);
            let content = b"apiVersion: v1\nkind: Widget\n";
            let mut header = Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o600);
            header.set_cksum();
            builder
                .append_data(&mut header, "widgets.example.org/bogus/w1.yaml", &content[..])
                .unwrap();
            builder.into_inner().unwrap().finish().unwrap();
        }
        let err = read_archive(buf.as_slice()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPath { .. }));
    }

    #[test]
    fn relative_path_patterns() {
        assert!(validate_relative_object_path("cluster/team-a.yaml").is_ok());
        assert!(validate_relative_object_path("namespaces/team-a/widget-1.yaml").is_ok());
        assert!(validate_relative_object_path("namespaces/Team-A/widget.yaml").is_err());
        assert!(validate_relative_object_path("cluster/widget").is_err());
        assert!(validate_relative_object_path("other/widget.yaml").is_err());
    }
}
