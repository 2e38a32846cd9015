//! The pause-coordination annotation protocol.
//!
//! Two annotations carry the whole protocol: the paused marker that Crossplane's
//! own controllers honor, and a sentinel the migrator writes to remember that the
//! marker pre-existed at export time. Keeping the sentinel write/read logic pure
//! and independent of any cluster client makes it trivial to exercise every branch.

use crate::resource::ResourceObject;

/// Operator-level pause marker honored by Crossplane controllers.
pub const PAUSED: &str = "crossplane.io/paused";

/// Sentinel recording that `PAUSED` pre-existed before the migrator touched it.
pub const ALREADY_PAUSED: &str = "migration.upbound.io/already-paused";

const TRUE: &str = "true";

/// Category labels the protocol reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Managed,
    Claim,
    Composite,
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Managed => "managed",
            Category::Claim => "claim",
            Category::Composite => "composite",
            Category::Other => "",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "managed" => Category::Managed,
            "claim" => Category::Claim,
            "composite" => Category::Composite,
            _ => Category::Other,
        }
    }
}

/// Apply the pause transform to a single object, matching §4.7 Pause semantics.
///
/// If the paused marker is already present, records the already-paused sentinel
/// instead of touching the marker. Otherwise sets the marker.
pub fn pause(obj: &mut ResourceObject) {
    if obj.get_annotation(PAUSED).as_deref() == Some(TRUE) {
        obj.set_annotation(ALREADY_PAUSED, TRUE);
    } else {
        obj.set_annotation(PAUSED, TRUE);
    }
}

/// Apply the unpause transform to a single object, matching §4.7 Unpause semantics.
///
/// The sentinel is never removed here — only inspected. Removing it is left to
/// whichever tool is responsible for sentinel cleanup, by design.
pub fn unpause(obj: &mut ResourceObject) {
    let sentinel = obj.get_annotation(ALREADY_PAUSED);
    let sentinel_set = matches!(sentinel.as_deref(), Some(TRUE));
    if !sentinel_set {
        obj.remove_annotation(PAUSED);
    }
}

/// True if the object already carries the paused marker.
pub fn is_paused(obj: &ResourceObject) -> bool {
    obj.get_annotation(PAUSED).as_deref() == Some(TRUE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj_with_annotations(annotations: serde_json::Value) -> ResourceObject {
        ResourceObject::new(json!({
            "apiVersion": "example.org/v1",
            "kind": "Widget",
            "metadata": { "name": "w1", "annotations": annotations },
        }))
    }

    #[test]
    fn pause_sets_marker_when_absent() {
        let mut obj = obj_with_annotations(json!({}));
        pause(&mut obj);
        assert_eq!(obj.get_annotation(PAUSED), Some("true".to_string()));
        assert_eq!(obj.get_annotation(ALREADY_PAUSED), None);
    }

    #[test]
    fn pause_sets_sentinel_when_already_paused() {
        let mut obj = obj_with_annotations(json!({ "crossplane.io/paused": "true" }));
        pause(&mut obj);
        assert_eq!(obj.get_annotation(PAUSED), Some("true".to_string()));
        assert_eq!(obj.get_annotation(ALREADY_PAUSED), Some("true".to_string()));
    }

    #[test]
    fn unpause_removes_marker_when_sentinel_absent() {
        let mut obj = obj_with_annotations(json!({ "crossplane.io/paused": "true" }));
        unpause(&mut obj);
        assert_eq!(obj.get_annotation(PAUSED), None);
    }

    #[test]
    fn unpause_keeps_marker_when_sentinel_set() {
        let mut obj = obj_with_annotations(json!({
            "crossplane.io/paused": "true",
            "migration.upbound.io/already-paused": "true",
        }));
        unpause(&mut obj);
        assert_eq!(obj.get_annotation(PAUSED), Some("true".to_string()));
        assert_eq!(
            obj.get_annotation(ALREADY_PAUSED),
            Some("true".to_string()),
            "sentinel is left in place, not cleaned up"
        );
    }

    #[test]
    fn unpause_idempotent_regardless_of_sentinel_value_false() {
        let mut obj = obj_with_annotations(json!({
            "crossplane.io/paused": "true",
            "migration.upbound.io/already-paused": "false",
        }));
        unpause(&mut obj);
        assert_eq!(obj.get_annotation(PAUSED), None);
    }

    #[test]
    fn category_round_trips_through_str() {
        for cat in [Category::Managed, Category::Claim, Category::Composite] {
            assert_eq!(Category::from_str(cat.as_str()), cat);
        }
    }
}
