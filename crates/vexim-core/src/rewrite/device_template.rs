// Device templates reference feature templates through a tree of
// `generalTemplates` / `subTemplates` whose depth is data-dependent, so they
// get a structural walk instead of a reference table.

use serde_json::{Value, json};
use tracing::debug;

use crate::error::CoreError;
use crate::identity::IdentityMaps;
use crate::model::Phase;

use super::remap_leaf;

/// Bookkeeping fields the CLI template endpoint rejects.
const FILE_TEMPLATE_STRIP: &[&str] = &[
    "templateId",
    "feature",
    "lastUpdatedBy",
    "lastUpdatedOn",
    "createdOn",
    "createdBy",
    "@rid",
];

/// Where a prepared device template is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceTemplateRoute {
    /// `configType: "template"`, built from feature templates.
    Feature,
    /// `configType: "file"`, a raw CLI configuration.
    Cli,
}

impl DeviceTemplateRoute {
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Feature => "template/device/feature",
            Self::Cli => "template/device/cli",
        }
    }
}

/// Prepare a device template for the target controller.
///
/// Returns `None` for config types that cannot be imported. The input is
/// never modified.
pub fn rewrite_device_template(
    template: &Value,
    maps: &IdentityMaps,
) -> Result<Option<(DeviceTemplateRoute, Value)>, CoreError> {
    let mut value = template.clone();
    let Some(object) = value.as_object_mut() else {
        return Err(CoreError::MalformedObject {
            phase: Phase::DeviceTemplates,
            message: "device template is not a JSON object".into(),
        });
    };

    let config_type = object
        .get("configType")
        .and_then(Value::as_str)
        .map(str::to_owned);

    match config_type.as_deref() {
        Some("template") => {
            object.shift_remove("templateId");
            object.insert("featureTemplateUidRange".into(), json!([]));

            for field in ["policyId", "securityPolicyId"] {
                let id = remap_policy(object.get(field), maps)?;
                object.insert(field.into(), Value::String(id));
            }

            if let Some(general) = object.get_mut("generalTemplates") {
                remap_template_tree(general, maps)?;
            }
            Ok(Some((DeviceTemplateRoute::Feature, value)))
        }
        Some("file") => {
            for field in FILE_TEMPLATE_STRIP {
                object.shift_remove(*field);
            }
            Ok(Some((DeviceTemplateRoute::Cli, value)))
        }
        _ => Ok(None),
    }
}

/// Map a policy id through the vEdge map, then the vSmart map.
///
/// An id known to neither becomes `""`: the template is created without a
/// policy rather than pointing at an id from another controller.
fn remap_policy(current: Option<&Value>, maps: &IdentityMaps) -> Result<String, CoreError> {
    let id = current.and_then(Value::as_str).unwrap_or_default();
    if id.is_empty() {
        return Ok(String::new());
    }
    for phase in [Phase::VedgePolicies, Phase::VsmartPolicies] {
        if maps.pair(phase).old.natural_key(id).is_some() {
            return maps.resolve(phase, id);
        }
    }
    debug!(policy_id = id, "policy not in archive, clearing reference");
    Ok(String::new())
}

/// Remap `templateId` on every node of a `generalTemplates` tree.
fn remap_template_tree(node: &mut Value, maps: &IdentityMaps) -> Result<(), CoreError> {
    let Some(items) = node.as_array_mut() else {
        return Ok(());
    };
    for item in items {
        if let Some(id) = item.get_mut("templateId") {
            remap_leaf(id, Phase::FeatureTemplates, Phase::DeviceTemplates, maps)?;
        }
        if let Some(children) = item.get_mut("subTemplates") {
            remap_template_tree(children, maps)?;
        }
    }
    Ok(())
}
