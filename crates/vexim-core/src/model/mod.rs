// ── Domain model ──
//
// Object kinds, import/export phases, and the fixed REST subtype catalogs.
// Configuration objects themselves stay as `serde_json::Value`: the tool
// round-trips controller documents it does not own the schema of, and only
// touches the fields listed in the reference tables.

mod catalog;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub use catalog::{DEFINITION_SUBTYPES, LIST_SUBTYPES};

/// Coarse kind of a configuration object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum Kind {
    List,
    Definition,
    Policy,
    Template,
}

/// One kind/subtype group processed as an ordered unit.
///
/// Declaration order is dependency order: a phase only ever references
/// objects created by phases before it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[strum(to_string = "policy list")]
    Lists,
    #[strum(to_string = "policy definition")]
    Definitions,
    #[strum(to_string = "vEdge policy")]
    VedgePolicies,
    #[strum(to_string = "vSmart policy")]
    VsmartPolicies,
    #[strum(to_string = "feature template")]
    FeatureTemplates,
    #[strum(to_string = "device template")]
    DeviceTemplates,
}

impl Phase {
    /// Import order. Export writes the same set of documents.
    pub const ORDER: [Phase; 6] = [
        Phase::Lists,
        Phase::Definitions,
        Phase::VedgePolicies,
        Phase::VsmartPolicies,
        Phase::FeatureTemplates,
        Phase::DeviceTemplates,
    ];

    pub fn kind(self) -> Kind {
        match self {
            Self::Lists => Kind::List,
            Self::Definitions => Kind::Definition,
            Self::VedgePolicies | Self::VsmartPolicies => Kind::Policy,
            Self::FeatureTemplates | Self::DeviceTemplates => Kind::Template,
        }
    }

    /// Archive document holding this phase's objects.
    pub fn document(self) -> &'static str {
        match self {
            Self::Lists => "policy_list.json",
            Self::Definitions => "policy_definition.json",
            Self::VedgePolicies => "vedge_policy.json",
            Self::VsmartPolicies => "vsmart_policy.json",
            Self::FeatureTemplates => "feature_template.json",
            Self::DeviceTemplates => "device_template.json",
        }
    }

    /// Archive document holding the raw inventory listing captured at export
    /// time. Policy detail documents do not carry their own id, so the old
    /// identity map for policies is rebuilt from this snapshot.
    pub fn id_document(self) -> Option<&'static str> {
        match self {
            Self::VedgePolicies => Some("vedge_policy_id.json"),
            Self::VsmartPolicies => Some("vsmart_policy_id.json"),
            _ => None,
        }
    }

    /// REST mount point for inventory listing (`GET {mount}{subtype}`).
    pub fn mount(self) -> &'static str {
        match self {
            Self::Lists => "template/policy/list",
            Self::Definitions => "template/policy/definition",
            Self::VedgePolicies => "template/policy/vedge",
            Self::VsmartPolicies => "template/policy/vsmart",
            Self::FeatureTemplates => "template/feature",
            Self::DeviceTemplates => "template/device",
        }
    }

    /// Path prefix for fetching one full object during export
    /// (`GET {detail_mount}/{id}`).
    pub fn detail_mount(self) -> &'static str {
        match self {
            Self::Lists => "template/policy/list",
            Self::Definitions => "template/policy/definition",
            Self::VedgePolicies => "template/policy/vedge/definition",
            Self::VsmartPolicies => "template/policy/vsmart/definition",
            Self::FeatureTemplates => "template/feature/object",
            Self::DeviceTemplates => "template/device/object",
        }
    }

    /// Field carrying the controller-assigned id.
    pub fn id_field(self) -> &'static str {
        match self {
            Self::Lists => "listId",
            Self::Definitions => "definitionId",
            Self::VedgePolicies | Self::VsmartPolicies => "policyId",
            Self::FeatureTemplates | Self::DeviceTemplates => "templateId",
        }
    }

    /// Field carrying the human-facing name.
    pub fn name_field(self) -> &'static str {
        match self {
            Self::Lists | Self::Definitions => "name",
            Self::VedgePolicies | Self::VsmartPolicies => "policyName",
            Self::FeatureTemplates | Self::DeviceTemplates => "templateName",
        }
    }

    /// REST sub-paths this phase is split into. Empty for unsplit phases.
    pub fn subtypes(self) -> &'static [&'static str] {
        match self {
            Self::Lists => LIST_SUBTYPES,
            Self::Definitions => DEFINITION_SUBTYPES,
            _ => &[],
        }
    }

    /// Lists and definitions are keyed by subtype path plus name.
    pub fn is_subtyped(self) -> bool {
        matches!(self, Self::Lists | Self::Definitions)
    }

    /// Whether a later phase rewrites references into this one. Device
    /// templates end the chain, so import keeps no identity map for them.
    pub fn is_referenced(self) -> bool {
        !matches!(self, Self::DeviceTemplates)
    }
}

/// Derive the cross-controller key for an object.
///
/// `subtype + "/" + name` for lists and definitions (e.g. `/color/red`),
/// `name` alone for policies and templates.
pub fn natural_key(subtype: Option<&str>, name: &str) -> String {
    match subtype {
        Some(subtype) => format!("{subtype}/{name}"),
        None => name.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_key_for_subtyped_objects() {
        assert_eq!(natural_key(Some("/color"), "red"), "/color/red");
        assert_eq!(natural_key(None, "edge-base"), "edge-base");
    }

    #[test]
    fn order_is_dependency_order() {
        let mut sorted = Phase::ORDER;
        sorted.sort();
        assert_eq!(sorted, Phase::ORDER);
        assert_eq!(Phase::ORDER[0], Phase::Lists);
        assert_eq!(Phase::ORDER[5], Phase::DeviceTemplates);
    }

    #[test]
    fn only_policies_have_id_snapshots() {
        let with_ids: Vec<_> = Phase::ORDER
            .iter()
            .filter(|p| p.id_document().is_some())
            .collect();
        assert_eq!(with_ids, [&Phase::VedgePolicies, &Phase::VsmartPolicies]);
    }

    #[test]
    fn device_templates_are_never_referenced() {
        let referenced: Vec<_> = Phase::ORDER.iter().filter(|p| p.is_referenced()).collect();
        assert_eq!(referenced.len(), 5);
        assert!(!Phase::DeviceTemplates.is_referenced());
    }

    #[test]
    fn phase_display_is_human_readable() {
        assert_eq!(Phase::VsmartPolicies.to_string(), "vSmart policy");
        assert_eq!(Kind::Definition.to_string(), "definition");
    }
}
