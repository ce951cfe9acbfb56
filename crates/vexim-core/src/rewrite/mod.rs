// ── Reference rewriter ──
//
// Walks a configuration object along the field paths listed in its
// reference table and swaps every old-controller id for the id the same
// natural key has on the target controller.

mod device_template;
pub mod tables;

use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;
use crate::identity::IdentityMaps;
use crate::model::{Kind, Phase};

pub use device_template::{DeviceTemplateRoute, rewrite_device_template};

/// One segment of a reference path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Descend into an object member.
    Field(&'static str),
    /// Visit every element of an array.
    Each,
    /// Visit every element of an array, or the value itself if it is not one.
    MaybeEach,
}

/// A location holding ids of objects created by `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceField {
    pub path: &'static [Step],
    pub target: Phase,
}

/// The reference fields of one `(phase, subtype)`.
///
/// For lists and definitions `subtype` is the REST sub-path (`/acl`); for
/// policies it is the `policyType` (`feature`, `cli`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceTable {
    pub phase: Phase,
    pub subtype: &'static str,
    pub fields: &'static [ReferenceField],
}

impl ReferenceTable {
    pub fn kind(&self) -> Kind {
        self.phase.kind()
    }
}

/// Whether a reference table existed for the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Known,
    /// No table: the object was passed through untouched.
    Unknown,
}

/// Result of [`rewrite`].
#[derive(Debug, Clone, PartialEq)]
pub struct Rewritten {
    pub value: Value,
    pub table: TableStatus,
}

/// Rewrite every reference field of `object` for `(phase, subtype)`.
///
/// Works on a copy: on error `object` is untouched and nothing partial
/// escapes. Objects of a subtype without a table come back unchanged with
/// [`TableStatus::Unknown`].
pub fn rewrite(
    phase: Phase,
    subtype: &str,
    object: &Value,
    maps: &IdentityMaps,
) -> Result<Rewritten, CoreError> {
    let Some(table) = tables::lookup(phase, subtype) else {
        return Ok(Rewritten {
            value: object.clone(),
            table: TableStatus::Unknown,
        });
    };

    let mut value = object.clone();
    for field in table.fields {
        visit(&mut value, field.path, &mut |leaf| {
            remap_leaf(leaf, field.target, phase, maps)
        })?;
    }

    Ok(Rewritten {
        value,
        table: TableStatus::Known,
    })
}

/// Call `f` on every value reachable through `path`.
///
/// A missing member, or a non-array where an array is expected, is simply
/// no occurrence.
pub(crate) fn visit(
    node: &mut Value,
    path: &[Step],
    f: &mut dyn FnMut(&mut Value) -> Result<(), CoreError>,
) -> Result<(), CoreError> {
    let Some((step, rest)) = path.split_first() else {
        return f(node);
    };

    match *step {
        Step::Field(name) => match node.get_mut(name) {
            Some(child) => visit(child, rest, f),
            None => Ok(()),
        },
        Step::Each => match node {
            Value::Array(items) => items.iter_mut().try_for_each(|item| visit(item, rest, f)),
            _ => Ok(()),
        },
        Step::MaybeEach => match node {
            Value::Array(items) => items.iter_mut().try_for_each(|item| visit(item, rest, f)),
            other => visit(other, rest, f),
        },
    }
}

/// Replace one id in place. `null` and `""` mean "no reference".
pub(super) fn remap_leaf(
    leaf: &mut Value,
    target: Phase,
    owner: Phase,
    maps: &IdentityMaps,
) -> Result<(), CoreError> {
    match leaf {
        Value::Null => Ok(()),
        Value::String(id) if id.is_empty() => Ok(()),
        Value::String(id) => {
            *id = maps.resolve(target, id)?;
            Ok(())
        }
        other => Err(CoreError::MalformedObject {
            phase: owner,
            message: format!("expected a {target} id, found {other}"),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::identity::IdentityMap;
    use crate::model::Kind;

    fn list_maps(pairs: &[(&str, &str, &str)]) -> IdentityMaps {
        let mut old = IdentityMap::new(Kind::List);
        let mut new = IdentityMap::new(Kind::List);
        for (old_id, key, new_id) in pairs {
            old.insert(old_id, (*key).into()).unwrap();
            new.insert(new_id, (*key).into()).unwrap();
        }
        let mut maps = IdentityMaps::new();
        maps.set_old(Phase::Lists, old);
        maps.set_new(Phase::Lists, new);
        maps
    }

    #[test]
    fn acl_action_parameter_ref_is_remapped() {
        let maps = list_maps(&[("old-123", "/color/red", "new-789")]);
        let acl = json!({
            "name": "block-red",
            "sequences": [{ "actions": [{ "parameter": { "ref": "old-123" } }] }]
        });

        let out = rewrite(Phase::Definitions, "/acl", &acl, &maps).unwrap();
        assert_eq!(out.table, TableStatus::Known);
        assert_eq!(
            out.value["sequences"][0]["actions"][0]["parameter"]["ref"],
            "new-789"
        );
    }

    #[test]
    fn parameter_as_list_is_remapped_too() {
        let maps = list_maps(&[("o-1", "/tloc/dc", "n-1"), ("o-2", "/sla/gold", "n-2")]);
        let data = json!({
            "sequences": [{
                "actions": [{
                    "parameter": [
                        { "ref": "o-2" },
                        { "value": { "tlocList": { "ref": "o-1" } } }
                    ]
                }]
            }]
        });

        let out = rewrite(Phase::Definitions, "/data", &data, &maps).unwrap();
        let params = &out.value["sequences"][0]["actions"][0]["parameter"];
        assert_eq!(params[0]["ref"], "n-2");
        assert_eq!(params[1]["value"]["tlocList"]["ref"], "n-1");
    }

    #[test]
    fn non_reference_content_is_untouched() {
        let maps = list_maps(&[("o-1", "/site/branches", "n-1")]);
        let original = json!({
            "name": "mesh-a",
            "type": "mesh",
            "description": "regional mesh",
            "definition": {
                "vpnList": "o-1",
                "regions": [{ "name": "east", "siteLists": [] }]
            }
        });

        let out = rewrite(Phase::Definitions, "/mesh", &original, &maps).unwrap();

        let mut expected = original.clone();
        expected["definition"]["vpnList"] = json!("n-1");
        assert_eq!(out.value, expected);
    }

    #[test]
    fn absent_and_empty_fields_are_skipped() {
        let maps = IdentityMaps::new();
        let qos = json!({
            "definition": { "qosSchedulers": [{ "classMapRef": "" }, { "queue": "0" }] }
        });
        let out = rewrite(Phase::Definitions, "/qosmap", &qos, &maps).unwrap();
        assert_eq!(out.value, qos);
    }

    #[test]
    fn unresolved_reference_fails_without_partial_output() {
        let maps = list_maps(&[("o-1", "/site/a", "n-1")]);
        let hub = json!({
            "definition": {
                "vpnList": "o-1",
                "subDefinitions": [{ "tlocList": "o-missing" }]
            }
        });

        let err = rewrite(Phase::Definitions, "/hubandspoke", &hub, &maps).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnresolvedReference { ref native_id, .. } if native_id == "o-missing"
        ));
        assert_eq!(hub["definition"]["vpnList"], "o-1");
    }

    #[test]
    fn definition_before_lists_phase_cannot_resolve() {
        let maps = IdentityMaps::new();
        let route = json!({
            "sequences": [{ "match": { "entries": [{ "field": "prefixList", "ref": "o-1" }] } }]
        });
        let err = rewrite(Phase::Definitions, "/vedgeroute", &route, &maps).unwrap_err();
        assert!(matches!(err, CoreError::UnresolvedReference { target: Phase::Lists, .. }));
    }

    #[test]
    fn unknown_subtype_passes_through() {
        let maps = IdentityMaps::new();
        let rule = json!({ "name": "rw", "definition": { "rules": [{ "class": "x" }] } });
        let out = rewrite(Phase::Definitions, "/rewriterule", &rule, &maps).unwrap();
        assert_eq!(out.table, TableStatus::Unknown);
        assert_eq!(out.value, rule);
    }

    #[test]
    fn vsmart_assembly_rewrites_definitions_then_lists() {
        let mut maps = list_maps(&[("sl-old", "/site/hq", "sl-new"), ("vl-old", "/vpn/corp", "vl-new")]);
        let mut old = IdentityMap::new(Kind::Definition);
        let mut new = IdentityMap::new(Kind::Definition);
        old.insert("d-old", "/control/hub-pref".into()).unwrap();
        new.insert("d-new", "/control/hub-pref".into()).unwrap();
        maps.set_old(Phase::Definitions, old);
        maps.set_new(Phase::Definitions, new);

        let policy = json!({
            "policyName": "central",
            "policyType": "feature",
            "policyDefinition": {
                "assembly": [{
                    "definitionId": "d-old",
                    "type": "control",
                    "entries": [{ "direction": "out", "siteLists": ["sl-old"], "vpnLists": ["vl-old"] }]
                }]
            }
        });

        let out = rewrite(Phase::VsmartPolicies, "feature", &policy, &maps).unwrap();
        let assembly = &out.value["policyDefinition"]["assembly"][0];
        assert_eq!(assembly["definitionId"], "d-new");
        assert_eq!(assembly["entries"][0]["siteLists"][0], "sl-new");
        assert_eq!(assembly["entries"][0]["vpnLists"][0], "vl-new");
    }

    #[test]
    fn non_string_reference_is_malformed() {
        let maps = IdentityMaps::new();
        let mesh = json!({ "definition": { "vpnList": 42 } });
        let err = rewrite(Phase::Definitions, "/mesh", &mesh, &maps).unwrap_err();
        assert!(matches!(err, CoreError::MalformedObject { .. }));
    }
}
