#![allow(clippy::unwrap_used)]
// Import engine tests against an in-memory controller.

mod common;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::FakeController;
use vexim_core::{
    Archive, CoreError, ImportScope, ObjectOutcome, Orchestrator, Phase, UnresolvedPolicy,
};

// ── Helpers ─────────────────────────────────────────────────────────

/// A small but complete export: every phase references the one before it.
fn archive() -> Archive {
    let mut archive = Archive::new();
    archive.insert(
        "policy_list.json",
        json!({
            "/site": [{ "listId": "old-l1", "name": "branch-sites", "entries": [{ "siteId": "100" }] }],
            "/vpn": [{ "listId": "old-l2", "name": "corp-vpn", "entries": [{ "vpn": "10" }] }],
            "/class": [{ "listId": "old-l3", "name": "voice", "entries": [{ "queue": "1" }] }],
        }),
    );
    archive.insert(
        "policy_definition.json",
        json!({
            "/acl": [{
                "definitionId": "old-d1",
                "name": "block-telnet",
                "sequences": [{
                    "actions": [{ "type": "class", "parameter": { "ref": "old-l3" } }],
                }],
            }],
            "/vedgeroute": [{
                "definitionId": "old-d2",
                "name": "prefer-mpls",
                "sequences": [{
                    "match": { "entries": [{ "field": "siteList", "ref": "old-l1" }] },
                }],
            }],
        }),
    );
    archive.insert(
        "vedge_policy.json",
        json!([{
            "policyName": "edge-pol",
            "policyType": "feature",
            "policyDefinition": { "assembly": [{ "definitionId": "old-d1", "type": "acl" }] },
        }]),
    );
    archive.insert(
        "vedge_policy_id.json",
        json!({ "data": [{ "policyId": "old-p1", "policyName": "edge-pol" }] }),
    );
    archive.insert(
        "vsmart_policy.json",
        json!([{
            "policyName": "ctrl-pol",
            "policyType": "feature",
            "policyDefinition": { "assembly": [{
                "definitionId": "old-d2",
                "type": "vedgeRoute",
                "entries": [{ "siteLists": ["old-l1"], "vpnLists": ["old-l2"] }],
            }] },
        }]),
    );
    archive.insert(
        "vsmart_policy_id.json",
        json!({ "data": [{ "policyId": "old-p2", "policyName": "ctrl-pol" }] }),
    );
    archive.insert(
        "feature_template.json",
        json!([{ "templateId": "old-f1", "templateName": "system-base", "templateType": "system" }]),
    );
    archive.insert(
        "device_template.json",
        json!([{
            "templateId": "old-t1",
            "templateName": "edge-dt",
            "configType": "template",
            "policyId": "old-p1",
            "securityPolicyId": "",
            "generalTemplates": [{
                "templateId": "old-f1",
                "templateType": "system",
                "subTemplates": [],
            }],
        }]),
    );
    archive
}

fn outcomes(report: &vexim_core::ImportReport, phase: Phase) -> Vec<(String, ObjectOutcome)> {
    report
        .phase(phase)
        .unwrap()
        .objects
        .iter()
        .map(|o| (o.name.clone(), o.outcome.clone()))
        .collect()
}

// ── Full import tests ───────────────────────────────────────────────

#[tokio::test]
async fn test_import_remaps_references_across_phases() {
    let fake = FakeController::new();
    let report = Orchestrator::new(&fake)
        .import(&archive(), ImportScope::All)
        .await
        .unwrap();

    assert!(!report.has_failures());
    assert_eq!(report.phases.len(), 6);

    let class_id = fake.id_of("template/policy/list/class", "voice");
    let site_id = fake.id_of("template/policy/list/site", "branch-sites");
    let vpn_id = fake.id_of("template/policy/list/vpn", "corp-vpn");
    assert_ne!(class_id, "old-l3");

    let acl = &fake.posted_to("template/policy/definition/acl")[0];
    assert_eq!(acl["sequences"][0]["actions"][0]["parameter"]["ref"], class_id);

    let route = &fake.posted_to("template/policy/definition/vedgeroute")[0];
    assert_eq!(route["sequences"][0]["match"]["entries"][0]["ref"], site_id);
    assert_eq!(route["sequences"][0]["match"]["entries"][0]["field"], "siteList");

    let acl_id = fake.id_of("template/policy/definition/acl", "block-telnet");
    let edge = &fake.posted_to("template/policy/vedge/")[0];
    assert_eq!(edge["policyDefinition"]["assembly"][0]["definitionId"], acl_id);

    let route_id = fake.id_of("template/policy/definition/vedgeroute", "prefer-mpls");
    let ctrl = &fake.posted_to("template/policy/vsmart/")[0];
    let assembly = &ctrl["policyDefinition"]["assembly"][0];
    assert_eq!(assembly["definitionId"], route_id);
    assert_eq!(assembly["entries"][0]["siteLists"], json!([site_id]));
    assert_eq!(assembly["entries"][0]["vpnLists"], json!([vpn_id]));

    let feature_id = fake.id_of("template/feature", "system-base");
    let edge_id = fake.id_of("template/policy/vedge", "edge-pol");
    let device = &fake.posted_to("template/device/feature")[0];
    assert_eq!(device.get("templateId"), None);
    assert_eq!(device["policyId"], edge_id);
    assert_eq!(device["securityPolicyId"], "");
    assert_eq!(device["featureTemplateUidRange"], json!([]));
    assert_eq!(device["generalTemplates"][0]["templateId"], feature_id);
}

#[tokio::test]
async fn test_import_submits_phases_in_dependency_order() {
    let fake = FakeController::new();
    Orchestrator::new(&fake)
        .import(&archive(), ImportScope::All)
        .await
        .unwrap();

    let order: Vec<String> = fake.posts().into_iter().map(|(path, _)| path).collect();
    let first = |prefix: &str| order.iter().position(|p| p.starts_with(prefix)).unwrap();
    assert!(first("template/policy/list") < first("template/policy/definition"));
    assert!(first("template/policy/definition") < first("template/policy/vedge"));
    assert!(first("template/policy/vedge") < first("template/policy/vsmart"));
    assert!(first("template/policy/vsmart") < first("template/feature"));
    assert!(first("template/feature") < first("template/device"));
}

#[tokio::test]
async fn test_import_leaves_archive_untouched() {
    let fake = FakeController::new();
    let archive = archive();
    let before = archive.clone();
    Orchestrator::new(&fake)
        .import(&archive, ImportScope::All)
        .await
        .unwrap();
    assert_eq!(archive, before);
}

// ── Duplicate tests ─────────────────────────────────────────────────

#[tokio::test]
async fn test_duplicate_resolves_to_existing_object() {
    let fake = FakeController::new().with_collection(
        "template/policy/list/site",
        vec![json!({ "listId": "live-9", "name": "branch-sites" })],
    );
    let report = Orchestrator::new(&fake)
        .import(&archive(), ImportScope::All)
        .await
        .unwrap();

    let lists = outcomes(&report, Phase::Lists);
    assert!(lists.iter().any(|(name, outcome)| name == "branch-sites"
        && matches!(outcome, ObjectOutcome::Duplicate { .. })));
    assert_eq!(report.phase(Phase::Lists).unwrap().duplicates(), 1);

    let route = &fake.posted_to("template/policy/definition/vedgeroute")[0];
    assert_eq!(route["sequences"][0]["match"]["entries"][0]["ref"], "live-9");
}

// ── Failure policy tests ────────────────────────────────────────────

fn archive_with_dangling_reference() -> Archive {
    let mut archive = archive();
    let mut defs = archive.configuration("policy_definition.json").unwrap().clone();
    defs["/acl"].as_array_mut().unwrap().push(json!({
        "definitionId": "old-d9",
        "name": "dangling",
        "sequences": [{ "actions": [{ "parameter": { "ref": "old-gone" } }] }],
    }));
    archive.insert("policy_definition.json", defs);
    archive
}

#[tokio::test]
async fn test_unresolved_reference_aborts_by_default() {
    let fake = FakeController::new();
    let err = Orchestrator::new(&fake)
        .import(&archive_with_dangling_reference(), ImportScope::All)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CoreError::UnresolvedReference { target: Phase::Lists, ref native_id, .. } if native_id == "old-gone"
    ));
    assert!(fake.posted_to("template/policy/vedge/").is_empty());
}

#[tokio::test]
async fn test_unresolved_reference_skipped_on_request() {
    let fake = FakeController::new();
    let report = Orchestrator::new(&fake)
        .on_unresolved(UnresolvedPolicy::Skip)
        .import(&archive_with_dangling_reference(), ImportScope::All)
        .await
        .unwrap();

    assert!(report.has_failures());
    let defs = report.phase(Phase::Definitions).unwrap();
    assert_eq!(defs.failed(), 1);
    assert_eq!(defs.created(), 2);

    let acl_posts = fake.posted_to("template/policy/definition/acl");
    assert_eq!(acl_posts.len(), 1);
    assert_eq!(acl_posts[0]["name"], "block-telnet");
    assert_eq!(fake.posted_to("template/device/feature").len(), 1);
}

#[tokio::test]
async fn test_controller_rejection_follows_policy() {
    let fake = FakeController::new().rejecting("system-base");
    let err = Orchestrator::new(&fake)
        .import(&archive(), ImportScope::All)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Api { status: Some(400), .. }));

    let fake = FakeController::new().rejecting("corp-vpn");
    let report = Orchestrator::new(&fake)
        .on_unresolved(UnresolvedPolicy::Skip)
        .import(&archive(), ImportScope::All)
        .await
        .unwrap();
    assert_eq!(report.phase(Phase::Lists).unwrap().failed(), 1);
    // The vSmart policy points at the list that was never created.
    assert_eq!(report.phase(Phase::VsmartPolicies).unwrap().failed(), 1);
}

// ── Scope and skip tests ────────────────────────────────────────────

#[tokio::test]
async fn test_templates_scope_clears_policy_reference() {
    let fake = FakeController::new();
    let report = Orchestrator::new(&fake)
        .import(&archive(), ImportScope::Templates)
        .await
        .unwrap();

    assert_eq!(report.phases.len(), 2);
    assert!(fake.posted_to("template/policy/list/site").is_empty());

    let device = &fake.posted_to("template/device/feature")[0];
    assert_eq!(device["policyId"], "");
    assert_eq!(
        device["generalTemplates"][0]["templateId"],
        fake.id_of("template/feature", "system-base")
    );
}

#[tokio::test]
async fn test_unsupported_types_are_skipped() {
    let mut archive = archive();
    archive.insert(
        "vsmart_policy.json",
        json!([{ "policyName": "legacy", "policyType": "assembly", "policyDefinition": {} }]),
    );
    archive.insert(
        "device_template.json",
        json!([{ "templateId": "old-t2", "templateName": "odd", "configType": "unknown" }]),
    );

    let fake = FakeController::new();
    let report = Orchestrator::new(&fake)
        .import(&archive, ImportScope::All)
        .await
        .unwrap();

    assert_eq!(report.phase(Phase::VsmartPolicies).unwrap().skipped(), 1);
    assert_eq!(report.phase(Phase::DeviceTemplates).unwrap().skipped(), 1);
    assert!(fake.posted_to("template/policy/vsmart/").is_empty());
}

#[tokio::test]
async fn test_unknown_subtype_submitted_unmodified() {
    let mut archive = archive();
    let mut defs = archive.configuration("policy_definition.json").unwrap().clone();
    let raw = json!({
        "definitionId": "old-d7",
        "name": "v6-filter",
        "sequences": [{ "actions": [{ "parameter": { "ref": "old-whatever" } }] }],
    });
    defs["/aclv6"] = json!([raw.clone()]);
    archive.insert("policy_definition.json", defs);

    let fake = FakeController::new();
    let report = Orchestrator::new(&fake)
        .import(&archive, ImportScope::Policies)
        .await
        .unwrap();

    let defs = report.phase(Phase::Definitions).unwrap();
    assert_eq!(defs.unmapped(), 1);
    assert_eq!(fake.posted_to("template/policy/definition/aclv6"), vec![raw]);
}

#[tokio::test]
async fn test_device_template_without_id_still_imports() {
    let mut archive = archive();
    archive.insert(
        "device_template.json",
        json!([
            {
                "templateName": "branch",
                "configType": "file",
                "templateConfiguration": "system\n host-name branch\n",
            },
            {
                "templateName": "branch-ft",
                "configType": "template",
                "generalTemplates": [{ "templateId": "old-f1", "templateType": "system" }],
            },
        ]),
    );

    let fake = FakeController::new();
    let report = Orchestrator::new(&fake)
        .on_unresolved(UnresolvedPolicy::Skip)
        .import(&archive, ImportScope::All)
        .await
        .unwrap();

    let cli = fake.posted_to("template/device/cli");
    assert_eq!(cli.len(), 1);
    assert_eq!(cli[0]["templateName"], "branch");
    assert_eq!(fake.posted_to("template/device/feature").len(), 1);
    assert_eq!(report.phase(Phase::DeviceTemplates).unwrap().objects.len(), 2);
}

#[tokio::test]
async fn test_missing_documents_import_nothing() {
    let fake = FakeController::new();
    let report = Orchestrator::new(&fake)
        .import(&Archive::new(), ImportScope::All)
        .await
        .unwrap();

    assert!(fake.posts().is_empty());
    assert!(report.phases.iter().all(|p| p.objects.is_empty()));
}
