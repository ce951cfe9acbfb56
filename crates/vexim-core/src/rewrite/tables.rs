// ── Reference tables ──
//
// Which fields of which object hold foreign ids, per (phase, subtype).
// Adding a subtype means adding a row here, not new control flow.
//
// `MaybeEach` covers `parameter`, which the controller emits either as a
// list of objects or as a single object depending on the action type.

use crate::model::Phase;

use super::{ReferenceField, ReferenceTable, Step};

use Step::{Each, Field, MaybeEach};

const fn list(path: &'static [Step]) -> ReferenceField {
    ReferenceField {
        path,
        target: Phase::Lists,
    }
}

const fn definition(path: &'static [Step]) -> ReferenceField {
    ReferenceField {
        path,
        target: Phase::Definitions,
    }
}

// ── Shared sequence shapes ───────────────────────────────────────────

const MATCH_REF: &[Step] = &[
    Field("sequences"),
    Each,
    Field("match"),
    Field("entries"),
    Each,
    Field("ref"),
];

const ACTION_REF: &[Step] = &[
    Field("sequences"),
    Each,
    Field("actions"),
    Each,
    Field("parameter"),
    MaybeEach,
    Field("ref"),
];

// ── Definitions ──────────────────────────────────────────────────────

const CONTROL: &[ReferenceField] = &[list(MATCH_REF), list(ACTION_REF)];

const ACL: &[ReferenceField] = &[list(ACTION_REF)];

const ZONE_BASED_FW: &[ReferenceField] = &[
    list(&[
        Field("definition"),
        Field("sequences"),
        Each,
        Field("match"),
        Field("entries"),
        Each,
        Field("ref"),
    ]),
    list(&[
        Field("definition"),
        Field("sequences"),
        Each,
        Field("actions"),
        Each,
        Field("parameter"),
        MaybeEach,
        Field("ref"),
    ]),
    list(&[
        Field("definition"),
        Field("entries"),
        Each,
        Field("sourceZone"),
    ]),
    list(&[
        Field("definition"),
        Field("entries"),
        Each,
        Field("destinationZone"),
    ]),
];

const QOS_MAP: &[ReferenceField] = &[list(&[
    Field("definition"),
    Field("qosSchedulers"),
    Each,
    Field("classMapRef"),
])];

const DATA: &[ReferenceField] = &[
    list(MATCH_REF),
    list(ACTION_REF),
    list(&[
        Field("sequences"),
        Each,
        Field("actions"),
        Each,
        Field("parameter"),
        MaybeEach,
        Field("value"),
        Field("tlocList"),
        Field("ref"),
    ]),
];

const VEDGE_ROUTE: &[ReferenceField] = &[list(MATCH_REF)];

const HUB_AND_SPOKE: &[ReferenceField] = &[
    list(&[Field("definition"), Field("vpnList")]),
    list(&[
        Field("definition"),
        Field("subDefinitions"),
        Each,
        Field("tlocList"),
    ]),
    list(&[
        Field("definition"),
        Field("subDefinitions"),
        Each,
        Field("spokes"),
        Each,
        Field("siteList"),
    ]),
    list(&[
        Field("definition"),
        Field("subDefinitions"),
        Each,
        Field("spokes"),
        Each,
        Field("hubs"),
        Each,
        Field("siteList"),
    ]),
    list(&[
        Field("definition"),
        Field("subDefinitions"),
        Each,
        Field("spokes"),
        Each,
        Field("hubs"),
        Each,
        Field("prefixLists"),
        Each,
    ]),
];

const VPN_MEMBERSHIP: &[ReferenceField] = &[
    list(&[Field("definition"), Field("sites"), Each, Field("siteList")]),
    list(&[
        Field("definition"),
        Field("sites"),
        Each,
        Field("vpnList"),
        Each,
    ]),
];

const APP_ROUTE: &[ReferenceField] = &[
    list(&[Field("defaultAction"), Field("ref")]),
    list(MATCH_REF),
    list(ACTION_REF),
];

const MESH: &[ReferenceField] = &[
    list(&[Field("definition"), Field("vpnList")]),
    list(&[
        Field("definition"),
        Field("regions"),
        Each,
        Field("siteLists"),
        Each,
    ]),
];

const URL_FILTERING: &[ReferenceField] = &[
    list(&[Field("definition"), Field("urlWhiteList"), Field("ref")]),
    list(&[Field("definition"), Field("urlBlackList"), Field("ref")]),
];

const INTRUSION_PREVENTION: &[ReferenceField] = &[list(&[
    Field("definition"),
    Field("signatureWhiteList"),
    Field("ref"),
])];

const DNS_SECURITY: &[ReferenceField] = &[
    list(&[
        Field("definition"),
        Field("localDomainBypassList"),
        Field("ref"),
    ]),
    list(&[Field("definition"), Field("umbrellaData"), Field("ref")]),
];

// ── Policies ─────────────────────────────────────────────────────────

const ASSEMBLY_DEFINITION: &[Step] = &[
    Field("policyDefinition"),
    Field("assembly"),
    Each,
    Field("definitionId"),
];

const VEDGE_FEATURE: &[ReferenceField] = &[definition(ASSEMBLY_DEFINITION)];

// Definition ids first, then the list ids nested in assembly entries.
const VSMART_FEATURE: &[ReferenceField] = &[
    definition(ASSEMBLY_DEFINITION),
    list(&[
        Field("policyDefinition"),
        Field("assembly"),
        Each,
        Field("entries"),
        Each,
        Field("siteLists"),
        Each,
    ]),
    list(&[
        Field("policyDefinition"),
        Field("assembly"),
        Each,
        Field("entries"),
        Each,
        Field("vpnLists"),
        Each,
    ]),
];

const fn table(
    phase: Phase,
    subtype: &'static str,
    fields: &'static [ReferenceField],
) -> ReferenceTable {
    ReferenceTable {
        phase,
        subtype,
        fields,
    }
}

/// Every known table. Definition subtypes missing here (`/aclv6`,
/// `/rewriterule`, `/advancedMalwareProtection`) have unmapped reference
/// shapes and go through unmodified.
pub static TABLES: &[ReferenceTable] = &[
    table(Phase::Definitions, "/cflowd", &[]),
    table(Phase::Definitions, "/control", CONTROL),
    table(Phase::Definitions, "/acl", ACL),
    table(Phase::Definitions, "/zonebasedfw", ZONE_BASED_FW),
    table(Phase::Definitions, "/qosmap", QOS_MAP),
    table(Phase::Definitions, "/data", DATA),
    table(Phase::Definitions, "/vedgeroute", VEDGE_ROUTE),
    table(Phase::Definitions, "/hubandspoke", HUB_AND_SPOKE),
    table(Phase::Definitions, "/vpnmembershipgroup", VPN_MEMBERSHIP),
    table(Phase::Definitions, "/approute", APP_ROUTE),
    table(Phase::Definitions, "/mesh", MESH),
    table(Phase::Definitions, "/urlfiltering", URL_FILTERING),
    table(Phase::Definitions, "/intrusionprevention", INTRUSION_PREVENTION),
    table(Phase::Definitions, "/dnssecurity", DNS_SECURITY),
    table(Phase::VedgePolicies, "feature", VEDGE_FEATURE),
    table(Phase::VedgePolicies, "cli", &[]),
    table(Phase::VsmartPolicies, "feature", VSMART_FEATURE),
    table(Phase::VsmartPolicies, "cli", &[]),
];

/// Look up the table for `(phase, subtype)`.
pub fn lookup(phase: Phase, subtype: &str) -> Option<&'static ReferenceTable> {
    TABLES
        .iter()
        .find(|t| t.phase == phase && t.subtype == subtype)
}
