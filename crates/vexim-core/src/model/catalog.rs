// REST sub-paths under `template/policy/list` and `template/policy/definition`.
// Order is the export/import order within the phase.

pub const LIST_SUBTYPES: &[&str] = &[
    "/community",
    "/localdomain",
    "/dataipv6prefix",
    "/ipv6prefix",
    "/tloc",
    "/aspath",
    "/zone",
    "/color",
    "/sla",
    "/localapp",
    "/app",
    "/mirror",
    "/dataprefix",
    "/extcommunity",
    "/site",
    "/prefix",
    "/umbrelladata",
    "/class",
    "/ipssignature",
    "/urlblacklist",
    "/policer",
    "/urlwhitelist",
    "/vpn",
];

pub const DEFINITION_SUBTYPES: &[&str] = &[
    "/cflowd",
    "/dnssecurity",
    "/advancedMalwareProtection",
    "/control",
    "/intrusionprevention",
    "/vedgeroute",
    "/hubandspoke",
    "/acl",
    "/vpnmembershipgroup",
    "/approute",
    "/zonebasedfw",
    "/urlfiltering",
    "/qosmap",
    "/aclv6",
    "/mesh",
    "/data",
    "/rewriterule",
];
