//! Export/import engine for Cisco SD-WAN vManage configuration.
//!
//! Configuration objects on a vManage controller reference each other by
//! controller-assigned ids, which differ on every controller. This crate
//! moves a configuration between controllers by keying objects on a stable
//! natural key instead:
//!
//! - **[`Archive`]** -- The gzip-compressed tar archive of JSON documents an
//!   export writes and an import reads.
//!
//! - **[`IdentityMap`]** -- Bidirectional `nativeId <-> naturalKey` map per
//!   phase, built from the archive (old) or the live inventory (new).
//!
//! - **[`rewrite`]** -- Table-driven reference rewriting. Every foreign id in
//!   an object is translated old id -> natural key -> new id on a copy.
//!
//! - **[`Orchestrator`]** -- Walks the [`Phase`]s in dependency order, one
//!   request at a time, so each phase can reference objects created by the
//!   phases before it.
//!
//! - **[`Lifecycle`]** -- Template detach, policy deactivation, certificate
//!   validity, push to controllers, bulk delete and user management.
//!
//! - **[`Controller`]** -- Authenticated session facade handing out the two
//!   views above over the [`ControllerApi`] seam.

pub mod api;
pub mod archive;
pub mod config;
pub mod controller;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod model;
pub mod orchestrator;
pub mod report;
pub mod rewrite;

// ── Primary re-exports ──────────────────────────────────────────────
pub use api::ControllerApi;
pub use archive::{Archive, DEFAULT_ARCHIVE};
pub use config::{ControllerConfig, Readiness, TlsVerification};
pub use controller::Controller;
pub use error::CoreError;
pub use identity::{IdentityMap, IdentityMaps};
pub use lifecycle::{CleanReport, CleanScope, DeleteTarget, Lifecycle, NewUser, Validity};
pub use model::{Kind, Phase, natural_key};
pub use orchestrator::{Export, ImportScope, Orchestrator, UnresolvedPolicy};
pub use report::{
    DeleteReport, ExportedPhase, ImportReport, ObjectOutcome, ObjectReport, PhaseReport,
};
