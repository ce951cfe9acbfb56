// ── Phase orchestrator ──
//
// Import walks the phases in dependency order. Each phase rewrites its
// objects with the identity maps of earlier phases, submits them one at a
// time, and only then reads the controller's inventory to build its own
// new map. Export is the mirror image without rewriting.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use strum::{Display, EnumString};
use tracing::{debug, info, warn};
use vexim_api::PostOutcome;

use crate::api::{ControllerApi, data_of, list_or_empty};
use crate::archive::Archive;
use crate::error::CoreError;
use crate::identity::{self, IdentityMap, IdentityMaps, identity_of};
use crate::model::{Phase, natural_key};
use crate::report::{ExportedPhase, ImportReport, ObjectOutcome, ObjectReport, PhaseReport};
use crate::rewrite::{self, TableStatus, rewrite_device_template};

/// Which part of an archive to import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum ImportScope {
    /// Everything, lists through device templates.
    #[default]
    All,
    /// Lists, definitions and vEdge/vSmart policies.
    Policies,
    /// Feature and device templates. Device templates lose their policy
    /// references, since no policy maps exist in this scope.
    Templates,
}

impl ImportScope {
    pub fn phases(self) -> &'static [Phase] {
        match self {
            Self::All => &Phase::ORDER,
            Self::Policies => &[
                Phase::Lists,
                Phase::Definitions,
                Phase::VedgePolicies,
                Phase::VsmartPolicies,
            ],
            Self::Templates => &[Phase::FeatureTemplates, Phase::DeviceTemplates],
        }
    }
}

/// What to do with an object whose references cannot be carried over, or
/// that the controller rejects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnresolvedPolicy {
    /// Stop the run at the first such object.
    #[default]
    Abort,
    /// Record the object as failed and continue with the next one.
    Skip,
}

/// Export result: the archive plus the id maps captured from the live
/// inventory while exporting.
#[derive(Debug, Clone)]
pub struct Export {
    pub archive: Archive,
    pub phases: Vec<ExportedPhase>,
    pub maps: IndexMap<Phase, IdentityMap>,
}

/// One archived object ready for its phase loop.
struct Pending<'a> {
    subtype: Option<&'a str>,
    object: &'a Value,
}

/// A prepared submission, or the reason there is none.
enum Plan {
    Submit {
        path: String,
        body: Value,
        unmapped: bool,
    },
    Skip(String),
}

pub struct Orchestrator<'a> {
    api: &'a dyn ControllerApi,
    on_unresolved: UnresolvedPolicy,
}

impl<'a> Orchestrator<'a> {
    pub fn new(api: &'a dyn ControllerApi) -> Self {
        Self {
            api,
            on_unresolved: UnresolvedPolicy::default(),
        }
    }

    pub fn on_unresolved(mut self, policy: UnresolvedPolicy) -> Self {
        self.on_unresolved = policy;
        self
    }

    // ── Import ───────────────────────────────────────────────────────

    /// Import `scope` from `archive`, strictly one request at a time.
    pub async fn import(
        &self,
        archive: &Archive,
        scope: ImportScope,
    ) -> Result<ImportReport, CoreError> {
        let mut maps = IdentityMaps::new();
        let mut phases = Vec::new();

        for &phase in scope.phases() {
            info!(%phase, "importing");
            if phase.is_referenced() {
                maps.set_old(phase, identity::build_old(phase, archive)?);
            }

            let pending = pending_objects(phase, archive);
            let mut report = PhaseReport::new(phase);
            for item in &pending {
                report.push(self.import_object(phase, item, &maps).await?);
            }

            // Only after the loop has drained: objects created above must be
            // in the inventory.
            if phase.is_referenced() {
                let new_map = self.inventory_map(phase, &pending).await?;
                debug!(%phase, entries = new_map.len(), "built new identity map");
                maps.set_new(phase, new_map);
            }

            info!(
                %phase,
                created = report.created(),
                duplicates = report.duplicates(),
                skipped = report.skipped(),
                failed = report.failed(),
                "phase complete"
            );
            phases.push(report);
        }

        Ok(ImportReport { phases })
    }

    async fn import_object(
        &self,
        phase: Phase,
        item: &Pending<'_>,
        maps: &IdentityMaps,
    ) -> Result<ObjectReport, CoreError> {
        let name = item.object[phase.name_field()]
            .as_str()
            .unwrap_or("<unnamed>")
            .to_owned();
        let report = |outcome, unmapped| ObjectReport {
            subtype: item.subtype.map(str::to_owned),
            name: name.clone(),
            outcome,
            unmapped,
        };

        let plan = match plan_submission(phase, item, maps) {
            Ok(plan) => plan,
            Err(e) => return self.object_failed(phase, &name, e).map(|o| report(o, false)),
        };

        let (path, body, unmapped) = match plan {
            Plan::Submit {
                path,
                body,
                unmapped,
            } => (path, body, unmapped),
            Plan::Skip(reason) => {
                info!(%phase, %name, %reason, "skipped");
                return Ok(report(ObjectOutcome::Skipped { reason }, false));
            }
        };

        if unmapped {
            warn!(
                %phase,
                %name,
                subtype = item.subtype.unwrap_or_default(),
                "reference rewriting not implemented for this subtype, submitting unmodified"
            );
        }

        match self.api.post(&path, &body).await {
            Ok(PostOutcome::Accepted(_)) => {
                info!(%phase, %name, "created");
                Ok(report(ObjectOutcome::Created, unmapped))
            }
            Ok(PostOutcome::Duplicate(details)) => {
                warn!(%phase, %name, %details, "already exists");
                Ok(report(ObjectOutcome::Duplicate { details }, unmapped))
            }
            Err(e @ vexim_api::Error::Api { .. }) => self
                .object_failed(phase, &name, e.into())
                .map(|o| report(o, unmapped)),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply the unresolved-object policy to a per-object failure.
    fn object_failed(
        &self,
        phase: Phase,
        name: &str,
        error: CoreError,
    ) -> Result<ObjectOutcome, CoreError> {
        let per_object = matches!(
            error,
            CoreError::UnresolvedReference { .. }
                | CoreError::MalformedObject { .. }
                | CoreError::Api { .. }
        );
        if !per_object || self.on_unresolved == UnresolvedPolicy::Abort {
            return Err(error);
        }
        warn!(%phase, %name, error = %error, "import failed, continuing");
        Ok(ObjectOutcome::Failed {
            error: error.to_string(),
        })
    }

    /// Live inventory of `phase`, as a naturalKey -> nativeId map.
    async fn inventory_map(
        &self,
        phase: Phase,
        pending: &[Pending<'_>],
    ) -> Result<IdentityMap, CoreError> {
        let mut listings = Vec::new();
        if phase.is_subtyped() {
            // Catalog subtypes, plus any the archive carries beyond them.
            let mut subtypes: Vec<&str> = phase.subtypes().to_vec();
            for sub in pending.iter().filter_map(|p| p.subtype) {
                if !subtypes.contains(&sub) {
                    subtypes.push(sub);
                }
            }
            for sub in subtypes {
                let path = format!("{}{sub}", phase.mount());
                listings.push((Some(sub), list_or_empty(self.api, &path).await?));
            }
        } else {
            listings.push((None, list_or_empty(self.api, phase.mount()).await?));
        }

        identity::build_new(phase, listings.iter().map(|(s, l)| (*s, l)))
    }

    // ── Export ───────────────────────────────────────────────────────

    /// Read every phase's objects from the controller into an archive.
    pub async fn export(&self) -> Result<Export, CoreError> {
        let mut archive = Archive::new();
        let mut phases = Vec::new();
        let mut maps = IndexMap::new();

        for phase in Phase::ORDER {
            info!(%phase, "exporting");
            let mut map = IdentityMap::new(phase.kind());
            let mut exported = ExportedPhase {
                phase,
                objects: 0,
                missing_subtypes: Vec::new(),
            };

            if phase.is_subtyped() {
                let mut groups = Map::new();
                for &sub in phase.subtypes() {
                    let path = format!("{}{sub}", phase.mount());
                    let Some(listing) = self.listing(&path).await? else {
                        info!(%phase, subtype = sub, "not present, skipping");
                        exported.missing_subtypes.push(sub.to_owned());
                        continue;
                    };
                    let detail = format!("{}{sub}", phase.detail_mount());
                    let objects = self
                        .fetch_objects(phase, Some(sub), &listing, &detail, &mut map)
                        .await?;
                    exported.objects += objects.len();
                    groups.insert(sub.to_owned(), Value::Array(objects));
                }
                archive.insert(phase.document(), Value::Object(groups));
            } else {
                let listing = match self.listing(phase.mount()).await? {
                    Some(listing) => listing,
                    None => {
                        info!(%phase, "not present, skipping");
                        Value::Null
                    }
                };
                let objects = self
                    .fetch_objects(phase, None, &listing, phase.detail_mount(), &mut map)
                    .await?;
                exported.objects += objects.len();
                archive.insert(phase.document(), Value::Array(objects));
                if let Some(doc) = phase.id_document() {
                    archive.insert(doc, retain_exported(phase, listing, &map));
                }
            }

            info!(%phase, objects = exported.objects, "exported");
            maps.insert(phase, map);
            phases.push(exported);
        }

        Ok(Export {
            archive,
            phases,
            maps,
        })
    }

    /// `GET path`, or `None` when the controller rejects the listing.
    async fn listing(&self, path: &str) -> Result<Option<Value>, CoreError> {
        match self.api.get(path).await {
            Ok(listing) => Ok(Some(listing)),
            Err(vexim_api::Error::Api { status, details }) => {
                debug!(%path, status, %details, "listing unavailable");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch the full document of every object in `listing`, recording the id
    /// of each non-empty one in `map`. Empty documents are dropped along with
    /// their id.
    async fn fetch_objects(
        &self,
        phase: Phase,
        subtype: Option<&str>,
        listing: &Value,
        detail_mount: &str,
        map: &mut IdentityMap,
    ) -> Result<Vec<Value>, CoreError> {
        let mut objects = Vec::new();
        for entry in data_of(listing) {
            let (id, name) = identity_of(phase, entry)?;

            debug!(%phase, id, "exporting");
            let object = self.api.get(&format!("{detail_mount}/{id}")).await?;
            if is_empty_document(&object) {
                warn!(%phase, id, name, "empty document, not exported");
                continue;
            }
            map.insert(id, natural_key(subtype, name))?;
            objects.push(object);
        }
        Ok(objects)
    }
}

/// The id listing restricted to the objects `map` recorded, so the snapshot
/// and the exported documents describe the same set.
fn retain_exported(phase: Phase, mut listing: Value, map: &IdentityMap) -> Value {
    if let Some(Value::Array(data)) = listing.get_mut("data") {
        data.retain(|entry| {
            identity_of(phase, entry).is_ok_and(|(id, _)| map.natural_key(id).is_some())
        });
    }
    listing
}

fn is_empty_document(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(m) => m.is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

/// Objects of `phase` in archive order. A missing document means nothing to
/// import.
fn pending_objects(phase: Phase, archive: &Archive) -> Vec<Pending<'_>> {
    let Some(config) = archive.configuration(phase.document()) else {
        warn!(%phase, document = phase.document(), "not in archive, nothing to import");
        return Vec::new();
    };

    match config {
        Value::Object(groups) if phase.is_subtyped() => groups
            .iter()
            .flat_map(|(sub, objects)| {
                objects
                    .as_array()
                    .into_iter()
                    .flatten()
                    .map(move |object| Pending {
                        subtype: Some(sub.as_str()),
                        object,
                    })
            })
            .collect(),
        Value::Array(objects) if !phase.is_subtyped() => objects
            .iter()
            .map(|object| Pending {
                subtype: None,
                object,
            })
            .collect(),
        _ => {
            warn!(%phase, "unexpected document shape, nothing to import");
            Vec::new()
        }
    }
}

/// Rewrite one object and decide where it goes.
fn plan_submission(
    phase: Phase,
    item: &Pending<'_>,
    maps: &IdentityMaps,
) -> Result<Plan, CoreError> {
    let subtype = item.subtype.unwrap_or_default();
    match phase {
        Phase::Lists => Ok(Plan::Submit {
            path: format!("{}{subtype}", phase.mount()),
            body: item.object.clone(),
            unmapped: false,
        }),
        Phase::Definitions => {
            let out = rewrite::rewrite(phase, subtype, item.object, maps)?;
            Ok(Plan::Submit {
                path: format!("{}{subtype}", phase.mount()),
                body: out.value,
                unmapped: out.table == TableStatus::Unknown,
            })
        }
        Phase::VedgePolicies | Phase::VsmartPolicies => {
            let policy_type = item.object["policyType"].as_str().unwrap_or_default();
            if !matches!(policy_type, "feature" | "cli") {
                return Ok(Plan::Skip(format!(
                    "policyType '{policy_type}' is not importable"
                )));
            }
            let out = rewrite::rewrite(phase, policy_type, item.object, maps)?;
            Ok(Plan::Submit {
                path: format!("{}/", phase.mount()),
                body: out.value,
                unmapped: false,
            })
        }
        Phase::FeatureTemplates => Ok(Plan::Submit {
            path: format!("{}/", phase.mount()),
            body: item.object.clone(),
            unmapped: false,
        }),
        Phase::DeviceTemplates => match rewrite_device_template(item.object, maps)? {
            Some((route, body)) => Ok(Plan::Submit {
                path: route.endpoint().to_owned(),
                body,
                unmapped: false,
            }),
            None => {
                let config_type = item.object["configType"].as_str().unwrap_or("<none>");
                Ok(Plan::Skip(format!("configType '{config_type}' is not importable")))
            }
        },
    }
}
