// ── Identity maps ──
//
// Bidirectional nativeId <-> naturalKey tables. The old side is rebuilt
// from the archive, the new side from the target controller's inventory
// once a phase's creation loop has drained.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::archive::Archive;
use crate::error::CoreError;
use crate::model::{Kind, Phase, natural_key};

/// nativeId <-> naturalKey for one kind on one controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityMap {
    kind: Kind,
    by_native: IndexMap<String, String>,
    #[serde(skip)]
    by_key: IndexMap<String, String>,
}

impl IdentityMap {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            by_native: IndexMap::new(),
            by_key: IndexMap::new(),
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Record `native_id -> natural_key`.
    ///
    /// A natural key already claimed by a different native id is a
    /// `NaturalKeyCollision`; remapping by name would be ambiguous.
    pub fn insert(&mut self, native_id: &str, natural_key: String) -> Result<(), CoreError> {
        if let Some(existing) = self.by_key.get(&natural_key) {
            if existing != native_id {
                return Err(CoreError::NaturalKeyCollision {
                    kind: self.kind,
                    natural_key,
                    first: existing.clone(),
                    second: native_id.to_owned(),
                });
            }
            return Ok(());
        }
        self.by_native
            .insert(native_id.to_owned(), natural_key.clone());
        self.by_key.insert(natural_key, native_id.to_owned());
        Ok(())
    }

    pub fn natural_key(&self, native_id: &str) -> Option<&str> {
        self.by_native.get(native_id).map(String::as_str)
    }

    pub fn native_id(&self, natural_key: &str) -> Option<&str> {
        self.by_key.get(natural_key).map(String::as_str)
    }

    /// `(nativeId, naturalKey)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_native
            .iter()
            .map(|(id, key)| (id.as_str(), key.as_str()))
    }

    pub fn len(&self) -> usize {
        self.by_native.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_native.is_empty()
    }

    /// Add every object of a `data[]`-style array.
    fn extend(
        &mut self,
        phase: Phase,
        subtype: Option<&str>,
        objects: &[Value],
    ) -> Result<(), CoreError> {
        for object in objects {
            let (id, name) = identity_of(phase, object)?;
            self.insert(id, natural_key(subtype, name))?;
        }
        Ok(())
    }
}

/// Extract `(nativeId, name)` using the phase's id and name fields.
pub(crate) fn identity_of(phase: Phase, object: &Value) -> Result<(&str, &str), CoreError> {
    let field = |name: &str| {
        object[name]
            .as_str()
            .ok_or_else(|| CoreError::MalformedObject {
                phase,
                message: format!("missing string field '{name}'"),
            })
    };
    Ok((field(phase.id_field())?, field(phase.name_field())?))
}

fn as_objects(value: Option<&Value>) -> &[Value] {
    value.and_then(Value::as_array).map_or(&[], Vec::as_slice)
}

/// Rebuild the nativeId -> naturalKey map captured at export time.
///
/// Lists and definitions are keyed per subtype from the objects themselves.
/// Policy documents do not carry their ids, so the policy maps come from
/// the `*_policy_id.json` inventory snapshot. A missing document yields an
/// empty map.
pub fn build_old(phase: Phase, archive: &Archive) -> Result<IdentityMap, CoreError> {
    let mut map = IdentityMap::new(phase.kind());

    match phase {
        Phase::Lists | Phase::Definitions => {
            if let Some(Value::Object(groups)) = archive.configuration(phase.document()) {
                for (subtype, objects) in groups {
                    map.extend(phase, Some(subtype), as_objects(Some(objects)))?;
                }
            }
        }
        Phase::VedgePolicies | Phase::VsmartPolicies => {
            let snapshot = phase
                .id_document()
                .and_then(|doc| archive.configuration(doc))
                .and_then(|c| c.get("data"));
            map.extend(phase, None, as_objects(snapshot))?;
        }
        Phase::FeatureTemplates | Phase::DeviceTemplates => {
            map.extend(phase, None, as_objects(archive.configuration(phase.document())))?;
        }
    }

    Ok(map)
}

/// Build the naturalKey -> nativeId map from live inventory listings.
///
/// Each listing is a raw `GET` response (`{"data": [...]}`) paired with the
/// subtype it was fetched for (`None` for unsplit phases).
pub fn build_new<'a>(
    phase: Phase,
    listings: impl IntoIterator<Item = (Option<&'a str>, &'a Value)>,
) -> Result<IdentityMap, CoreError> {
    let mut map = IdentityMap::new(phase.kind());
    for (subtype, listing) in listings {
        map.extend(phase, subtype, as_objects(listing.get("data")))?;
    }
    Ok(map)
}

/// Carry `native_id` from the old controller to the new one.
///
/// Fails when the id is unknown to the archive, or when its natural key was
/// never created on the target.
pub fn resolve(
    old: &IdentityMap,
    new: &IdentityMap,
    native_id: &str,
    target: Phase,
) -> Result<String, CoreError> {
    let key = old
        .natural_key(native_id)
        .ok_or_else(|| CoreError::UnresolvedReference {
            target,
            native_id: native_id.to_owned(),
            natural_key: None,
        })?;
    new.native_id(key)
        .map(str::to_owned)
        .ok_or_else(|| CoreError::UnresolvedReference {
            target,
            native_id: native_id.to_owned(),
            natural_key: Some(key.to_owned()),
        })
}

// ── Per-run map set ──────────────────────────────────────────────────

/// Old and new maps for one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapPair {
    pub old: IdentityMap,
    pub new: IdentityMap,
}

impl MapPair {
    pub fn empty(phase: Phase) -> Self {
        Self {
            old: IdentityMap::new(phase.kind()),
            new: IdentityMap::new(phase.kind()),
        }
    }
}

/// All map pairs for one import run, owned by the orchestrator.
///
/// Every phase starts with an empty pair, so resolving against a phase that
/// has not run yet fails instead of silently passing ids through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityMaps {
    pairs: IndexMap<Phase, MapPair>,
}

impl Default for IdentityMaps {
    fn default() -> Self {
        Self {
            pairs: Phase::ORDER
                .iter()
                .map(|&p| (p, MapPair::empty(p)))
                .collect(),
        }
    }
}

impl IdentityMaps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pair(&self, phase: Phase) -> &MapPair {
        // Populated for every phase in `default()`.
        &self.pairs[&phase]
    }

    pub fn set_old(&mut self, phase: Phase, map: IdentityMap) {
        if let Some(pair) = self.pairs.get_mut(&phase) {
            pair.old = map;
        }
    }

    pub fn set_new(&mut self, phase: Phase, map: IdentityMap) {
        if let Some(pair) = self.pairs.get_mut(&phase) {
            pair.new = map;
        }
    }

    /// Resolve through `target`'s pair.
    pub fn resolve(&self, target: Phase, native_id: &str) -> Result<String, CoreError> {
        let pair = self.pair(target);
        resolve(&pair.old, &pair.new, native_id, target)
    }
}
