// ── Lifecycle operations ──
//
// Bulk operations around an import: detaching device templates,
// deactivating policies, certificate validity, pushing to controllers,
// deleting configuration and managing users.
//
// Actions that kick off controller-side work are followed by a readiness
// wait: poll the action's status when the controller hands back an action
// id, otherwise poll the observable condition. The configured timeout
// bounds the wait; running out of time is logged, not fatal. A push that
// returns no action id has no condition to poll and waits the fixed push
// cooldown instead.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{Value, json};
use strum::{Display, EnumString};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};
use vexim_api::{DeleteOutcome, PostOutcome};

use crate::api::{ControllerApi, data_of, list_or_empty};
use crate::config::Readiness;
use crate::error::CoreError;
use crate::model::{DEFINITION_SUBTYPES, LIST_SUBTYPES};
use crate::report::DeleteReport;

const DEVICE_TEMPLATES: &str = "template/device";
const DETACH: &str = "template/config/device/mode/cli";
const VSMART_POLICIES: &str = "template/policy/vsmart";
const CERTIFICATES: &str = "certificate/vedge/list";
const SAVE_CERTIFICATES: &str = "certificate/save/vedge/list";
const PUSH: &str = "certificate/vedge/list?action=push";

/// Certificate state to set on every vEdge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Validity {
    Valid,
    Invalid,
}

/// Which configuration `clean` removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum CleanScope {
    /// Templates and policies.
    All,
    /// vEdge/vSmart policies, definitions and lists.
    Policies,
    /// Device and feature templates.
    Templates,
    /// Deactivate, detach, invalidate certificates, push, then delete the
    /// devices themselves.
    Devices,
}

/// A class of objects `delete_all` can remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DeleteTarget {
    #[strum(to_string = "device templates")]
    DeviceTemplates,
    #[strum(to_string = "feature templates")]
    FeatureTemplates,
    #[strum(to_string = "vEdge policies")]
    VedgePolicies,
    #[strum(to_string = "vSmart policies")]
    VsmartPolicies,
    #[strum(to_string = "policy definitions")]
    Definitions,
    #[strum(to_string = "policy lists")]
    Lists,
    #[strum(to_string = "system devices")]
    SystemDevices,
}

impl DeleteTarget {
    /// `(listing path, delete prefix, id field)` per listing to walk.
    fn sources(self) -> Vec<(String, String, &'static str)> {
        let flat = |list: &str, delete: &str, id: &'static str| {
            vec![(list.to_owned(), delete.to_owned(), id)]
        };
        let per_subtype = |mount: &str, subtypes: &[&str], id: &'static str| {
            subtypes
                .iter()
                .map(|sub| (format!("{mount}{sub}"), format!("{mount}{sub}"), id))
                .collect()
        };
        match self {
            Self::DeviceTemplates => flat(DEVICE_TEMPLATES, DEVICE_TEMPLATES, "templateId"),
            Self::FeatureTemplates => flat("template/feature", "template/feature", "templateId"),
            Self::VedgePolicies => {
                flat("template/policy/vedge", "template/policy/vedge", "policyId")
            }
            Self::VsmartPolicies => flat(VSMART_POLICIES, VSMART_POLICIES, "policyId"),
            Self::Definitions => per_subtype(
                "template/policy/definition",
                DEFINITION_SUBTYPES,
                "definitionId",
            ),
            Self::Lists => per_subtype("template/policy/list", LIST_SUBTYPES, "listId"),
            Self::SystemDevices => flat("system/device/vedges", "system/device", "uuid"),
        }
    }
}

/// Totals of a `clean` run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    pub deactivated: usize,
    pub detached: usize,
    pub certificates: usize,
    pub pushed: bool,
    pub deletes: Vec<DeleteReport>,
}

/// A user to create with `add_user`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub group: String,
    pub description: String,
    pub username: String,
    pub password: SecretString,
}

/// What a readiness wait polls for.
enum Condition<'c> {
    /// `device/action/status/{id}` reports completion.
    Action(&'c str),
    /// No device template has an attachment with this personality.
    Detached(&'c str),
    /// No vSmart policy is activated.
    Deactivated,
}

pub struct Lifecycle<'a> {
    api: &'a dyn ControllerApi,
    readiness: Readiness,
}

impl<'a> Lifecycle<'a> {
    pub fn new(api: &'a dyn ControllerApi, readiness: Readiness) -> Self {
        Self { api, readiness }
    }

    // ── Attachments ──────────────────────────────────────────────────

    async fn device_template_ids(&self) -> Result<Vec<String>, CoreError> {
        let listing = list_or_empty(self.api, DEVICE_TEMPLATES).await?;
        Ok(ids(&listing, "templateId"))
    }

    async fn attachments(&self, template_id: &str) -> Result<Vec<Value>, CoreError> {
        let path = format!("template/device/config/attached/{template_id}");
        Ok(data_of(&self.api.get(&path).await?).to_vec())
    }

    /// True when any device template is attached to a device.
    pub async fn has_attached_devices(&self) -> Result<bool, CoreError> {
        for id in self.device_template_ids().await? {
            if !self.attachments(&id).await?.is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Move every attached device back to CLI mode: vEdges first, then
    /// vSmarts. Returns the number of devices detached.
    pub async fn detach_device_templates(&self) -> Result<usize, CoreError> {
        let mut total = 0;
        for (personality, device_type) in [("vedge", "vedge"), ("vsmart", "controller")] {
            let mut actions = Vec::new();
            let mut detached = 0;

            for template_id in self.device_template_ids().await? {
                for attach in self.attachments(&template_id).await? {
                    if attach["personality"].as_str() != Some(personality) {
                        continue;
                    }
                    let body = json!({
                        "deviceType": device_type,
                        "devices": [{
                            "deviceId": attach["uuid"],
                            "deviceIP": attach["deviceIP"],
                        }],
                    });
                    info!(
                        personality,
                        uuid = attach["uuid"].as_str().unwrap_or_default(),
                        ip = attach["deviceIP"].as_str().unwrap_or_default(),
                        "detaching"
                    );
                    let response = self.post(DETACH, &body).await?;
                    actions.extend(action_id(&response));
                    detached += 1;
                }
            }

            if detached == 0 {
                info!(personality, "all device templates already detached");
                continue;
            }
            info!(personality, detached, "device templates detached");
            self.settle(&actions, &Condition::Detached(personality)).await?;
            total += detached;
        }
        Ok(total)
    }

    // ── Policies ─────────────────────────────────────────────────────

    async fn activated_policies(&self) -> Result<Vec<String>, CoreError> {
        let listing = list_or_empty(self.api, VSMART_POLICIES).await?;
        Ok(data_of(&listing)
            .iter()
            .filter(|p| p["isPolicyActivated"].as_bool() == Some(true))
            .filter_map(|p| p["policyId"].as_str().map(str::to_owned))
            .collect())
    }

    /// Deactivate every activated vSmart policy. Returns how many were.
    pub async fn deactivate_policies(&self) -> Result<usize, CoreError> {
        let active = self.activated_policies().await?;
        if active.is_empty() {
            info!("all policies are already deactivated");
            return Ok(0);
        }

        let mut actions = Vec::new();
        for id in &active {
            let path = format!("{VSMART_POLICIES}/deactivate/{id}");
            let response = self.post(&path, &json!({})).await?;
            info!(policy_id = %id, "deactivated policy");
            actions.extend(action_id(&response));
        }
        self.settle(&actions, &Condition::Deactivated).await?;
        Ok(active.len())
    }

    // ── Certificates ─────────────────────────────────────────────────

    /// Mark every vEdge certificate `validity`. Returns the device count.
    pub async fn set_certificate_validity(&self, validity: Validity) -> Result<usize, CoreError> {
        let listing = list_or_empty(self.api, CERTIFICATES).await?;
        let mut count = 0;
        for device in data_of(&listing) {
            let body = json!([{
                "chasisNumber": device["chasisNumber"],
                "serialNumber": device["serialNumber"],
                "validity": validity.to_string(),
            }]);
            info!(
                chassis = device["chasisNumber"].as_str().unwrap_or_default(),
                %validity,
                "setting certificate validity"
            );
            self.post(SAVE_CERTIFICATES, &body).await?;
            count += 1;
        }
        Ok(count)
    }

    /// Send the vEdge certificate list to the controllers.
    pub async fn push_to_controllers(&self) -> Result<(), CoreError> {
        let response = self.post(PUSH, &json!({})).await?;
        info!("pushed certificate list to controllers");
        match action_id(&response) {
            Some(id) => self.wait(&Condition::Action(&id)).await,
            None => {
                info!(
                    cooldown_secs = self.readiness.push_cooldown.as_secs(),
                    "no action id returned, waiting out push cooldown"
                );
                sleep(self.readiness.push_cooldown).await;
                Ok(())
            }
        }
    }

    // ── Deletion ─────────────────────────────────────────────────────

    /// Delete every object of `target`. Refusals (factory defaults,
    /// read-only lists) are reported, not fatal.
    pub async fn delete_all(&self, target: DeleteTarget) -> Result<DeleteReport, CoreError> {
        let mut report = DeleteReport {
            target: target.to_string(),
            deleted: 0,
            refused: Vec::new(),
        };

        for (list_path, delete_prefix, id_field) in target.sources() {
            let listing = list_or_empty(self.api, &list_path).await?;
            for id in ids(&listing, id_field) {
                let path = format!("{delete_prefix}/{}", urlencoding::encode(&id));
                match self.api.delete(&path).await? {
                    DeleteOutcome::Deleted(_) => {
                        debug!(%target, %id, "deleted");
                        report.deleted += 1;
                    }
                    DeleteOutcome::Refused(reason) => {
                        info!(%target, %id, %reason, "not deleted");
                        report.refused.push((id, reason));
                    }
                }
            }
        }

        info!(
            %target,
            deleted = report.deleted,
            refused = report.refused.len(),
            "delete complete"
        );
        Ok(report)
    }

    /// Remove configuration per `scope`, in dependency-safe order.
    pub async fn clean(&self, scope: CleanScope) -> Result<CleanReport, CoreError> {
        let mut report = CleanReport::default();
        let targets: &[DeleteTarget] = match scope {
            CleanScope::All => &[
                DeleteTarget::DeviceTemplates,
                DeleteTarget::FeatureTemplates,
                DeleteTarget::VedgePolicies,
                DeleteTarget::VsmartPolicies,
                DeleteTarget::Definitions,
                DeleteTarget::Lists,
            ],
            CleanScope::Templates => &[
                DeleteTarget::DeviceTemplates,
                DeleteTarget::FeatureTemplates,
            ],
            CleanScope::Policies => &[
                DeleteTarget::VedgePolicies,
                DeleteTarget::VsmartPolicies,
                DeleteTarget::Definitions,
                DeleteTarget::Lists,
            ],
            CleanScope::Devices => {
                report.deactivated = self.deactivate_policies().await?;
                report.detached = self.detach_device_templates().await?;
                report.certificates = self.set_certificate_validity(Validity::Invalid).await?;
                self.push_to_controllers().await?;
                report.pushed = true;
                &[DeleteTarget::SystemDevices]
            }
        };

        for &target in targets {
            report.deletes.push(self.delete_all(target).await?);
        }
        Ok(report)
    }

    // ── Users ────────────────────────────────────────────────────────

    pub async fn update_password(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<(), CoreError> {
        let path = format!("admin/user/password/{}", urlencoding::encode(username));
        let body = json!({
            "userName": username,
            "password": password.expose_secret(),
        });
        self.api.put(&path, &body).await?;
        info!(username, "password updated");
        Ok(())
    }

    pub async fn add_user(&self, user: &NewUser) -> Result<(), CoreError> {
        let body = json!({
            "group": [user.group],
            "description": user.description,
            "userName": user.username,
            "password": user.password.expose_secret(),
        });
        self.post("admin/user", &body).await?;
        info!(username = %user.username, "user created");
        Ok(())
    }

    // ── Readiness ────────────────────────────────────────────────────

    /// POST where a duplicate diagnostic is unexpected and thus an error.
    async fn post(&self, path: &str, body: &Value) -> Result<Value, CoreError> {
        match self.api.post(path, body).await? {
            PostOutcome::Accepted(v) => Ok(v),
            PostOutcome::Duplicate(details) => Err(CoreError::Api {
                message: details,
                status: Some(400),
            }),
        }
    }

    /// Wait on returned action ids if any, otherwise on `fallback`.
    async fn settle(&self, actions: &[String], fallback: &Condition<'_>) -> Result<(), CoreError> {
        if actions.is_empty() {
            return self.wait(fallback).await;
        }
        for id in actions {
            self.wait(&Condition::Action(id)).await?;
        }
        Ok(())
    }

    /// Poll `condition` until it holds or the readiness timeout passes.
    async fn wait(&self, condition: &Condition<'_>) -> Result<(), CoreError> {
        let deadline = Instant::now() + self.readiness.timeout;
        loop {
            if self.check(condition).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                warn!(
                    timeout_secs = self.readiness.timeout.as_secs(),
                    "controller not ready before timeout, continuing"
                );
                return Ok(());
            }
            sleep(self.readiness.poll_interval).await;
        }
    }

    async fn check(&self, condition: &Condition<'_>) -> Result<bool, CoreError> {
        match *condition {
            Condition::Action(id) => {
                let status = self.api.get(&format!("device/action/status/{id}")).await?;
                let state = status["summary"]["status"].as_str().unwrap_or_default();
                debug!(action = id, state, "action status");
                Ok(state.eq_ignore_ascii_case("done"))
            }
            Condition::Detached(personality) => {
                for template_id in self.device_template_ids().await? {
                    let attached = self.attachments(&template_id).await?;
                    if attached
                        .iter()
                        .any(|a| a["personality"].as_str() == Some(personality))
                    {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::Deactivated => Ok(self.activated_policies().await?.is_empty()),
        }
    }
}

/// String ids under `field` in a listing's `data[]`.
fn ids(listing: &Value, field: &str) -> Vec<String> {
    data_of(listing)
        .iter()
        .filter_map(|item| item[field].as_str().map(str::to_owned))
        .collect()
}

/// Controller action id carried by an asynchronous action's response.
fn action_id(response: &Value) -> Option<String> {
    response["id"].as_str().map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_wire_values() {
        assert_eq!(Validity::Valid.to_string(), "valid");
        assert_eq!(Validity::Invalid.to_string(), "invalid");
    }

    #[test]
    fn list_deletes_walk_every_subtype() {
        let sources = DeleteTarget::Lists.sources();
        assert_eq!(sources.len(), LIST_SUBTYPES.len());
        assert_eq!(sources[0].0, "template/policy/list/community");
    }

    #[test]
    fn system_devices_delete_under_a_different_prefix() {
        let sources = DeleteTarget::SystemDevices.sources();
        assert_eq!(
            sources,
            vec![(
                "system/device/vedges".to_owned(),
                "system/device".to_owned(),
                "uuid"
            )]
        );
    }

    #[test]
    fn action_id_only_from_string_id() {
        assert_eq!(action_id(&json!({ "id": "push-1" })), Some("push-1".into()));
        assert_eq!(action_id(&Value::Null), None);
    }
}
