// In-memory vManage controller for engine tests.
//
// Serves `{"data": [...]}` listings from named collections, assigns fresh
// ids on create, answers duplicates the way vManage does, and records
// every mutating call for assertions.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};
use vexim_api::{DeleteOutcome, Error, PostOutcome};
use vexim_core::ControllerApi;

#[derive(Default)]
struct State {
    collections: HashMap<String, Vec<Value>>,
    responses: HashMap<String, Value>,
    rejected_names: HashSet<String>,
    refused_ids: HashSet<String>,
    next_id: usize,
    gets: Vec<String>,
    posts: Vec<(String, Value)>,
    puts: Vec<(String, Value)>,
    deletes: Vec<String>,
}

#[derive(Default)]
pub struct FakeController {
    state: Mutex<State>,
}

/// Where a create POST lands: `(collection, id field, name field)`.
fn create_target(path: &str) -> Option<(String, &'static str, &'static str)> {
    let path = path.trim_end_matches('/');
    if path.starts_with("template/policy/list/") {
        return Some((path.to_owned(), "listId", "name"));
    }
    if path.starts_with("template/policy/definition/") {
        return Some((path.to_owned(), "definitionId", "name"));
    }
    match path {
        "template/policy/vedge" | "template/policy/vsmart" => {
            Some((path.to_owned(), "policyId", "policyName"))
        }
        "template/feature" => Some((path.to_owned(), "templateId", "templateName")),
        "template/device/feature" | "template/device/cli" => {
            Some(("template/device".to_owned(), "templateId", "templateName"))
        }
        _ => None,
    }
}

impl FakeController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a listing collection.
    pub fn with_collection(self, path: &str, items: Vec<Value>) -> Self {
        self.state
            .lock()
            .unwrap()
            .collections
            .insert(path.to_owned(), items);
        self
    }

    /// Canned response for a GET (when no collection matches) or a POST
    /// that is not a create.
    pub fn with_response(self, path: &str, body: Value) -> Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(path.to_owned(), body);
        self
    }

    /// Creating an object with this name fails with a 400.
    pub fn rejecting(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .rejected_names
            .insert(name.to_owned());
        self
    }

    /// Deleting this id is refused as a read-only list.
    pub fn refusing_delete(self, id: &str) -> Self {
        self.state.lock().unwrap().refused_ids.insert(id.to_owned());
        self
    }

    /// Id of the object named `name` in `collection`.
    pub fn id_of(&self, collection: &str, name: &str) -> String {
        let state = self.state.lock().unwrap();
        let lookup = if collection == "template/device" {
            "template/device/cli"
        } else {
            collection
        };
        let (_, id_field, name_field) = create_target(lookup).unwrap();
        state.collections[collection]
            .iter()
            .find(|item| item[name_field] == name)
            .map(|item| item[id_field].as_str().unwrap().to_owned())
            .unwrap()
    }

    pub fn posts(&self) -> Vec<(String, Value)> {
        self.state.lock().unwrap().posts.clone()
    }

    /// Bodies POSTed to `path`.
    pub fn posted_to(&self, path: &str) -> Vec<Value> {
        self.posts()
            .into_iter()
            .filter(|(p, _)| p == path)
            .map(|(_, body)| body)
            .collect()
    }

    pub fn puts(&self) -> Vec<(String, Value)> {
        self.state.lock().unwrap().puts.clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.state.lock().unwrap().deletes.clone()
    }

    /// How many times `path` was fetched.
    pub fn get_count(&self, path: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .gets
            .iter()
            .filter(|p| *p == path)
            .count()
    }
}

#[async_trait]
impl ControllerApi for FakeController {
    async fn get(&self, path: &str) -> Result<Value, Error> {
        let mut state = self.state.lock().unwrap();
        state.gets.push(path.to_owned());
        if let Some(items) = state.collections.get(path) {
            return Ok(json!({ "data": items }));
        }
        state.responses.get(path).cloned().ok_or_else(|| Error::Api {
            status: 404,
            details: format!("no such resource: {path}"),
        })
    }

    async fn post(&self, path: &str, body: &Value) -> Result<PostOutcome, Error> {
        let mut state = self.state.lock().unwrap();
        state.posts.push((path.to_owned(), body.clone()));

        if let Some(id) = path.strip_prefix("template/policy/vsmart/deactivate/") {
            if let Some(policies) = state.collections.get_mut("template/policy/vsmart") {
                for policy in policies.iter_mut().filter(|p| p["policyId"] == id) {
                    policy["isPolicyActivated"] = json!(false);
                }
            }
        }

        let Some((collection, id_field, name_field)) = create_target(path) else {
            return Ok(PostOutcome::Accepted(
                state.responses.get(path).cloned().unwrap_or(Value::Null),
            ));
        };

        let name = body[name_field].as_str().unwrap_or_default().to_owned();
        if state.rejected_names.contains(&name) {
            return Err(Error::Api {
                status: 400,
                details: format!("Invalid object '{name}'"),
            });
        }
        let items = state.collections.entry(collection).or_default();
        if items.iter().any(|item| item[name_field] == name.as_str()) {
            return Ok(PostOutcome::Duplicate(format!(
                "Duplicate policy list entry {name}"
            )));
        }

        state.next_id += 1;
        let id = format!("new-{}", state.next_id);
        let mut stored = body.clone();
        stored[id_field] = json!(id);
        let collection = create_target(path).unwrap().0;
        state.collections.get_mut(&collection).unwrap().push(stored);
        Ok(PostOutcome::Accepted(json!({ id_field: id })))
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value, Error> {
        let mut state = self.state.lock().unwrap();
        state.puts.push((path.to_owned(), body.clone()));
        Ok(Value::Null)
    }

    async fn delete(&self, path: &str) -> Result<DeleteOutcome, Error> {
        let mut state = self.state.lock().unwrap();
        state.deletes.push(path.to_owned());
        let id = path.rsplit('/').next().unwrap_or_default().to_owned();
        if state.refused_ids.contains(&id) {
            return Ok(DeleteOutcome::Refused(
                "This policy list is a read only list and it cannot be deleted".into(),
            ));
        }
        Ok(DeleteOutcome::Deleted(Value::Null))
    }
}
