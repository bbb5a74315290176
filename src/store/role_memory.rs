// src/store/role_memory.rs

//! Per-role persistent state built on a [`VersionStore`].
//!
//! Layout inside the store:
//! - `states/<role>_state.json` holds `{ "state", "context", "timestamp" }`
//! - every update also saves a version of that file, which is what
//!   [`RoleMemory::state_history`] reads back
//! - `shared/<from>_<to>_shared.json` holds data one role handed to another

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::errors::{Result, RolegraphError};
use crate::store::VersionStore;
use crate::types::RoleName;

#[derive(Clone)]
pub struct RoleMemory {
    role: RoleName,
    store: Arc<dyn VersionStore>,
    context: Map<String, Value>,
    /// Serializes read-modify-write cycles on the state file.
    write_lock: Arc<Mutex<()>>,
}

impl fmt::Debug for RoleMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleMemory")
            .field("role", &self.role)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl RoleMemory {
    pub fn new(role: impl Into<RoleName>, store: Arc<dyn VersionStore>) -> Self {
        Self {
            role: role.into(),
            store,
            context: Map::new(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Static context saved alongside the state (e.g. project type).
    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn state_path(&self) -> String {
        format!("states/{}_state.json", self.role)
    }

    /// Current state; empty if nothing was saved yet.
    pub fn load_state(&self) -> Result<Map<String, Value>> {
        match self.store.read(&self.state_path()) {
            Ok(content) => {
                let doc: Value = serde_json::from_str(&content)?;
                Ok(doc
                    .get("state")
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default())
            }
            Err(RolegraphError::NotFound(_)) => Ok(Map::new()),
            Err(e) => Err(e),
        }
    }

    /// Overwrite the state and record a version of it.
    pub fn save_state(&self, state: &Map<String, Value>) -> Result<()> {
        let doc = json!({
            "state": state,
            "context": self.context,
            "timestamp": Utc::now().to_rfc3339(),
        });
        let path = self.state_path();
        self.store.write(&path, &serde_json::to_string(&doc)?)?;
        let version = self
            .store
            .save_version(&path, Some(&json!({ "role": self.role })))?;
        debug!(role = %self.role, version = %version, "saved role state");
        Ok(())
    }

    /// Shallow-merge `updates` (a JSON object) into the state and save it.
    /// Returns the merged state.
    pub fn update_state(&self, updates: Value) -> Result<Map<String, Value>> {
        let Value::Object(updates) = updates else {
            return Err(RolegraphError::ConfigError(
                "role state updates must be a JSON object".to_string(),
            ));
        };

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut state = self.load_state()?;
        state.extend(updates);
        self.save_state(&state)?;
        Ok(state)
    }

    /// Every saved state document, oldest first. Unreadable versions are
    /// skipped.
    pub fn state_history(&self) -> Result<Vec<Value>> {
        let mut history = Vec::new();
        for version in self.store.list_versions(&self.state_path())? {
            let Ok(content) = self.store.read(&version) else {
                continue;
            };
            if let Ok(doc) = serde_json::from_str::<Value>(&content) {
                history.push(doc);
            }
        }
        Ok(history)
    }

    /// Hand `data` to `target_role`.
    pub fn share(&self, target_role: &str, data: Value) -> Result<()> {
        let path = format!("shared/{}_{}_shared.json", self.role, target_role);
        let doc = json!({
            "from_role": self.role,
            "to_role": target_role,
            "data": data,
            "timestamp": Utc::now().to_rfc3339(),
        });
        self.store.write(&path, &serde_json::to_string(&doc)?)
    }

    /// Whatever `from_role` last shared with this role, if anything.
    pub fn shared_from(&self, from_role: &str) -> Result<Option<Value>> {
        let path = format!("shared/{}_{}_shared.json", from_role, self.role);
        match self.store.read(&path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(RolegraphError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
