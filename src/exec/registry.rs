// src/exec/registry.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::errors::{Result, RolegraphError};
use crate::exec::Executor;
use crate::types::RoleName;

/// Role name -> executor. Append-only: a bound role cannot be rebound.
#[derive(Default)]
pub struct ExecutorRegistry {
    executors: HashMap<RoleName, Arc<dyn Executor>>,
}

impl fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut roles: Vec<&str> = self.roles().collect();
        roles.sort_unstable();
        f.debug_struct("ExecutorRegistry")
            .field("roles", &roles)
            .finish()
    }
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, role: &str, executor: Arc<dyn Executor>) -> Result<()> {
        if self.executors.contains_key(role) {
            return Err(RolegraphError::DuplicateRole(role.to_string()));
        }
        self.executors.insert(role.to_string(), executor);
        debug!(role = %role, "executor registered");
        Ok(())
    }

    pub fn get(&self, role: &str) -> Option<Arc<dyn Executor>> {
        self.executors.get(role).cloned()
    }

    pub fn contains(&self, role: &str) -> bool {
        self.executors.contains_key(role)
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.executors.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.executors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}
