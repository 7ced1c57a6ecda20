// src/exec/registry.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::errors::{BranchdagError, Result};
use crate::exec::body::BodyRef;

/// Maps `func_ref` keys to invocable bodies.
///
/// The registry is an explicit value handed to the orchestrator; nothing is
/// registered globally. Bodies are compared by identity, so registering the
/// same `Arc` twice under one key is fine while a different body is not.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    bodies: HashMap<String, BodyRef>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: impl Into<String>, body: BodyRef) -> Result<()> {
        let key = key.into();

        self.check(&key, &body)?;
        if self.bodies.contains_key(&key) {
            return Ok(());
        }

        debug!(%key, "registered task body");
        self.bodies.insert(key, body);
        Ok(())
    }

    /// Whether `register(key, body)` would succeed, without binding anything.
    pub fn check(&self, key: &str, body: &BodyRef) -> Result<()> {
        match self.bodies.get(key) {
            Some(existing) if !Arc::ptr_eq(existing, body) => {
                Err(BranchdagError::DuplicateRegistration(key.to_string()))
            }
            _ => Ok(()),
        }
    }

    pub fn get(&self, key: &str) -> Result<BodyRef> {
        self.bodies
            .get(key)
            .cloned()
            .ok_or_else(|| BranchdagError::UnregisteredFunction(key.to_string()))
    }

    pub fn has(&self, key: &str) -> bool {
        self.bodies.contains_key(key)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.bodies.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}
