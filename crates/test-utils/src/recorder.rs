#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use branchdag::engine::BranchSelection;
use branchdag::exec::{BodyRef, body_fn, branching_fn};

/// Shared, clonable log of the task ids whose bodies ran, in call order.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, id: &str) {
        self.entries.lock().unwrap().push(id.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.lock().unwrap().iter().any(|e| e == id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of `id` in the log.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.entries.lock().unwrap().iter().position(|e| e == id)
    }

    /// Body that logs its task id and returns nothing.
    pub fn recording(&self) -> BodyRef {
        let log = self.clone();
        body_fn(move |ctx| {
            log.push(ctx.task_id());
            Ok(None)
        })
    }

    /// Body that logs its task id and returns `value`.
    pub fn returning(&self, value: impl Into<toml::Value>) -> BodyRef {
        let log = self.clone();
        let value: toml::Value = value.into();
        body_fn(move |ctx| {
            log.push(ctx.task_id());
            Ok(Some(value.clone()))
        })
    }

    /// Body that logs its task id and fails with `message`.
    pub fn failing(&self, message: &str) -> BodyRef {
        let log = self.clone();
        let message = message.to_string();
        body_fn(move |ctx| {
            log.push(ctx.task_id());
            Err(anyhow!("{message}"))
        })
    }

    /// Activator body that logs its task id and registers `labels`.
    pub fn selecting(&self, labels: &[&str]) -> BodyRef {
        let log = self.clone();
        let labels: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        branching_fn(move |ctx| {
            log.push(ctx.task_id());
            Ok(BranchSelection::many(labels.clone()))
        })
    }
}
