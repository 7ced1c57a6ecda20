// src/exec/backend.rs

//! Pluggable executor backend for the async runtime.
//!
//! The runtime hands each [`Dispatch`] to an `ExecutorBackend` and later
//! receives a [`TaskFinished`] on its event channel. Tests can swap in a
//! backend that completes tasks inline instead of on worker threads.

use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::TaskFinished;
use crate::engine::core::Dispatch;
use crate::errors::Result;
use crate::exec::executor::Executor;

/// Trait abstracting how dispatched tasks are executed.
pub trait ExecutorBackend: Send {
    /// Start executing `dispatch`.
    ///
    /// The implementation must eventually send exactly one [`TaskFinished`]
    /// for it on the runtime's event channel.
    fn dispatch(&mut self, dispatch: Dispatch) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Runs each body on Tokio's blocking pool.
///
/// Bodies are synchronous, so they never run on the async worker threads.
/// A panicking body is reported as a failed body rather than leaving the
/// runtime waiting for a completion that never comes.
#[derive(Debug)]
pub struct BlockingExecutorBackend {
    executor: Executor,
    tx: mpsc::Sender<TaskFinished>,
}

impl BlockingExecutorBackend {
    pub fn new(executor: Executor, tx: mpsc::Sender<TaskFinished>) -> Self {
        Self { executor, tx }
    }
}

impl ExecutorBackend for BlockingExecutorBackend {
    fn dispatch(&mut self, dispatch: Dispatch) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let executor = self.executor.clone();
        let tx = self.tx.clone();

        Box::pin(async move {
            tokio::task::spawn_blocking(move || {
                let Dispatch {
                    task,
                    func_ref,
                    mut ctx,
                } = dispatch;

                let result = catch_unwind(AssertUnwindSafe(|| executor.execute(&func_ref, &mut ctx)))
                    .unwrap_or_else(|_| Ok(Err(anyhow!("task body panicked"))));

                debug!(task = %task, "blocking worker finished task");
                if tx.blocking_send(TaskFinished { task, ctx, result }).is_err() {
                    warn!("runtime stopped listening; dropping task completion");
                }
            });
            Ok(())
        })
    }
}
