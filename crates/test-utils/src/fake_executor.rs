use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use branchdag::engine::{Dispatch, TaskFinished};
use branchdag::errors::Result;
use branchdag::exec::{Executor, ExecutorBackend};
use tokio::sync::mpsc;

/// A fake executor backend that:
/// - records which tasks were dispatched
/// - runs each body inline and immediately reports `TaskFinished`.
pub struct ImmediateBackend {
    executor: Executor,
    runtime_tx: mpsc::Sender<TaskFinished>,
    dispatched: Arc<Mutex<Vec<String>>>,
}

impl ImmediateBackend {
    pub fn new(
        executor: Executor,
        runtime_tx: mpsc::Sender<TaskFinished>,
        dispatched: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self {
            executor,
            runtime_tx,
            dispatched,
        }
    }
}

impl ExecutorBackend for ImmediateBackend {
    fn dispatch(
        &mut self,
        dispatch: Dispatch,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executor = self.executor.clone();
        let dispatched = Arc::clone(&self.dispatched);

        Box::pin(async move {
            let Dispatch {
                task,
                func_ref,
                mut ctx,
            } = dispatch;

            dispatched.lock().unwrap().push(task.clone());
            let result = executor.execute(&func_ref, &mut ctx);

            tx.send(TaskFinished { task, ctx, result })
                .await
                .map_err(|e| anyhow::anyhow!("runtime channel closed: {e}"))?;
            Ok(())
        })
    }
}
