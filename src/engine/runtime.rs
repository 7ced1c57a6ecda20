// src/engine/runtime.rs

use std::fmt;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dag::TaskGraph;
use crate::errors::Result;
use crate::exec::ExecutorBackend;

use super::context::SharedContext;
use super::core::CoreRun;
use super::report::RunReport;
use super::{RuntimeOptions, TaskFinished};

/// Async shell around [`CoreRun`].
///
/// Dispatches up to `max_in_flight` ready tasks to an [`ExecutorBackend`]
/// and applies their completions one at a time as they arrive on the event
/// channel. This loop is the only place the run state is mutated, so
/// successors counting down the same task or two activators unblocking the
/// same branch never race.
pub struct Runtime<E: ExecutorBackend> {
    backend: E,
    event_rx: mpsc::Receiver<TaskFinished>,
    options: RuntimeOptions,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    /// `event_rx` must be the receiving end of the channel `backend`
    /// reports completions on, with capacity for at least `max_in_flight`
    /// messages.
    pub fn new(backend: E, event_rx: mpsc::Receiver<TaskFinished>, options: RuntimeOptions) -> Self {
        Self {
            backend,
            event_rx,
            options,
        }
    }

    /// Main event loop.
    ///
    /// - Fills free slots from the ready queue.
    /// - Waits for one completion and feeds it into the core.
    /// - Stops on the first error, but only returns once every task already
    ///   handed to the backend has reported back. Those late completions are
    ///   discarded.
    pub async fn run(mut self, graph: &TaskGraph, initial: SharedContext) -> Result<RunReport> {
        let max_in_flight = self.options.max_in_flight.max(1);
        info!(tasks = graph.len(), max_in_flight, "runtime started");

        let mut core = CoreRun::new(graph, initial);
        let mut in_flight = 0usize;

        if let Err(err) = self.drive(&mut core, &mut in_flight, max_in_flight).await {
            self.drain(in_flight).await;
            return Err(err);
        }

        let report = core.into_report();
        info!(executed = report.order.len(), "runtime finished");
        Ok(report)
    }

    async fn drive(
        &mut self,
        core: &mut CoreRun,
        in_flight: &mut usize,
        max_in_flight: usize,
    ) -> Result<()> {
        loop {
            while *in_flight < max_in_flight {
                let Some(dispatch) = core.next_dispatch()? else {
                    break;
                };
                debug!(task = %dispatch.task, in_flight = *in_flight, "sending task to executor");
                self.backend.dispatch(dispatch).await?;
                *in_flight += 1;
            }

            if *in_flight == 0 {
                return core.check_termination();
            }

            let Some(finished) = self.event_rx.recv().await else {
                let pending = std::mem::take(in_flight);
                return Err(anyhow!("executor channel closed with {pending} task(s) in flight").into());
            };
            *in_flight -= 1;

            let TaskFinished { task, ctx, result } = finished;
            core.complete(&task, ctx, result)?;
        }
    }

    /// Wait for `in_flight` outstanding completions and drop them.
    async fn drain(&mut self, mut in_flight: usize) {
        if in_flight > 0 {
            warn!(in_flight, "run aborted; waiting for running tasks to finish");
        }
        while in_flight > 0 {
            match self.event_rx.recv().await {
                Some(finished) => {
                    debug!(task = %finished.task, "discarding completion of aborted run");
                    in_flight -= 1;
                }
                None => break,
            }
        }
    }
}
