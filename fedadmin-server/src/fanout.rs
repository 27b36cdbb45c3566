//! Concurrent fan-out with all-or-nothing aggregation
//!
//! A [`FanOut`] runs one branch per work item, all under a single child of the
//! request context. Successful partial results are appended to a shared
//! accumulator under a mutex; failures go to a shared [`ErrorRecorder`]. The
//! caller waits for every branch before looking at either, and any recorded
//! failure fails the whole call, discarding whatever succeeded.
//!
//! Accumulation order follows completion order, not dispatch order.
//!
//! Fan-outs nest: a branch may run its own `FanOut` and return the merged
//! result as one partial. Errors from the inner fan-out are flattened into the
//! outer recorder so the final error lists every leaf cause.

use crate::context::RequestContext;
use crate::error::{AdminError, AggregateError, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// What a branch failure does to its siblings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Siblings keep running; every failure is reported.
    #[default]
    RunToCompletion,
    /// The first failure cancels the fan-out's scope; siblings stop at their
    /// next remote call and their cancellations are not reported.
    FailFast,
}

/// Sticky, lock-protected collection of branch failures
#[derive(Debug, Default)]
pub struct ErrorRecorder {
    errors: Mutex<Vec<AdminError>>,
}

impl ErrorRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, err: AdminError) {
        let mut errors = self.errors.lock().unwrap_or_else(|e| e.into_inner());
        match err {
            AdminError::Aggregate(agg) => errors.extend(agg.into_errors()),
            err => errors.push(err),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.lock().unwrap_or_else(|e| e.into_inner()).is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_errors()
    }

    /// Drain the recorder: `Ok` when nothing was recorded, the failure itself
    /// when there was exactly one, [`AdminError::Aggregate`] otherwise
    pub fn finish(&self) -> Result<()> {
        let mut errors = std::mem::take(&mut *self.errors.lock().unwrap_or_else(|e| e.into_inner()));

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(AdminError::Aggregate(AggregateError::new(errors))),
        }
    }
}

struct Scope {
    ctx: RequestContext,
    policy: FailurePolicy,
    errors: ErrorRecorder,
    tripped: AtomicBool,
}

impl Scope {
    fn settle<T>(&self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            // A sibling failed first under FailFast; it is already recorded.
            Err(AdminError::Cancelled) if self.tripped.load(Ordering::Acquire) => None,
            Err(err) => {
                warn!(error = %err, "fan-out branch failed");
                self.errors.record(err);

                if self.policy == FailurePolicy::FailFast
                    && !self.tripped.swap(true, Ordering::AcqRel)
                {
                    self.ctx.cancel();
                }

                None
            }
        }
    }
}

pub struct FanOut {
    scope: Arc<Scope>,
}

impl FanOut {
    pub fn new(ctx: &RequestContext, policy: FailurePolicy) -> Self {
        Self {
            scope: Arc::new(Scope {
                ctx: ctx.child(),
                policy,
                errors: ErrorRecorder::new(),
                tripped: AtomicBool::new(false),
            }),
        }
    }

    /// The cancellation scope shared by every branch of this fan-out
    pub fn context(&self) -> &RequestContext {
        &self.scope.ctx
    }

    /// Run one branch in place and keep its value in the caller's own slot
    ///
    /// For a fixed set of heterogeneous branches joined with `tokio::join!`.
    /// Each slot has exactly one writer, so no lock is involved; the join is
    /// the barrier, and [`FanOut::finish`] must be checked before reading slots.
    pub async fn branch<T, F>(&self, fut: F) -> Option<T>
    where
        F: Future<Output = Result<T>>,
    {
        let result = self.scope.ctx.run(fut).await;
        self.scope.settle(result)
    }

    pub fn finish(self) -> Result<()> {
        self.scope.errors.finish()
    }

    /// Spawn `f(item, ctx)` for every item and merge the partial results
    pub async fn run<I, T, F, Fut>(self, items: I, f: F) -> Result<Vec<T>>
    where
        I: IntoIterator,
        I::Item: Send + 'static,
        F: Fn(I::Item, RequestContext) -> Fut + Send,
        Fut: Future<Output = Result<Vec<T>>> + Send + 'static,
        T: Send + 'static,
    {
        let accumulated: Arc<Mutex<Vec<T>>> = Arc::new(Mutex::new(Vec::new()));
        let mut tasks = JoinSet::new();

        for item in items {
            let branch = f(item, self.scope.ctx.clone());
            let scope = self.scope.clone();
            let accumulated = accumulated.clone();

            tasks.spawn(async move {
                let result = scope.ctx.run(branch).await;
                if let Some(partial) = scope.settle(result) {
                    accumulated
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .extend(partial);
                }
            });
        }

        debug!(branches = tasks.len(), "fan-out dispatched");

        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                self.scope.errors.record(AdminError::Task(err.to_string()));
            }
        }

        self.scope.errors.finish()?;

        let results = std::mem::take(&mut *accumulated.lock().unwrap_or_else(|e| e.into_inner()));
        Ok(results)
    }
}
