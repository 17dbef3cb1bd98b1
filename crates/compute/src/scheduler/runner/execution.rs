use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::scheduler::outcome::{ExecError, Outcome};
use crate::scheduler::types::StageKind;
use crate::scheduler::value::{AsyncValue, ExecContext};

use super::Scheduler;

/// Run one lane of a bulk stage, turning a panic into an error.
pub(crate) fn run_lane<T, F>(lane: usize, state: &T, body: &F) -> Result<(), ExecError>
where
    F: Fn(usize, &T) -> Result<(), ExecError>,
{
    match panic::catch_unwind(AssertUnwindSafe(|| body(lane, state))) {
        Ok(result) => result,
        Err(payload) => Err(ExecError::from_panic(payload)),
    }
}

/// Run every lane of a bulk stage on the calling thread, in lane order.
pub(crate) fn run_lanes_inline<T, F>(width: usize, state: &T, body: &F) -> Result<(), ExecError>
where
    F: Fn(usize, &T) -> Result<(), ExecError>,
{
    (0..width).try_for_each(|lane| run_lane(lane, state, body))
}

impl Scheduler {
    /// Run `f` inside the pool. Already on a pool worker, `f` runs in place.
    pub(crate) fn install<R, F>(&self, f: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        self.pool.install(f)
    }

    /// Run a bulk stage with `width` lanes across the pool.
    pub(crate) fn run_bulk<T, F>(&self, width: usize, state: &T, body: &F) -> Result<(), ExecError>
    where
        T: Sync,
        F: Fn(usize, &T) -> Result<(), ExecError> + Sync,
    {
        let start = Instant::now();
        let result = self.pool.install(|| {
            (0..width)
                .into_par_iter()
                .try_for_each(|lane| run_lane(lane, state, body))
        });

        match &result {
            Ok(()) => {
                debug!("Bulk stage of {} lanes completed in {:?}", width, start.elapsed());
                self.record(StageKind::Bulk, width, start.elapsed());
            }
            Err(e) => {
                warn!("Bulk stage of {} lanes failed: {}", width, e);
                self.record_failure();
            }
        }
        result
    }

    /// Drive two deferred values concurrently.
    ///
    /// A join runs no lanes of its own: it is recorded only when both sides
    /// produced a value, and failures are left to the stage that raised them.
    pub(crate) fn run_join<'a, A, B>(
        &self,
        cx: &ExecContext,
        left: AsyncValue<'a, A>,
        right: AsyncValue<'a, B>,
    ) -> (Outcome<A>, Outcome<B>)
    where
        A: Send + 'a,
        B: Send + 'a,
    {
        let start = Instant::now();
        let (a, b) = self
            .pool
            .install(|| rayon::join(|| left.drive(cx), || right.drive(cx)));

        if a.is_value() && b.is_value() {
            self.record(StageKind::Join, 0, start.elapsed());
        }
        (a, b)
    }

    pub(crate) fn record_stopped(&self) {
        if let Ok(mut m) = self.metrics.write() {
            m.record_stopped();
        }
    }

    fn record(&self, kind: StageKind, lanes: usize, duration: Duration) {
        if let Ok(mut m) = self.metrics.write() {
            m.record_execution(kind, lanes, duration);
        }
    }

    fn record_failure(&self) {
        if let Ok(mut m) = self.metrics.write() {
            m.record_failure();
        }
    }
}
