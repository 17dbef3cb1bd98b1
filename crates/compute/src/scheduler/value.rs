//! Deferred values and the combinators that compose them.
//!
//! Every combinator only builds a new node; nothing executes until the graph
//! is driven by [`sync_wait`](super::sync_wait).

use tracing::debug;

use super::outcome::{ExecError, Outcome};
use super::runner::{run_lanes_inline, Scheduler};
use super::stop::StopToken;

/// What a node sees while it is being driven: the active scheduler, if any,
/// and the stop token of the enclosing wait.
#[derive(Debug, Clone)]
pub struct ExecContext {
    scheduler: Option<Scheduler>,
    stop: StopToken,
}

impl ExecContext {
    pub(crate) fn new(stop: StopToken) -> Self {
        Self { scheduler: None, stop }
    }

    pub fn scheduler(&self) -> Option<&Scheduler> {
        self.scheduler.as_ref()
    }

    pub fn stop_token(&self) -> &StopToken {
        &self.stop
    }

    fn with_scheduler(&self, scheduler: Scheduler) -> Self {
        Self {
            scheduler: Some(scheduler),
            stop: self.stop.clone(),
        }
    }
}

type Node<'a, T> = Box<dyn FnOnce(&ExecContext) -> Outcome<T> + Send + 'a>;

/// A value that has not been produced yet.
///
/// The lifetime `'a` bounds every borrow captured by the graph, so a deferred
/// scan over a borrowed buffer cannot outlive the buffer.
#[must_use = "deferred values do nothing until driven by sync_wait"]
pub struct AsyncValue<'a, T> {
    node: Node<'a, T>,
}

impl<T> std::fmt::Debug for AsyncValue<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AsyncValue { .. }")
    }
}

/// One step of a seed chain.
///
/// `independent` does not need the incoming seed and may run while the
/// previous step is still finishing. `finish` receives the seed together with
/// the independent result and yields the next seed.
pub struct ChainLink<'a, T, P> {
    independent: AsyncValue<'a, P>,
    finish: Box<dyn FnOnce(T, P) -> AsyncValue<'a, T> + Send + 'a>,
}

impl<'a, T, P> ChainLink<'a, T, P> {
    pub fn new<F>(independent: AsyncValue<'a, P>, finish: F) -> Self
    where
        F: FnOnce(T, P) -> AsyncValue<'a, T> + Send + 'a,
    {
        Self {
            independent,
            finish: Box::new(finish),
        }
    }
}

impl<'a, T: Send + 'a> AsyncValue<'a, T> {
    fn from_fn<F>(f: F) -> Self
    where
        F: FnOnce(&ExecContext) -> Outcome<T> + Send + 'a,
    {
        Self { node: Box::new(f) }
    }

    /// A deferred value that is already known.
    pub fn immediate(value: T) -> Self {
        Self::from_fn(move |_| Outcome::Value(value))
    }

    /// A deferred value that completes with `error`.
    pub fn failed(error: ExecError) -> Self {
        Self::from_fn(move |_| Outcome::Error(error))
    }

    /// A deferred value that completes as stopped.
    pub fn stopped() -> Self {
        Self::from_fn(|_| Outcome::Stopped)
    }

    /// Transform the value once it is produced. Errors and stops pass through.
    pub fn map<U, F>(self, f: F) -> AsyncValue<'a, U>
    where
        U: Send + 'a,
        F: FnOnce(T) -> U + Send + 'a,
    {
        AsyncValue::from_fn(move |cx| self.drive(cx).map(f))
    }

    /// Like [`map`](Self::map), but the transform may fail.
    pub fn try_map<U, F>(self, f: F) -> AsyncValue<'a, U>
    where
        U: Send + 'a,
        F: FnOnce(T) -> Result<U, ExecError> + Send + 'a,
    {
        AsyncValue::from_fn(move |cx| self.drive(cx).and_then(f))
    }

    /// Complete with both values once both sides have completed.
    ///
    /// On a scheduler the two sides progress concurrently; without one they
    /// run left then right on the driving thread.
    pub fn join<U>(self, other: AsyncValue<'a, U>) -> AsyncValue<'a, (T, U)>
    where
        U: Send + 'a,
    {
        AsyncValue::from_fn(move |cx| {
            let (left, right) = match cx.scheduler() {
                Some(scheduler) => scheduler.run_join(cx, self, other),
                None => (self.drive(cx), other.drive(cx)),
            };
            Outcome::join(left, right)
        })
    }

    /// Run `body(lane, &state)` for every lane in `0..width` once the state
    /// is available, then pass the state on.
    ///
    /// A stop request is honored only before the first lane starts, so a
    /// bulk stage either runs all of its lanes or none of them. The first
    /// lane error (or panic) becomes the outcome.
    pub fn bulk<F>(self, width: usize, body: F) -> Self
    where
        T: Sync,
        F: Fn(usize, &T) -> Result<(), ExecError> + Send + Sync + 'a,
    {
        Self::from_fn(move |cx| {
            let state = match self.drive(cx) {
                Outcome::Value(state) => state,
                other => return other,
            };
            if cx.stop_token().stop_requested() {
                debug!("Bulk stage of {} lanes skipped: stop requested", width);
                if let Some(scheduler) = cx.scheduler() {
                    scheduler.record_stopped();
                }
                return Outcome::Stopped;
            }
            let result = match cx.scheduler() {
                Some(scheduler) => scheduler.run_bulk(width, &state, &body),
                None => run_lanes_inline(width, &state, &body),
            };
            match result {
                Ok(()) => Outcome::Value(state),
                Err(e) => Outcome::Error(e),
            }
        })
    }

    /// Run this computation with `scheduler` as its worker pool.
    pub fn on(self, scheduler: &Scheduler) -> Self {
        let scheduler = scheduler.clone();
        Self::from_fn(move |cx| {
            let cx = cx.with_scheduler(scheduler.clone());
            scheduler.install(|| self.drive(&cx))
        })
    }

    /// Thread a seed through a sequence of links.
    ///
    /// Step `k` joins link `k - 1`'s `finish` with link `k`'s `independent`
    /// work, so independent work overlaps the previous step. Links are pulled
    /// lazily and the chain is driven in a loop, keeping stack depth constant
    /// however many links there are. An empty sequence yields the seed.
    pub fn chain<P, I>(self, links: I) -> AsyncValue<'a, T>
    where
        P: Send + 'a,
        I: IntoIterator<Item = ChainLink<'a, T, P>>,
        I::IntoIter: Send + 'a,
    {
        let mut links = links.into_iter();
        Self::from_fn(move |cx| {
            let Some(first) = links.next() else {
                return self.drive(cx);
            };
            let mut finish = first.finish;
            let mut step = self.join(first.independent);
            loop {
                let (seed, partial) = match step.drive(cx) {
                    Outcome::Value(pair) => pair,
                    Outcome::Error(e) => return Outcome::Error(e),
                    Outcome::Stopped => return Outcome::Stopped,
                };
                let carried = finish(seed, partial);
                match links.next() {
                    Some(next) => {
                        finish = next.finish;
                        step = carried.join(next.independent);
                    }
                    None => return carried.drive(cx),
                }
            }
        })
    }

    pub(crate) fn drive(self, cx: &ExecContext) -> Outcome<T> {
        (self.node)(cx)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::scheduler::{sync_wait, sync_wait_with, SchedulerConfig, StopSource};

    fn scheduler() -> Scheduler {
        Scheduler::new(SchedulerConfig::with_workers(4)).unwrap()
    }

    #[test]
    fn construction_is_lazy() {
        let runs = AtomicUsize::new(0);
        let value = AsyncValue::immediate(1).map(|v| {
            runs.fetch_add(1, Ordering::Relaxed);
            v + 1
        });
        assert_eq!(runs.load(Ordering::Relaxed), 0);
        assert_eq!(sync_wait(value), Outcome::Value(2));
        assert_eq!(runs.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn try_map_surfaces_error() {
        let value = AsyncValue::immediate(5)
            .try_map(|_| Err::<u32, _>(ExecError::Failed("nope".into())));
        assert_eq!(sync_wait(value), Outcome::Error(ExecError::Failed("nope".into())));
    }

    #[test]
    fn map_skips_after_failure() {
        let value = AsyncValue::<u32>::failed(ExecError::Failed("seed".into()))
            .map(|_| -> u32 { panic!("must not run") });
        assert!(sync_wait(value).is_error());
    }

    #[test]
    fn join_inline_and_on_pool() {
        let inline = AsyncValue::immediate(2).join(AsyncValue::immediate("two"));
        assert_eq!(sync_wait(inline), Outcome::Value((2, "two")));

        let sch = scheduler();
        let pooled = AsyncValue::immediate(2).join(AsyncValue::immediate("two")).on(&sch);
        assert_eq!(sync_wait(pooled), Outcome::Value((2, "two")));
        assert_eq!(sch.metrics().executed(crate::scheduler::StageKind::Join), 1);
    }

    #[test]
    fn join_propagates_stop() {
        let value = AsyncValue::immediate(1).join(AsyncValue::<u8>::stopped());
        assert!(sync_wait(value).is_stopped());
    }

    #[test]
    fn bulk_runs_every_lane_once() {
        let sch = scheduler();
        let value = AsyncValue::immediate((0..16).map(|_| AtomicUsize::new(0)).collect::<Vec<_>>())
            .bulk(16, |lane, hits| {
                hits[lane].fetch_add(1, Ordering::Relaxed);
                Ok(())
            })
            .on(&sch);

        let hits = sync_wait(value).value().unwrap();
        assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
        assert_eq!(sch.metrics().lanes_executed, 16);
    }

    #[test]
    fn bulk_inline_runs_in_lane_order() {
        let value = AsyncValue::immediate(Mutex::new(Vec::new())).bulk(5, |lane, order| {
            order.lock().unwrap().push(lane);
            Ok(())
        });
        let order = sync_wait(value).value().unwrap().into_inner().unwrap();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn bulk_lane_error_fails_stage() {
        let sch = scheduler();
        let value = AsyncValue::immediate(())
            .bulk(8, |lane, _| {
                if lane == 3 {
                    Err(ExecError::lane(lane, "bad block"))
                } else {
                    Ok(())
                }
            })
            .on(&sch);
        assert_eq!(sync_wait(value), Outcome::Error(ExecError::lane(3, "bad block")));
        assert_eq!(sch.metrics().stages_failed, 1);
    }

    #[test]
    fn bulk_lane_panic_becomes_error() {
        let value = AsyncValue::immediate(()).bulk(2, |lane, _| {
            if lane == 1 {
                panic!("lane exploded");
            }
            Ok(())
        });
        assert_eq!(sync_wait(value), Outcome::Error(ExecError::Panicked("lane exploded".into())));
    }

    #[test]
    fn bulk_observes_stop_before_lanes_only() {
        let source = StopSource::new();
        let lanes_run = AtomicUsize::new(0);
        // The first stage requests a stop from inside a lane; it still runs
        // every lane, and the next stage is skipped.
        let value = AsyncValue::immediate(())
            .bulk(4, |_, _| {
                lanes_run.fetch_add(1, Ordering::Relaxed);
                source.request_stop();
                Ok(())
            })
            .bulk(4, |_, _| {
                lanes_run.fetch_add(100, Ordering::Relaxed);
                Ok(())
            });

        assert!(sync_wait_with(value, &source.token()).is_stopped());
        assert_eq!(lanes_run.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn chain_threads_seed_through_links() {
        let links = (1..=4u64).map(|k| {
            ChainLink::new(AsyncValue::immediate(k * 10), |seed: u64, part: u64| {
                AsyncValue::immediate(seed + part)
            })
        });
        let value = AsyncValue::immediate(1u64).chain(links);
        assert_eq!(sync_wait(value), Outcome::Value(101));
    }

    #[test]
    fn chain_without_links_yields_seed() {
        let links: Vec<ChainLink<'_, u64, ()>> = Vec::new();
        assert_eq!(sync_wait(AsyncValue::immediate(7u64).chain(links)), Outcome::Value(7));
    }

    #[test]
    fn chain_stops_pulling_links_after_failure() {
        let pulled = AtomicUsize::new(0);
        let links = (0..10).map(|k| {
            pulled.fetch_add(1, Ordering::Relaxed);
            ChainLink::new(AsyncValue::immediate(k), move |seed: i32, part: i32| {
                if k == 2 {
                    AsyncValue::failed(ExecError::Failed("link 2".into()))
                } else {
                    AsyncValue::immediate(seed + part)
                }
            })
        });
        let value = AsyncValue::immediate(0).chain(links);
        assert_eq!(sync_wait(value), Outcome::Error(ExecError::Failed("link 2".into())));
        // Link 3 is pulled to overlap with link 2's finish; nothing after it.
        assert_eq!(pulled.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn long_chain_does_not_grow_the_stack() {
        let links = (0..200_000u64).map(|k| {
            ChainLink::new(AsyncValue::immediate(k), |seed: u64, part: u64| {
                AsyncValue::immediate(seed + part)
            })
        });
        let sch = scheduler();
        let value = AsyncValue::immediate(0u64).chain(links).on(&sch);
        assert_eq!(sync_wait(value), Outcome::Value(199_999 * 200_000 / 2));
    }
}
