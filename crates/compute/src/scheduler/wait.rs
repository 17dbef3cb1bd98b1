use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use super::outcome::{ExecError, Outcome};
use super::stop::StopToken;
use super::value::{AsyncValue, ExecContext};

/// Drive `value` to completion on the calling thread and return its outcome.
pub fn sync_wait<T: Send>(value: AsyncValue<'_, T>) -> Outcome<T> {
    sync_wait_with(value, &StopToken::never())
}

/// Like [`sync_wait`], with a stop token every stage of the graph observes.
pub fn sync_wait_with<T: Send>(value: AsyncValue<'_, T>, stop: &StopToken) -> Outcome<T> {
    let cx = ExecContext::new(stop.clone());
    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| value.drive(&cx))) {
        Ok(outcome) => outcome,
        Err(payload) => Outcome::Error(ExecError::from_panic(payload)),
    };
    match &outcome {
        Outcome::Value(_) => debug!("Deferred value completed"),
        Outcome::Error(e) => warn!("Deferred value failed: {}", e),
        Outcome::Stopped => debug!("Deferred value stopped"),
    }
    outcome
}
