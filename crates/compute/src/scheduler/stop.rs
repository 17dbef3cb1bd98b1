use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

/// Owner side of a cooperative stop signal.
#[derive(Debug, Default)]
pub struct StopSource {
    flag: Arc<AtomicBool>,
}

impl StopSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a token observing this source.
    pub fn token(&self) -> StopToken {
        StopToken {
            flag: Some(Arc::clone(&self.flag)),
        }
    }

    /// Signal every observer to stop at its next phase boundary.
    pub fn request_stop(&self) {
        info!("Stop requested");
        self.flag.store(true, Ordering::Release);
    }

    pub fn stop_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Observer side of a [`StopSource`]. The default token never stops.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    flag: Option<Arc<AtomicBool>>,
}

impl StopToken {
    /// A token that can never be stopped.
    pub fn never() -> Self {
        Self::default()
    }

    pub fn stop_requested(&self) -> bool {
        self.flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Acquire))
    }

    pub fn stop_possible(&self) -> bool {
        self.flag.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_observe_source() {
        let source = StopSource::new();
        let token = source.token();
        assert!(token.stop_possible());
        assert!(!token.stop_requested());

        source.request_stop();
        assert!(token.stop_requested());
        assert!(token.clone().stop_requested());
    }

    #[test]
    fn never_token_stays_clear() {
        let token = StopToken::never();
        assert!(!token.stop_possible());
        assert!(!token.stop_requested());
    }
}
