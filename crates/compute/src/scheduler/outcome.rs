use std::any::Any;

/// Error type for deferred computation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecError {
    #[error("Lane {lane} failed: {message}")]
    LaneFailed { lane: usize, message: String },
    #[error("Task failed: {0}")]
    Failed(String),
    #[error("Thread pool build failed: {0}")]
    PoolBuild(String),
    #[error("Panicked: {0}")]
    Panicked(String),
}

impl ExecError {
    pub fn lane(lane: usize, message: impl Into<String>) -> Self {
        Self::LaneFailed {
            lane,
            message: message.into(),
        }
    }

    /// Convert a caught panic payload into an error.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked(message)
    }
}

/// How a deferred computation completed: exactly one of a value, an error,
/// or a cooperative stop.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Value(T),
    Error(ExecError),
    Stopped,
}

impl<T> Outcome<T> {
    pub fn is_value(&self) -> bool {
        matches!(self, Outcome::Value(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, Outcome::Stopped)
    }

    pub fn value(self) -> Option<T> {
        match self {
            Outcome::Value(v) => Some(v),
            _ => None,
        }
    }

    /// `Ok(None)` means the computation was stopped.
    pub fn into_result(self) -> Result<Option<T>, ExecError> {
        match self {
            Outcome::Value(v) => Ok(Some(v)),
            Outcome::Error(e) => Err(e),
            Outcome::Stopped => Ok(None),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Value(v) => Outcome::Value(f(v)),
            Outcome::Error(e) => Outcome::Error(e),
            Outcome::Stopped => Outcome::Stopped,
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> Result<U, ExecError>) -> Outcome<U> {
        match self {
            Outcome::Value(v) => match f(v) {
                Ok(u) => Outcome::Value(u),
                Err(e) => Outcome::Error(e),
            },
            Outcome::Error(e) => Outcome::Error(e),
            Outcome::Stopped => Outcome::Stopped,
        }
    }

    /// Combine two independently completed outcomes.
    ///
    /// Errors win over stops, and the left error wins over the right one.
    pub fn join<U>(left: Outcome<T>, right: Outcome<U>) -> Outcome<(T, U)> {
        match (left, right) {
            (Outcome::Value(a), Outcome::Value(b)) => Outcome::Value((a, b)),
            (Outcome::Error(e), _) | (_, Outcome::Error(e)) => Outcome::Error(e),
            _ => Outcome::Stopped,
        }
    }
}
