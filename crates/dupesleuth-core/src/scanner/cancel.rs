/// Cooperative cancellation.
///
/// Nothing is ever interrupted mid-operation. The walker checks between
/// entries, workers check before each file, and the hasher checks between
/// chunks, so whatever finished before the stop is still consistent.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Shared flag a caller flips to stop a running scan.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A cancel token combined with an optional deadline.
#[derive(Debug, Clone)]
pub struct StopSignal {
    token: CancelToken,
    deadline: Option<Instant>,
}

impl StopSignal {
    pub fn new(token: CancelToken, deadline: Option<Instant>) -> Self {
        Self { token, deadline }
    }

    /// A signal that never fires.
    pub fn never() -> Self {
        Self::new(CancelToken::new(), None)
    }

    pub fn should_stop(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn token_clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn past_deadline_fires() {
        let past = Instant::now() - Duration::from_millis(1);
        assert!(StopSignal::new(CancelToken::new(), Some(past)).should_stop());

        let future = Instant::now() + Duration::from_secs(3600);
        assert!(!StopSignal::new(CancelToken::new(), Some(future)).should_stop());
        assert!(!StopSignal::never().should_stop());
    }
}
