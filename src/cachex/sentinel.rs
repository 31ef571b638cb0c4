//! Barrier coordination for in-flight queries
//!
//! One sentinel exists per key with a query in flight. The first requester
//! becomes the producer; everyone else blocks on the sentinel and receives
//! the produced bytes. Sharing marshalled bytes (not a decoded value) is
//! what gives every waiter an independently owned copy: each one decodes
//! for itself, so in-place mutation by one caller cannot leak into another.

use std::sync::{Arc, Condvar, Mutex, PoisonError};

use crate::cache::errors::CacheError;

type Outcome = Result<Arc<Vec<u8>>, CacheError>;

pub(crate) struct Sentinel {
    state: Mutex<Option<Outcome>>,
    cond: Condvar,
}

impl Sentinel {
    pub(crate) fn new() -> Self {
        Sentinel {
            state: Mutex::new(None),
            cond: Condvar::new(),
        }
    }

    /// Publish the flight's outcome and wake every waiter.
    ///
    /// Only the first call wins; later calls are ignored, which makes the
    /// abort path in the flight guard safe to run unconditionally.
    pub(crate) fn complete(&self, outcome: Result<Vec<u8>, CacheError>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.is_none() {
            *state = Some(outcome.map(Arc::new));
            self.cond.notify_all();
        }
    }

    /// Block until the producer publishes, then take a handle on the result.
    pub(crate) fn wait(&self) -> Outcome {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(outcome) = state.as_ref() {
                return outcome.clone();
            }
            state = self
                .cond
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn waiters_observe_the_published_result() {
        let sentinel = Arc::new(Sentinel::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let s = Arc::clone(&sentinel);
            handles.push(thread::spawn(move || s.wait()));
        }

        thread::sleep(Duration::from_millis(50));
        sentinel.complete(Ok(vec![1, 2, 3]));

        for handle in handles {
            let bytes = handle.join().unwrap().unwrap();
            assert_eq!(*bytes, vec![1, 2, 3]);
        }
    }

    #[test]
    fn first_completion_wins() {
        let sentinel = Sentinel::new();
        sentinel.complete(Err(CacheError::origin("boom")));
        sentinel.complete(Ok(vec![9]));
        assert_eq!(sentinel.wait().unwrap_err(), CacheError::origin("boom"));
    }
}
