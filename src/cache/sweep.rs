//! Background sweep scheduling
//!
//! One recurring task per backend instance. The loop blocks on a stop
//! channel with the sweep interval as the timeout, so a close is observed
//! immediately and a quiet channel means "run another pass". Pass failures
//! are the caller's problem to log; this module only schedules.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use log::warn;

/// Handle to a recurring sweep thread.
pub(crate) struct SweepTask {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

impl SweepTask {
    /// Spawn a sweep thread running `pass` every `interval`.
    pub(crate) fn spawn<F>(name: &str, interval: Duration, mut pass: F) -> SweepTask
    where
        F: FnMut() + Send + 'static,
    {
        let (stop, stopped) = bounded::<()>(1);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => pass(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .unwrap_or_else(|e| {
                // Thread spawning only fails when the process is out of
                // resources; surface it loudly rather than limping on.
                panic!("failed to spawn sweep thread {name}: {e}")
            });
        SweepTask { stop, handle }
    }

    /// Signal the thread and wait for it to exit.
    pub(crate) fn stop(self) {
        let _ = self.stop.send(());
        if self.handle.join().is_err() {
            warn!("sweep thread exited by panic");
        }
    }
}
