//! Repeating background timer

use std::io;
use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Runs an action on a background thread every `interval` until invalidated.
///
/// Dropping the timer invalidates it; once `invalidate` returns the action
/// will not run again. A zero interval is rejected.
pub struct RepeatingTimer {
    cancel: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl RepeatingTimer {
    pub fn start<F>(name: &str, interval: Duration, mut action: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        if interval.is_zero() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "timer interval must be non-zero"));
        }
        let (cancel_tx, cancel_rx) = channel::<()>();
        let handle = thread::Builder::new().name(name.to_string()).spawn(move || loop {
            match cancel_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => action(),
                // Cancelled, or the owner went away
                _ => break,
            }
        })?;

        Ok(Self {
            cancel: Some(cancel_tx),
            handle: Some(handle),
        })
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    pub fn invalidate(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RepeatingTimer {
    fn drop(&mut self) {
        self.invalidate();
    }
}
