//! Serialized completion delivery
//!
//! Every async completion runs on one dedicated thread, in the order it was
//! dispatched, so callers never observe two completions at once.

use std::io;
use std::sync::mpsc::{channel, Sender};
use std::thread;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a single-threaded callback queue. Clones share the same thread,
/// which exits once every handle has been dropped.
#[derive(Clone)]
pub struct CallbackQueue {
    sender: Sender<Job>,
}

impl CallbackQueue {
    pub fn spawn(name: &str) -> io::Result<Self> {
        let (sender, receiver) = channel::<Job>();
        thread::Builder::new().name(name.to_string()).spawn(move || {
            for job in receiver {
                job();
            }
        })?;
        Ok(Self { sender })
    }

    /// Queue `job`. Jobs dispatched after the worker is gone are dropped.
    pub fn dispatch<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.sender.send(Box::new(job)).is_err() {
            tracing::debug!("callback queue closed, dropping completion");
        }
    }
}
