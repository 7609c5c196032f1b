//! # Background Refresh
//!
//! Runs slow collaborator work (listing content) off the UI thread while the
//! UI thread does its own setup. The worker publishes its whole result in one
//! message and [`Refresh::wait`] hands it over in one piece, so the UI never
//! sees a partial value.

use std::sync::mpsc::{self, Receiver};
use std::thread;

use log::{debug, warn};

/// A single pending background result.
pub struct Refresh<T> {
    rx: Option<Receiver<T>>,
}

impl<T: Send + 'static> Refresh<T> {
    /// Start `work` on its own thread.
    pub fn spawn<F>(name: &str, work: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let label = name.to_string();
        let spawned = thread::Builder::new().name(label.clone()).spawn(move || {
            // Best-effort: if the receiver is gone, nobody wants the result
            let _ = tx.send(work());
            debug!("Background task '{}' finished", label);
        });
        match spawned {
            Ok(_) => Self { rx: Some(rx) },
            Err(e) => {
                warn!("Failed to spawn background task '{}': {}", name, e);
                Self { rx: None }
            }
        }
    }
}

impl<T> Refresh<T> {
    /// Block until the result arrives. `None` if the worker never produced
    /// one (it panicked or could not be started).
    pub fn wait(mut self) -> Option<T> {
        let value = self.rx.take()?.recv().ok();
        if value.is_none() {
            warn!("Background task ended without a result");
        }
        value
    }
}
