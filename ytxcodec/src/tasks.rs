//! Background load and save
//!
//! Loading and saving run on a worker thread so an interactive caller stays
//! responsive. Each task reports exactly once through a [`TaskHandle`].
//!
//! A save takes the document by value and always hands it back in
//! [`SaveOutcome`], so no edit can race a save in progress and a failed save
//! never loses the edits.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use crate::document::{SaveReport, YtxDocument};
use crate::error::{Error, Result};
use crate::options::YtxOptions;

/// Handle to a running background task
#[derive(Debug)]
pub struct TaskHandle<T> {
    receiver: Receiver<Result<T>>,
    thread: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> TaskHandle<T> {
    fn spawn<F>(name: &str, work: F) -> Result<Self>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let thread = thread::Builder::new()
            .name(format!("ytx-{name}"))
            .spawn(move || {
                // The receiver may already be gone; nothing left to report to
                let _ = sender.send(work());
            })?;

        Ok(Self {
            receiver,
            thread: Some(thread),
        })
    }

    /// Poll for the result without blocking
    ///
    /// Returns `None` while the task is still running.
    pub fn try_wait(&mut self) -> Option<Result<T>> {
        match self.receiver.try_recv() {
            Ok(result) => {
                self.join();
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(self.failure())),
        }
    }

    /// Block until the task finishes
    ///
    /// # Errors
    /// Returns the task's own error, or [`Error::TaskFailed`] if the worker
    /// stopped without reporting.
    pub fn wait(mut self) -> Result<T> {
        match self.receiver.recv() {
            Ok(result) => {
                self.join();
                result
            }
            Err(_) => Err(self.failure()),
        }
    }

    fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }

    fn failure(&mut self) -> Error {
        let message = match self.thread.take().map(JoinHandle::join) {
            Some(Err(panic)) => panic
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "worker panicked".to_string()),
            _ => "worker exited without a result".to_string(),
        };
        tracing::error!("Background task failed: {}", message);
        Error::TaskFailed(message)
    }
}

/// Result of a background save
#[derive(Debug)]
pub struct SaveOutcome {
    /// The document, with resolved addresses if the save succeeded
    pub document: YtxDocument,
    /// What was written, or why nothing was
    pub result: Result<SaveReport>,
}

/// Load a document on a worker thread
///
/// # Errors
/// Returns [`Error::Io`] if the thread cannot be spawned. Load errors are
/// delivered through the handle.
pub fn spawn_load(path: impl Into<PathBuf>, options: YtxOptions) -> Result<TaskHandle<YtxDocument>> {
    let path = path.into();
    TaskHandle::spawn("load", move || YtxDocument::open(path, options))
}

/// Save a document on a worker thread
///
/// # Errors
/// Returns [`Error::Io`] if the thread cannot be spawned. Save errors are
/// delivered inside [`SaveOutcome::result`].
pub fn spawn_save(mut document: YtxDocument) -> Result<TaskHandle<SaveOutcome>> {
    TaskHandle::spawn("save", move || {
        let result = document.save_changes();
        Ok(SaveOutcome { document, result })
    })
}
