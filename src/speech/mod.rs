// src/speech/mod.rs
//! Spoken prompts
//!
//! Announcements are queued to a worker thread so a slow speech engine never
//! stalls frame processing. When the queue is full the announcement is
//! dropped.

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use crate::error::AssessError;

pub use crate::config::SpeechConfig;

/// Text-to-speech backend
pub trait SpeechEngine: Send + 'static {
    /// Speak one announcement; may block until it has been spoken
    fn speak(&mut self, text: &str) -> Result<(), AssessError>;
}

/// Engine that writes announcements to the log
#[derive(Debug, Default)]
pub struct LogSpeechEngine;

impl SpeechEngine for LogSpeechEngine {
    fn speak(&mut self, text: &str) -> Result<(), AssessError> {
        info!("Announcement: {}", text);
        Ok(())
    }
}

/// Engine that keeps every announcement, for tests and tooling
#[derive(Debug, Clone, Default)]
pub struct RecordingSpeechEngine {
    spoken: Arc<Mutex<Vec<String>>>,
}

impl RecordingSpeechEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Announcements spoken so far, oldest first
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }
}

impl SpeechEngine for RecordingSpeechEngine {
    fn speak(&mut self, text: &str) -> Result<(), AssessError> {
        self.spoken.lock().push(text.to_string());
        Ok(())
    }
}

/// Handle to the announcement worker
pub struct Announcer {
    sender: Option<Sender<String>>,
    worker: Option<JoinHandle<()>>,
    cancelled: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
}

impl Announcer {
    /// Start a worker draining a bounded queue into `engine`
    pub fn spawn<E: SpeechEngine>(engine: E, config: &SpeechConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }

        let (sender, receiver) = channel::bounded(config.queue_capacity.max(1));
        let cancelled = Arc::new(AtomicBool::new(false));
        let worker_cancelled = cancelled.clone();

        let worker = thread::Builder::new()
            .name("announcer".to_string())
            .spawn(move || run_worker(engine, receiver, worker_cancelled));

        match worker {
            Ok(handle) => Self {
                sender: Some(sender),
                worker: Some(handle),
                cancelled,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            Err(e) => {
                warn!("Failed to start announcer thread: {}", e);
                Self::disabled()
            }
        }
    }

    /// Announcer that discards everything
    pub fn disabled() -> Self {
        Self {
            sender: None,
            worker: None,
            cancelled: Arc::new(AtomicBool::new(true)),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Queue an announcement without blocking. Returns false when it was dropped.
    pub fn announce(&self, text: &str) -> bool {
        let Some(sender) = self.sender.as_ref() else {
            return false;
        };

        match sender.try_send(text.to_string()) {
            Ok(()) => true,
            Err(TrySendError::Full(text)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Announcement queue full, dropping \"{}\"", text);
                false
            }
            Err(TrySendError::Disconnected(text)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Announcer stopped, dropping \"{}\"", text);
                false
            }
        }
    }

    /// Announcements dropped because the queue was full or closed
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop the worker, skipping anything still queued, and wait for it
    pub fn shutdown(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Announcer thread panicked");
            }
        }
    }

    /// Close the queue and wait until every queued announcement was spoken
    pub fn drain(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Announcer thread panicked");
            }
        }
    }
}

impl Drop for Announcer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Announcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Announcer")
            .field("enabled", &self.is_enabled())
            .field("dropped", &self.dropped_count())
            .finish()
    }
}

fn run_worker<E: SpeechEngine>(mut engine: E, receiver: Receiver<String>, cancelled: Arc<AtomicBool>) {
    debug!("Announcer worker started");
    while let Ok(text) = receiver.recv() {
        if cancelled.load(Ordering::Acquire) {
            break;
        }
        if let Err(e) = engine.speak(&text) {
            warn!("Speech engine failed on \"{}\": {}", text, e);
        }
    }
    debug!("Announcer worker stopped");
}
