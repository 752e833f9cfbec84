//! Heartbeat sinks for tests.

use common::types::HealthCheckRecord;
use ns_service::tasks::HeartbeatSink;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

/// Sink that keeps every record it receives.
///
/// Recording can be frozen with [`RecordingSink::freeze`]; records emitted
/// afterwards are counted separately so tests can assert that nothing arrived
/// after a given point.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<HealthCheckRecord>>,
    frozen: AtomicBool,
    late: Mutex<Vec<HealthCheckRecord>>,
    notify: Notify,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records received before `freeze`.
    pub fn records(&self) -> Vec<HealthCheckRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Stop accepting records into the main list.
    pub fn freeze(&self) {
        self.frozen.store(true, Ordering::SeqCst);
    }

    /// Records received after `freeze`.
    pub fn late_records(&self) -> Vec<HealthCheckRecord> {
        self.late.lock().unwrap().clone()
    }

    /// Wait until at least `n` records have been received.
    pub async fn wait_for(&self, n: usize) {
        loop {
            let notified = self.notify.notified();
            if self.count() >= n {
                return;
            }
            notified.await;
        }
    }
}

impl HeartbeatSink for RecordingSink {
    fn emit(&self, record: &HealthCheckRecord) {
        if self.frozen.load(Ordering::SeqCst) {
            self.late.lock().unwrap().push(record.clone());
        } else {
            self.records.lock().unwrap().push(record.clone());
        }
        self.notify.notify_waiters();
    }
}

/// Sink that panics on the first record, simulating an unexpected failure
/// inside the heartbeat loop.
#[derive(Debug, Default)]
pub struct PanickingSink;

impl HeartbeatSink for PanickingSink {
    fn emit(&self, _record: &HealthCheckRecord) {
        panic!("heartbeat sink failure");
    }
}

/// Sink that blocks its thread for a fixed delay on every record.
///
/// Lets tests catch the heartbeat loop in the middle of an emission. Use it
/// with a multi-thread runtime, since `emit` blocks the worker thread.
#[derive(Debug)]
pub struct SlowSink {
    delay: Duration,
    in_emit: AtomicBool,
    completed: AtomicUsize,
}

impl SlowSink {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_emit: AtomicBool::new(false),
            completed: AtomicUsize::new(0),
        }
    }

    /// Whether an emission is currently in progress.
    pub fn in_emit(&self) -> bool {
        self.in_emit.load(Ordering::SeqCst)
    }

    /// Number of emissions that have finished.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Wait until an emission is in progress.
    pub async fn wait_until_emitting(&self) {
        while !self.in_emit() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }
}

impl HeartbeatSink for SlowSink {
    fn emit(&self, _record: &HealthCheckRecord) {
        self.in_emit.store(true, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.in_emit.store(false, Ordering::SeqCst);
    }
}
