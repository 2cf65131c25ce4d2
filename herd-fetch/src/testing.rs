//! Scriptable data source for tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use thiserror::Error;

use herd_core::traits::DataSource;
use herd_core::types::{Fetched, Ttl};

#[derive(Debug, Error)]
#[error("mock source failure: {0}")]
pub(crate) struct MockError(&'static str);

pub(crate) fn key(s: &str) -> String {
    s.to_string()
}

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Returns `"{key}#{n}"` where `n` counts fetches, so tests can tell which
/// fetch produced a value.
#[derive(Default)]
pub(crate) struct MockSource {
    latency: Duration,
    slow_key: Option<String>,
    ttl: Ttl,
    fail_init: bool,
    fail_fetch: AtomicBool,
    fail_write: bool,
    panic_fetch: bool,
    inits: AtomicUsize,
    fetches: AtomicUsize,
    writes: AtomicUsize,
    teardowns: AtomicUsize,
}

impl MockSource {
    pub(crate) fn new() -> Self {
        Self {
            ttl: Ttl::Never,
            ..Default::default()
        }
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Restricts the latency to fetches of `key`; others answer at once.
    pub(crate) fn slow_only_for(mut self, key: &str) -> Self {
        self.slow_key = Some(key.to_string());
        self
    }

    pub(crate) fn with_ttl(mut self, ttl: Ttl) -> Self {
        self.ttl = ttl;
        self
    }

    pub(crate) fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub(crate) fn failing_fetch(self) -> Self {
        self.set_fail_fetch(true);
        self
    }

    pub(crate) fn failing_write(mut self) -> Self {
        self.fail_write = true;
        self
    }

    pub(crate) fn panicking_fetch(mut self) -> Self {
        self.panic_fetch = true;
        self
    }

    pub(crate) fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub(crate) fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub(crate) fn teardowns(&self) -> usize {
        self.teardowns.load(Ordering::SeqCst)
    }
}

impl DataSource for MockSource {
    type Key = String;
    type Value = String;
    type Error = MockError;

    fn init(&self) -> Result<(), MockError> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            return Err(MockError("init"));
        }
        Ok(())
    }

    fn fetch(&self, key: &String) -> Result<Fetched<String>, MockError> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        let slow = self.slow_key.as_ref().map_or(true, |k| k == key);
        if slow && !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        if self.panic_fetch {
            panic!("mock source panicked fetching {key}");
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(MockError("fetch"));
        }
        Ok(Fetched::new(format!("{key}#{n}"), self.ttl))
    }

    fn write(&self, _key: &String, _value: &String) -> Result<(), MockError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_write {
            return Err(MockError("write"));
        }
        Ok(())
    }

    fn teardown(&self) {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
    }
}
