//! Test doubles for the core's injected collaborators.
//!
//! Available to this crate's tests and, behind the `test-utils` feature, to
//! downstream crates.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use crate::{
    Environment, NotificationError, NotificationSink, PreferenceError, PreferenceStore,
};

/// Manually advanced clock.
///
/// Clones share the same clock. `sleep` advances it instead of waiting.
#[derive(Debug, Clone)]
pub struct ManualEnv {
    base: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualEnv {
    /// Clock starting at the current real instant.
    pub fn new() -> Self {
        Self { base: Instant::now(), offset: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *offset += by;
    }

    /// Time elapsed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Environment for ManualEnv {
    type Instant = Instant;

    fn now(&self) -> Instant {
        self.base + self.elapsed()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }
}

/// Sink that counts plays. Clones share the counter.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    plays: Arc<AtomicUsize>,
    fail: bool,
}

impl RecordingSink {
    /// Sink that always plays.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that always refuses, counting attempts.
    pub fn failing() -> Self {
        Self { plays: Arc::default(), fail: true }
    }

    /// Number of `play` calls so far.
    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }
}

impl NotificationSink for RecordingSink {
    fn play(&self) -> Result<(), NotificationError> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        if self.fail { Err(NotificationError::Blocked("test sink".into())) } else { Ok(()) }
    }
}

/// Preference store whose contents stay observable after being boxed.
#[derive(Debug, Clone, Default)]
pub struct SharedPreferences {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl SharedPreferences {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `key`.
    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap_or_else(std::sync::PoisonError::into_inner).get(key).cloned()
    }
}

impl PreferenceStore for SharedPreferences {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.value(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Preference store that fails every operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingPreferences;

impl PreferenceStore for FailingPreferences {
    fn get(&self, _key: &str) -> Result<Option<String>, PreferenceError> {
        Err(PreferenceError::Unavailable("test store".into()))
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), PreferenceError> {
        Err(PreferenceError::Unavailable("test store".into()))
    }
}
