//! Cancelable one-shot timer.
//!
//! At most one fire is pending per [`Cancelable`]: scheduling again replaces
//! the pending fire, and dropping the timer cancels it.

use std::time::Duration;

use deskchat_core::Environment;
use tokio::task::JoinHandle;

/// One-shot timer backed by a spawned task.
#[derive(Debug)]
pub struct Cancelable<E> {
    env: E,
    pending: Option<JoinHandle<()>>,
}

impl<E: Environment> Cancelable<E> {
    /// Idle timer sleeping through `env`.
    pub fn new(env: E) -> Self {
        Self { env, pending: None }
    }

    /// Run `fire` once `delay` has elapsed, replacing any pending fire.
    ///
    /// Must be called inside a tokio runtime.
    pub fn schedule<F>(&mut self, delay: Duration, fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();

        let env = self.env.clone();
        self.pending = Some(tokio::spawn(async move {
            env.sleep(delay).await;
            fire();
        }));
    }

    /// Drop the pending fire, if any.
    pub fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }

    /// Whether a fire is scheduled and has not run yet.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl<E> Drop for Cancelable<E> {
    fn drop(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }
}
