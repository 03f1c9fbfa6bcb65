//! One-shot completion signals.
//!
//! The cache needs the same primitive in two places: the per-guild readiness
//! barriers ("sync complete", "roster downloaded") and the voice pending
//! result that correlates a connect request with its asynchronous
//! confirmation. Both are resolve-once, many-waiter slots where a waiter that
//! arrives after resolution must still complete immediately.

use tokio::sync::watch;

/// A single-resolution slot. `set` is first-write-wins; later attempts are
/// no-ops, not errors. `wait` never misses a resolution regardless of
/// whether it happens before or after the wait begins.
#[derive(Debug)]
pub struct OnceSignal<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T: Clone> OnceSignal<T> {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Resolve the signal. Returns whether this call won the race; a `false`
    /// return means an earlier resolution already stuck.
    pub fn set(&self, value: T) -> bool {
        let mut won = false;
        self.tx.send_if_modified(|slot| {
            if slot.is_none() {
                *slot = Some(value.clone());
                won = true;
                true
            } else {
                false
            }
        });
        won
    }

    /// Non-blocking resolution check.
    pub fn is_set(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// The resolved value, if any.
    pub fn get(&self) -> Option<T> {
        self.tx.borrow().clone()
    }

    /// Suspend until the signal resolves. Completes immediately when it
    /// already has.
    pub async fn wait(&self) -> T {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close mid-wait.
        let slot = rx
            .wait_for(|slot| slot.is_some())
            .await
            .expect("signal sender dropped while waiting");
        slot.clone().expect("slot checked non-empty")
    }
}

impl<T: Clone> Default for OnceSignal<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn resolve_is_idempotent() {
        let signal = OnceSignal::new();
        assert!(!signal.is_set());
        assert!(signal.set(1));
        assert!(!signal.set(2));
        assert!(signal.is_set());
        assert_eq!(signal.get(), Some(1));
        assert_eq!(signal.wait().await, 1);
    }

    #[tokio::test]
    async fn waiters_before_and_after_resolution() {
        let signal = Arc::new(OnceSignal::new());

        let early = {
            let signal = Arc::clone(&signal);
            tokio::spawn(async move { signal.wait().await })
        };
        // Give the early waiter a chance to park.
        tokio::time::sleep(Duration::from_millis(5)).await;

        signal.set("done");
        assert_eq!(early.await.unwrap(), "done");

        // A waiter arriving after resolution completes immediately.
        assert_eq!(signal.wait().await, "done");
    }

    #[tokio::test]
    async fn many_waiters_all_observe_one_value() {
        let signal = Arc::new(OnceSignal::new());
        let waiters: Vec<_> = (0..8)
            .map(|_| {
                let signal = Arc::clone(&signal);
                tokio::spawn(async move { signal.wait().await })
            })
            .collect();

        signal.set(42);
        signal.set(43);

        for waiter in waiters {
            assert_eq!(waiter.await.unwrap(), 42);
        }
    }
}
