//! Named, auto-resetting control signals.
//!
//! The dispatcher owns a [`SignalRegistry`] and is the only writer. Senders
//! hold a cloneable [`ControlSignals`] handle and wait on per-signal watch
//! channels. Each raise bumps a generation counter, so a waiter armed after
//! a raise never mistakes that earlier notification for its own.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use inklink_frame::ACK;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::{LinkError, Result};

/// Current state of one signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalState {
    /// Whether the signal is raised right now.
    pub raised: bool,
    /// Number of times the signal has been raised.
    pub generation: u64,
}

struct Entry {
    tx: watch::Sender<SignalState>,
    clear_at: Option<Instant>,
}

/// Write side of the signal table, owned by the dispatcher.
pub struct SignalRegistry {
    entries: HashMap<String, Entry>,
    clear_delay: Duration,
}

impl SignalRegistry {
    /// Register `ACK` plus `extra` names. Returns the registry and the
    /// handle senders wait on.
    pub fn new<I, S>(extra: I, clear_delay: Duration) -> (Self, ControlSignals)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries = HashMap::new();
        let mut receivers = HashMap::new();

        let names = std::iter::once(ACK.to_string()).chain(extra.into_iter().map(Into::into));
        for name in names {
            if entries.contains_key(&name) {
                continue;
            }
            let (tx, rx) = watch::channel(SignalState::default());
            receivers.insert(name.clone(), rx);
            entries.insert(name, Entry { tx, clear_at: None });
        }

        let registry = Self {
            entries,
            clear_delay,
        };
        let handle = ControlSignals {
            receivers: Arc::new(receivers),
        };
        (registry, handle)
    }

    /// Raise `name` and schedule its clear. Returns the new generation.
    pub fn raise(&mut self, name: &str, now: Instant) -> Result<u64> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| LinkError::UnknownControlSignal(name.to_string()))?;

        let mut generation = 0;
        entry.tx.send_modify(|state| {
            state.raised = true;
            state.generation += 1;
            generation = state.generation;
        });
        entry.clear_at = Some(now + self.clear_delay);
        Ok(generation)
    }

    /// Clear every signal whose clear time has passed.
    pub fn clear_expired(&mut self, now: Instant) {
        for entry in self.entries.values_mut() {
            if entry.clear_at.is_some_and(|at| at <= now) {
                entry.clear_at = None;
                entry.tx.send_modify(|state| state.raised = false);
            }
        }
    }

    /// The earliest pending clear, if any.
    pub fn next_clear(&self) -> Option<Instant> {
        self.entries.values().filter_map(|e| e.clear_at).min()
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

/// Read side of the signal table.
///
/// Cheap to clone. Once the dispatcher stops, every wait fails with
/// [`LinkError::DispatcherStopped`].
#[derive(Clone)]
pub struct ControlSignals {
    receivers: Arc<HashMap<String, watch::Receiver<SignalState>>>,
}

impl ControlSignals {
    /// Registered signal names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.receivers.keys().map(String::as_str)
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.receivers.contains_key(name)
    }

    /// Snapshot of a signal's state.
    pub fn state(&self, name: &str) -> Result<SignalState> {
        Ok(*self.receiver(name)?.borrow())
    }

    /// Whether `name` is currently raised.
    pub fn is_raised(&self, name: &str) -> Result<bool> {
        Ok(self.state(name)?.raised)
    }

    /// Start watching for the next raise of `name`.
    ///
    /// Arm before triggering whatever makes the device send the signal,
    /// then await [`SignalWaiter::wait`].
    pub fn arm(&self, name: &str) -> Result<SignalWaiter> {
        let rx = self.receiver(name)?.clone();
        let armed_at = rx.borrow().generation;
        Ok(SignalWaiter {
            name: name.to_string(),
            rx,
            armed_at,
        })
    }

    /// Wait for the next raise of `name`.
    pub async fn wait(&self, name: &str) -> Result<()> {
        self.arm(name)?.wait().await
    }

    fn receiver(&self, name: &str) -> Result<&watch::Receiver<SignalState>> {
        self.receivers
            .get(name)
            .ok_or_else(|| LinkError::UnknownControlSignal(name.to_string()))
    }
}

impl std::fmt::Debug for ControlSignals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("ControlSignals")
            .field("names", &names)
            .finish()
    }
}

/// A pending wait on one signal.
#[derive(Debug)]
pub struct SignalWaiter {
    name: String,
    rx: watch::Receiver<SignalState>,
    armed_at: u64,
}

impl SignalWaiter {
    /// Signal being waited on.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve once the signal is raised after this waiter was armed.
    pub async fn wait(mut self) -> Result<()> {
        let armed_at = self.armed_at;
        self.rx
            .wait_for(|state| state.generation > armed_at)
            .await
            .map(|_| ())
            .map_err(|_| LinkError::DispatcherStopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAR: Duration = Duration::from_millis(100);

    #[test]
    fn ack_is_always_registered() {
        let (registry, signals) = SignalRegistry::new(["BATTERY_LOW", "ACK"], CLEAR);
        assert!(registry.contains(ACK));
        assert!(signals.contains("BATTERY_LOW"));
        assert_eq!(signals.names().count(), 2);
        assert_eq!(
            format!("{signals:?}"),
            "ControlSignals { names: [\"ACK\", \"BATTERY_LOW\"] }"
        );
    }

    #[test]
    fn unknown_names_are_errors() {
        let (mut registry, signals) = SignalRegistry::new(Vec::<String>::new(), CLEAR);
        assert!(matches!(
            registry.raise("NOPE", Instant::now()),
            Err(LinkError::UnknownControlSignal(name)) if name == "NOPE"
        ));
        assert!(matches!(
            signals.arm("NOPE"),
            Err(LinkError::UnknownControlSignal(_))
        ));
    }

    #[test]
    fn raise_sets_then_clear_resets() {
        let (mut registry, signals) = SignalRegistry::new(Vec::<String>::new(), CLEAR);
        let t0 = Instant::now();

        assert_eq!(registry.raise(ACK, t0).unwrap(), 1);
        assert!(signals.is_raised(ACK).unwrap());
        assert_eq!(registry.next_clear(), Some(t0 + CLEAR));

        registry.clear_expired(t0 + CLEAR / 2);
        assert!(signals.is_raised(ACK).unwrap());

        registry.clear_expired(t0 + CLEAR);
        assert!(!signals.is_raised(ACK).unwrap());
        assert_eq!(registry.next_clear(), None);
        assert_eq!(signals.state(ACK).unwrap().generation, 1);
    }

    #[test]
    fn re_raise_extends_the_clear() {
        let (mut registry, signals) = SignalRegistry::new(Vec::<String>::new(), CLEAR);
        let t0 = Instant::now();
        registry.raise(ACK, t0).unwrap();
        registry.raise(ACK, t0 + CLEAR / 2).unwrap();

        registry.clear_expired(t0 + CLEAR);
        assert!(signals.is_raised(ACK).unwrap());
        assert_eq!(signals.state(ACK).unwrap().generation, 2);
    }

    #[tokio::test]
    async fn armed_waiter_resolves_on_raise() {
        let (mut registry, signals) = SignalRegistry::new(Vec::<String>::new(), CLEAR);
        let waiter = signals.arm(ACK).unwrap();
        assert_eq!(waiter.name(), ACK);

        registry.raise(ACK, Instant::now()).unwrap();
        waiter.wait().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn waiter_armed_after_raise_ignores_it() {
        let (mut registry, signals) = SignalRegistry::new(Vec::<String>::new(), CLEAR);
        registry.raise(ACK, Instant::now()).unwrap();

        // Still raised, but the raise predates the waiter.
        let waiter = signals.arm(ACK).unwrap();
        let pending = tokio::time::timeout(Duration::from_millis(20), waiter.wait()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn dropping_registry_stops_waiters() {
        let (registry, signals) = SignalRegistry::new(Vec::<String>::new(), CLEAR);
        let waiter = signals.arm(ACK).unwrap();
        drop(registry);
        assert!(matches!(
            waiter.wait().await,
            Err(LinkError::DispatcherStopped)
        ));
    }
}
