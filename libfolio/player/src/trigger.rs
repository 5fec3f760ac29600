use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::settings::Settings;

#[derive(Debug, Default)]
struct Registry {
    owners: HashMap<u64, Vec<String>>,
    next_id: u64,
}

#[derive(Debug)]
struct TriggerInner {
    tx: broadcast::Sender<String>,
    registry: Mutex<Registry>,
    poll_interval: Duration,
    poll_attempts: u32,
}

/// Page-wide "play this source" requests, delivered to every player that owns the source.
#[derive(Clone, Debug)]
pub struct TriggerBus {
    inner: Arc<TriggerInner>,
}

impl Default for TriggerBus {
    fn default() -> Self {
        Self::new()
    }
}

impl TriggerBus {
    pub fn new() -> Self {
        Self::from_settings(&Settings::default())
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let (tx, _) = broadcast::channel(32);
        Self {
            inner: Arc::new(TriggerInner {
                tx,
                registry: Mutex::default(),
                poll_interval: settings.trigger_poll_interval,
                poll_attempts: settings.trigger_poll_attempts,
            }),
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner.registry.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_registered(&self, src: &str) -> bool {
        self.registry()
            .owners
            .values()
            .any(|sources| sources.iter().any(|s| s == src))
    }

    /// Asks the player owning `src` to select and play it. Returns `false` if no
    /// registered player owns the source.
    pub fn fire(&self, src: &str) -> bool {
        if !self.is_registered(src) {
            debug!("No player owns {src}");
            return false;
        }
        info!("Triggering {src}");
        self.inner.tx.send(src.to_owned()).is_ok()
    }

    /// Retries [`fire`](Self::fire) while players are still starting up.
    pub async fn fire_when_ready(&self, src: &str) -> bool {
        for _ in 0..self.inner.poll_attempts {
            if self.fire(src) {
                return true;
            }
            tokio::time::sleep(self.inner.poll_interval).await;
        }
        self.fire(src)
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<String> {
        self.inner.tx.subscribe()
    }

    pub(crate) fn register(&self, sources: Vec<String>) -> TriggerRegistration {
        let mut registry = self.registry();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.owners.insert(id, sources);
        TriggerRegistration {
            inner: Arc::downgrade(&self.inner),
            id,
        }
    }
}

/// Removes a player's sources from the bus when dropped.
#[derive(Debug)]
pub(crate) struct TriggerRegistration {
    inner: Weak<TriggerInner>,
    id: u64,
}

impl Drop for TriggerRegistration {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner
                .registry
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .owners
                .remove(&self.id);
        }
    }
}
