use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tap::TapFallible;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::clock::now_millis;
use crate::dto::active_source::ActiveSourceChanged;
use crate::dto::audio_state::AudioState;
use crate::dto::saved_position::SavedPosition;
use crate::dto::state_patch::StatePatch;
use crate::dto::user_action::UserAction;
use crate::settings::StoreSettings;
use crate::storage::{MemoryStorage, Storage};
use crate::subscription::Subscription;

type Subscriber = Arc<dyn Fn(&AudioState) + Send + Sync>;

#[derive(Default)]
pub(crate) struct StoreInner {
    states: HashMap<String, AudioState>,
    subscribers: HashMap<String, Vec<(u64, Subscriber)>>,
    active: Option<String>,
    next_id: u64,
}

impl StoreInner {
    pub(crate) fn remove_subscriber(&mut self, src: &str, id: u64) {
        if let Some(subs) = self.subscribers.get_mut(src) {
            subs.retain(|(sub_id, _)| *sub_id != id);
            if subs.is_empty() {
                self.subscribers.remove(src);
            }
        }
    }

    fn subscribers_for(&self, src: &str) -> Vec<Subscriber> {
        self.subscribers
            .get(src)
            .map(|subs| subs.iter().map(|(_, cb)| cb.clone()).collect())
            .unwrap_or_default()
    }
}

/// Shared playback state for every audio source on the page.
///
/// One store is created up front and handed to each player. Mutations notify the
/// subscribers of the affected source only, after the internal lock is released,
/// so callbacks are free to call back into the store.
pub struct AudioStateStore {
    inner: Arc<Mutex<StoreInner>>,
    active_tx: broadcast::Sender<ActiveSourceChanged>,
    storage: Box<dyn Storage>,
    settings: StoreSettings,
}

impl fmt::Debug for AudioStateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioStateStore")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl AudioStateStore {
    pub fn new(storage: Box<dyn Storage>, settings: StoreSettings) -> Arc<Self> {
        let (active_tx, _) = broadcast::channel(64);
        Arc::new(Self {
            inner: Arc::default(),
            active_tx,
            storage,
            settings,
        })
    }

    pub fn in_memory() -> Arc<Self> {
        Self::new(Box::new(MemoryStorage::new()), StoreSettings::default())
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get_state(&self, src: &str) -> AudioState {
        self.lock()
            .states
            .get(src)
            .cloned()
            .unwrap_or_else(|| AudioState::base(src, now_millis()))
    }

    pub fn set_state(&self, src: &str, patch: StatePatch) -> AudioState {
        let now = now_millis();
        let (next, subscribers) = {
            let mut inner = self.lock();
            let next = match inner.states.get(src) {
                Some(prev) => prev.merge(&patch, now),
                None => AudioState::base(src, now).merge(&patch, now),
            };
            inner.states.insert(src.to_owned(), next.clone());
            (next, inner.subscribers_for(src))
        };
        notify(&subscribers, &next);
        next
    }

    pub fn subscribe<F>(&self, src: &str, callback: F) -> Subscription
    where
        F: Fn(&AudioState) + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner
            .subscribers
            .entry(src.to_owned())
            .or_default()
            .push((id, Arc::new(callback)));
        Subscription::new(Arc::downgrade(&self.inner), src.to_owned(), id)
    }

    pub fn set_active(&self, src: Option<&str>) {
        self.lock().active = src.map(ToOwned::to_owned);
        debug!("Active source is now {src:?}");
        // No receivers just means no players are listening yet
        let _ = self.active_tx.send(ActiveSourceChanged {
            src: src.map(ToOwned::to_owned),
        });
    }

    pub fn get_active(&self) -> Option<String> {
        self.lock().active.clone()
    }

    pub fn subscribe_active(&self) -> broadcast::Receiver<ActiveSourceChanged> {
        self.active_tx.subscribe()
    }

    /// Restores a stored position into memory if one is fresh and worth resuming.
    pub fn load_state(&self, src: &str, storage_key: Option<&str>) -> AudioState {
        self.try_load_state(src, storage_key)
            .unwrap_or_else(|| self.get_state(src))
    }

    /// Like [`load_state`](Self::load_state), but returns `None` when nothing was restored.
    pub fn try_load_state(&self, src: &str, storage_key: Option<&str>) -> Option<AudioState> {
        let saved = self.read_saved(storage_key?)?;
        if !saved.is_fresh(now_millis(), self.settings.ttl) {
            debug!("Ignoring stale position for {src}");
            return None;
        }
        if !saved.is_resumable(self.settings.resume_threshold, self.settings.end_margin) {
            debug!(
                "Ignoring position {}s of {}s for {src}",
                saved.current_time, saved.duration
            );
            return None;
        }
        info!("Restoring {src} at {}s", saved.current_time);
        Some(self.set_state(src, saved.to_patch()))
    }

    fn read_saved(&self, key: &str) -> Option<SavedPosition> {
        let raw = self
            .storage
            .get_item(key)
            .tap_err(|e| warn!("Error reading stored position {key}: {e:?}"))
            .ok()??;
        serde_json::from_str(&raw)
            .tap_err(|e| warn!("Error parsing stored position {key}: {e:?}"))
            .ok()
    }

    /// Persists the current position. Returns whether anything was written.
    pub fn save_state(&self, src: &str, storage_key: Option<&str>) -> bool {
        let Some(key) = storage_key else {
            return false;
        };
        let state = self.get_state(src);
        if !state.has_duration() || state.current_time <= 0.0 {
            return false;
        }
        if state.current_time >= state.duration - self.settings.end_margin.as_secs_f64() {
            return false;
        }

        let saved = SavedPosition::from_state(&state, now_millis());
        let Some(raw) = serde_json::to_string(&saved)
            .tap_err(|e| warn!("Error serializing position for {src}: {e:?}"))
            .ok()
        else {
            return false;
        };
        self.storage
            .set_item(key, &raw)
            .tap_err(|e| warn!("Error saving position for {src}: {e:?}"))
            .is_ok()
    }

    pub fn clear_state(&self, src: &str, storage_key: Option<&str>) {
        self.reset_state(src, storage_key, StatePatch::new().action(UserAction::Stop));
    }

    /// Drops the stored position and replaces the in-memory state with the base state
    /// plus `patch`, notifying subscribers once.
    pub fn reset_state(
        &self,
        src: &str,
        storage_key: Option<&str>,
        patch: StatePatch,
    ) -> AudioState {
        if let Some(key) = storage_key {
            let _ = self
                .storage
                .remove_item(key)
                .tap_err(|e| warn!("Error removing stored position {key}: {e:?}"));
        }
        let now = now_millis();
        let next = AudioState::base(src, now).merge(&patch, now);
        let subscribers = {
            let mut inner = self.lock();
            inner.states.insert(src.to_owned(), next.clone());
            inner.subscribers_for(src)
        };
        notify(&subscribers, &next);
        next
    }

    /// Forgets every state, subscriber and the active source.
    pub fn teardown(&self) {
        let mut inner = self.lock();
        inner.states.clear();
        inner.subscribers.clear();
        inner.active = None;
        info!("Audio state store torn down");
    }
}

fn notify(subscribers: &[Subscriber], state: &AudioState) {
    for callback in subscribers {
        callback(state);
    }
}
