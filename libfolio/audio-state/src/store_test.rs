use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::TempDir;
use tracing::Level;

use crate::audio_state::*;
use crate::clock::now_millis;
use crate::storage::{FileStorage, MemoryStorage, Storage};

#[ctor::ctor]
fn init() {
    tracing_subscriber::fmt()
        .pretty()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .init();
}

const SRC: &str = "/audio/intro.mp3";
const KEY: &str = "playlist-position-/audio/intro.mp3";

fn store_with(storage: Arc<MemoryStorage>) -> Arc<AudioStateStore> {
    AudioStateStore::new(Box::new(storage), StoreSettings::default())
}

fn write_raw(storage: &MemoryStorage, json: serde_json::Value) {
    storage.set_item(KEY, &json.to_string()).unwrap();
}

#[test]
fn test_default_state_before_set() {
    let store = AudioStateStore::in_memory();
    let state = store.get_state(SRC);

    assert_eq!(SRC, state.src);
    assert!(!state.is_playing);
    assert_eq!(0.0, state.current_time);
    assert_eq!(1.0, state.playback_rate);
    assert_eq!(1.0, state.volume);
    assert_eq!(UserAction::Init, state.last_user_action);
}

#[test]
fn test_merge_leaves_other_fields() {
    let store = AudioStateStore::in_memory();
    store.set_state(SRC, StatePatch::new().duration(120.0).volume(0.5));
    let before = store.get_state(SRC);

    let after = store.set_state(
        SRC,
        StatePatch::new()
            .current_time(12.0)
            .is_playing(true)
            .action(UserAction::Play),
    );

    assert_eq!(after, store.get_state(SRC));
    assert_eq!(12.0, after.current_time);
    assert!(after.is_playing);
    assert_eq!(UserAction::Play, after.last_user_action);
    assert_eq!(120.0, after.duration);
    assert_eq!(0.5, after.volume);
    assert!(after.last_updated >= before.last_updated);
}

#[test]
fn test_subscribers_only_see_their_source() {
    let store = AudioStateStore::in_memory();
    let seen = Arc::new(Mutex::new(vec![]));

    let seen_ = seen.clone();
    let _a = store.subscribe(SRC, move |s| seen_.lock().unwrap().push(s.src.clone()));
    store.set_state("/other.mp3", StatePatch::new().is_playing(true));
    store.set_state(SRC, StatePatch::new().is_playing(true));

    assert_eq!(vec![SRC.to_owned()], *seen.lock().unwrap());
}

#[test]
fn test_subscribers_notified_in_order() {
    let store = AudioStateStore::in_memory();
    let seen = Arc::new(Mutex::new(vec![]));

    let subs: Vec<_> = (0..3)
        .map(|i| {
            let seen = seen.clone();
            store.subscribe(SRC, move |_| seen.lock().unwrap().push(i))
        })
        .collect();
    store.set_state(SRC, StatePatch::new().current_time(1.0));

    assert_eq!(vec![0, 1, 2], *seen.lock().unwrap());
    drop(subs);
}

#[test]
fn test_callback_can_read_store() {
    let store = AudioStateStore::in_memory();
    let observed = Arc::new(Mutex::new(None));

    let store_ = store.clone();
    let observed_ = observed.clone();
    let _sub = store.subscribe(SRC, move |s| {
        *observed_.lock().unwrap() = Some(store_.get_state(&s.src).current_time);
    });
    store.set_state(SRC, StatePatch::new().current_time(7.0));

    assert_eq!(Some(7.0), *observed.lock().unwrap());
}

#[test]
fn test_unsubscribe_stops_notifications() {
    let store = AudioStateStore::in_memory();
    let count = Arc::new(Mutex::new(0));

    let count_ = count.clone();
    let sub = store.subscribe(SRC, move |_| *count_.lock().unwrap() += 1);
    store.set_state(SRC, StatePatch::new().current_time(1.0));
    sub.unsubscribe();
    store.set_state(SRC, StatePatch::new().current_time(2.0));

    assert_eq!(1, *count.lock().unwrap());
}

#[tokio::test]
async fn test_active_broadcast() {
    let store = AudioStateStore::in_memory();
    let mut rx = store.subscribe_active();

    store.set_active(Some("/a.mp3"));
    store.set_active(Some("/b.mp3"));
    store.set_active(None);

    assert_eq!(Some("/a.mp3".to_owned()), rx.recv().await.unwrap().src);
    assert_eq!(Some("/b.mp3".to_owned()), rx.recv().await.unwrap().src);
    assert_eq!(None, rx.recv().await.unwrap().src);
    assert_eq!(None, store.get_active());
}

#[test]
fn test_save_load_round_trip() {
    let storage = Arc::new(MemoryStorage::new());
    let store = store_with(storage.clone());
    store.set_state(
        SRC,
        StatePatch::new()
            .duration(120.0)
            .current_time(30.0)
            .playback_rate(1.5)
            .volume(0.6),
    );
    assert!(store.save_state(SRC, Some(KEY)));

    // a fresh store simulates a page reload
    let reloaded = store_with(storage);
    let state = reloaded.load_state(SRC, Some(KEY));

    assert_eq!(30.0, state.current_time);
    assert_eq!(120.0, state.duration);
    assert_eq!(1.5, state.playback_rate);
    assert_eq!(0.6, state.volume);
    assert!(!state.muted);
}

#[test]
fn test_round_trip_through_files() {
    let temp = TempDir::new().unwrap();
    let storage = Arc::new(FileStorage::new_from_path(temp.path()).unwrap());
    let store = AudioStateStore::new(Box::new(storage.clone()), StoreSettings::default());
    store.set_state(SRC, StatePatch::new().duration(120.0).current_time(30.0));
    assert!(store.save_state(SRC, Some(KEY)));

    let reloaded = AudioStateStore::new(Box::new(storage), StoreSettings::default());
    assert_eq!(30.0, reloaded.load_state(SRC, Some(KEY)).current_time);
}

#[rstest]
#[case(0.0, 120.0)]
#[case(115.0, 120.0)]
#[case(119.0, 120.0)]
#[case(30.0, 0.0)]
fn test_save_is_noop_outside_window(#[case] current_time: f64, #[case] duration: f64) {
    let storage = Arc::new(MemoryStorage::new());
    let store = store_with(storage.clone());
    store.set_state(
        SRC,
        StatePatch::new()
            .duration(duration)
            .current_time(current_time),
    );

    assert!(!store.save_state(SRC, Some(KEY)));
    assert!(storage.is_empty());
}

#[test]
fn test_save_without_key() {
    let store = AudioStateStore::in_memory();
    store.set_state(SRC, StatePatch::new().duration(120.0).current_time(30.0));
    assert!(!store.save_state(SRC, None));
}

#[test]
fn test_save_quota_exceeded() {
    let storage = Arc::new(MemoryStorage::with_quota(8));
    let store = store_with(storage.clone());
    store.set_state(SRC, StatePatch::new().duration(120.0).current_time(30.0));

    assert!(!store.save_state(SRC, Some(KEY)));
    assert!(storage.is_empty());
}

#[rstest]
#[case::stale(serde_json::json!({"currentTime": 30.0, "duration": 120.0, "timestamp": 0}))]
#[case::too_early(serde_json::json!({"currentTime": 5.0, "duration": 120.0, "timestamp": now_millis()}))]
#[case::missing_position(serde_json::json!({"duration": 120.0, "timestamp": now_millis()}))]
#[case::inside_end_margin(serde_json::json!({"currentTime": 115.0, "duration": 120.0, "timestamp": now_millis()}))]
#[case::past_duration(serde_json::json!({"currentTime": 500.0, "duration": 120.0, "timestamp": now_millis()}))]
#[case::overflowing(serde_json::json!({"currentTime": 1e30, "duration": 120.0, "timestamp": now_millis()}))]
#[case::overflowing_duration(serde_json::json!({"currentTime": 30.0, "duration": 1e30, "timestamp": now_millis()}))]
#[case::overflowing_without_duration(serde_json::json!({"currentTime": 1e30, "timestamp": now_millis()}))]
#[case::negative_duration(serde_json::json!({"currentTime": 30.0, "duration": -120.0, "timestamp": now_millis()}))]
fn test_load_ignores_unusable_entries(#[case] json: serde_json::Value) {
    let storage = Arc::new(MemoryStorage::new());
    write_raw(&storage, json);
    let store = store_with(storage);

    assert_eq!(None, store.try_load_state(SRC, Some(KEY)));
    let state = store.load_state(SRC, Some(KEY));
    assert_eq!(0.0, state.current_time);
    assert_eq!(0.0, state.duration);
}

#[test]
fn test_load_keeps_known_duration() {
    let storage = Arc::new(MemoryStorage::new());
    write_raw(
        &storage,
        serde_json::json!({"currentTime": 42.0, "timestamp": now_millis()}),
    );
    let store = store_with(storage);
    store.set_state(SRC, StatePatch::new().duration(120.0));

    let state = store.load_state(SRC, Some(KEY));
    assert_eq!(42.0, state.current_time);
    assert_eq!(120.0, state.duration);
}

#[test]
fn test_muted_follows_restored_volume() {
    let storage = Arc::new(MemoryStorage::new());
    write_raw(
        &storage,
        serde_json::json!({
            "currentTime": 30.0,
            "duration": 120.0,
            "volume": 0.8,
            "muted": true,
            "timestamp": now_millis(),
        }),
    );
    let store = store_with(storage);

    let state = store.load_state(SRC, Some(KEY));
    assert_eq!(0.8, state.volume);
    assert!(!state.muted);
}

#[test]
fn test_reset_state_notifies_once() {
    let storage = Arc::new(MemoryStorage::new());
    let store = store_with(storage.clone());
    store.set_state(
        SRC,
        StatePatch::new()
            .duration(120.0)
            .current_time(30.0)
            .volume(0.4),
    );
    assert!(store.save_state(SRC, Some(KEY)));

    let seen = Arc::new(Mutex::new(vec![]));
    let seen_ = seen.clone();
    let _sub = store.subscribe(SRC, move |s| seen_.lock().unwrap().push(s.clone()));
    let next = store.reset_state(
        SRC,
        Some(KEY),
        StatePatch::new()
            .volume(0.4)
            .is_completed(true)
            .action(UserAction::Ended),
    );

    assert!(storage.is_empty());
    assert_eq!(vec![next.clone()], *seen.lock().unwrap());
    assert!(next.is_completed);
    assert_eq!(0.0, next.current_time);
    assert_eq!(0.4, next.volume);
    assert_eq!(UserAction::Ended, next.last_user_action);
}

#[test]
fn test_load_ignores_corrupt_json() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set_item(KEY, "{not json").unwrap();
    let store = store_with(storage);

    let state = store.load_state(SRC, Some(KEY));
    assert_eq!(0.0, state.current_time);
    assert_eq!(UserAction::Init, state.last_user_action);
}

#[test]
fn test_load_fills_missing_fields() {
    let storage = Arc::new(MemoryStorage::new());
    write_raw(
        &storage,
        serde_json::json!({"currentTime": 42.0, "timestamp": now_millis()}),
    );
    let store = store_with(storage);

    let state = store.load_state(SRC, Some(KEY));
    assert_eq!(42.0, state.current_time);
    assert_eq!(1.0, state.playback_rate);
    assert_eq!(1.0, state.volume);
}

#[test]
fn test_clear_state() {
    let storage = Arc::new(MemoryStorage::new());
    let store = store_with(storage.clone());
    store.set_state(
        SRC,
        StatePatch::new()
            .duration(120.0)
            .current_time(30.0)
            .is_playing(true),
    );
    assert!(store.save_state(SRC, Some(KEY)));

    let notified = Arc::new(Mutex::new(None));
    let notified_ = notified.clone();
    let _sub = store.subscribe(SRC, move |s| {
        *notified_.lock().unwrap() = Some(s.last_user_action)
    });
    store.clear_state(SRC, Some(KEY));

    assert!(storage.is_empty());
    let state = store.get_state(SRC);
    assert_eq!(0.0, state.current_time);
    assert!(!state.is_playing);
    assert_eq!(UserAction::Stop, state.last_user_action);
    assert_matches!(*notified.lock().unwrap(), Some(UserAction::Stop));
}

#[test]
fn test_teardown() {
    let store = AudioStateStore::in_memory();
    let count = Arc::new(Mutex::new(0));
    let count_ = count.clone();
    let sub = store.subscribe(SRC, move |_| *count_.lock().unwrap() += 1);
    store.set_state(SRC, StatePatch::new().current_time(3.0));
    store.set_active(Some(SRC));

    store.teardown();
    store.set_state(SRC, StatePatch::new().current_time(4.0));

    assert_eq!(1, *count.lock().unwrap());
    assert_eq!(None, store.get_active());
    assert_eq!(4.0, store.get_state(SRC).current_time);
    // unsubscribing after teardown is harmless
    drop(sub);
}

#[test]
fn test_try_load_reports_missing_entry() {
    let store = AudioStateStore::in_memory();
    store.set_state(SRC, StatePatch::new().current_time(40.0));

    assert_eq!(None, store.try_load_state(SRC, Some(KEY)));
    assert_eq!(None, store.try_load_state(SRC, None));
    assert_eq!(40.0, store.load_state(SRC, Some(KEY)).current_time);
}
