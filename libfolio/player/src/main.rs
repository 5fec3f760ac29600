use std::time::Duration;

use eyre::Context;
use libfolio_audio_state::audio_state::{AudioStateStore, StoreSettings};
use libfolio_audio_state::storage::FileStorage;
use libfolio_player::MockMedia;
use libfolio_player::folio_player::{PlayerBuilder, Track, TriggerBus};
use tracing::{Level, info};

static STORAGE_DIR_VAR: &str = "FOLIO_STORAGE_DIR";

fn storage() -> eyre::Result<FileStorage> {
    match std::env::var(STORAGE_DIR_VAR) {
        Ok(dir) => FileStorage::new_from_path(&dir)
            .wrap_err_with(|| format!("Error opening storage directory {dir}")),
        Err(_) => FileStorage::try_new().wrap_err("Error opening default storage directory"),
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenvy::from_path("./.env").unwrap_or_default();
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let storage = storage()?;
    info!("Saving positions to {:?}", storage.dir());
    let store = AudioStateStore::new(Box::new(storage), StoreSettings::default());
    let triggers = TriggerBus::new();

    let talks = MockMedia::new().with_duration("/audio/talk-1.mp3", Duration::from_secs(90));
    let playlist = PlayerBuilder::new(store.clone())
        .tracks([
            Track::new("/audio/talk-1.mp3", "Conference talk"),
            Track::new("/audio/talk-2.mp3", "Podcast interview"),
        ])
        .trigger_bus(triggers.clone())
        .build(talks.clone())?;

    let summary_media = MockMedia::new();
    let summary = PlayerBuilder::summary(
        store.clone(),
        Track::new("/audio/summary.mp3", "Profile summary"),
    )
    .build(summary_media.clone())?;

    let mut events = playlist.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            let status = event.status();
            info!(
                "playlist {event}: {} [{}]",
                status.track.title,
                status.progress_label()
            );
        }
    });

    summary.play().await?;
    tokio::time::sleep(Duration::from_millis(50)).await;
    summary_media.advance(Duration::from_secs(20));

    // a page link asks for the second talk; the summary steps aside
    triggers.fire_when_ready("/audio/talk-2.mp3").await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    talks.advance(Duration::from_secs(45));
    playlist.set_main_visible(false).await?;
    playlist.minimize().await?;
    playlist.close_floating().await?;

    let status = playlist.get_current_status().await?;
    info!(
        "Stopped {} at {} with active source {:?}",
        status.track.title,
        status.current_time_label(),
        store.get_active()
    );

    summary.unload().await?;
    summary.join().await?;
    playlist.join().await?;
    store.teardown();
    Ok(())
}

