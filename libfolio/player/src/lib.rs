mod controller;
mod dto;
mod event_loop;
mod format;
mod media;
mod mock_media;
mod request_channel;
mod settings;
mod timers;
mod trigger;
pub use format::{format_progress, format_time};
pub use media::{MediaEngine, MediaError, MediaEvent};
pub use mock_media::MockMedia;

pub mod folio_player {
    use std::sync::Arc;
    use std::time::Duration;

    use derivative::Derivative;
    use libfolio_audio_state::audio_state::AudioStateStore;
    use tap::TapFallible;
    use thiserror::Error;
    use tokio::sync::broadcast;
    use tokio::task::JoinHandle;
    use tracing::{error, info, warn};

    use crate::controller::Controller;
    use crate::dto::command::Command;
    pub use crate::dto::floating_layout::FloatingLayout;
    pub use crate::dto::playback_phase::PlaybackPhase;
    pub use crate::dto::player_event::PlayerEvent;
    use crate::dto::player_response::PlayerResponse;
    pub use crate::dto::player_status::PlayerStatus;
    pub use crate::dto::track::Track;
    use crate::event_loop::main_loop;
    use crate::media::MediaEngine;
    use crate::request_channel::{RequestSender, request_channel};
    pub use crate::settings::Settings;
    pub use crate::trigger::TriggerBus;

    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum PlayerError {
        #[error("Playlist has no playable tracks")]
        EmptyPlaylist,
        #[error("Player task is no longer running")]
        Disconnected,
        #[error("Player task failed: {0}")]
        Join(String),
    }

    /// Configures one player widget before it starts.
    #[derive(Derivative)]
    #[derivative(Debug)]
    pub struct PlayerBuilder {
        #[derivative(Debug = "ignore")]
        store: Arc<AudioStateStore>,
        tracks: Vec<Track>,
        settings: Settings,
        trigger_bus: Option<TriggerBus>,
    }

    impl PlayerBuilder {
        pub fn new(store: Arc<AudioStateStore>) -> Self {
            Self {
                store,
                tracks: vec![],
                settings: Settings::default(),
                trigger_bus: None,
            }
        }

        /// A single-track player whose positions are stored under the summary prefix.
        pub fn summary(store: Arc<AudioStateStore>, track: Track) -> Self {
            Self::new(store).track(track).settings(Settings::summary())
        }

        pub fn track(mut self, track: Track) -> Self {
            self.tracks.push(track);
            self
        }

        pub fn tracks(mut self, tracks: impl IntoIterator<Item = Track>) -> Self {
            self.tracks.extend(tracks);
            self
        }

        pub fn settings(mut self, settings: Settings) -> Self {
            self.settings = settings;
            self
        }

        pub fn trigger_bus(mut self, trigger_bus: TriggerBus) -> Self {
            self.trigger_bus = Some(trigger_bus);
            self
        }

        /// Starts the player task. Must be called from within a tokio runtime.
        pub fn build<M: MediaEngine>(self, mut media: M) -> Result<PlaylistPlayer, PlayerError> {
            let tracks: Vec<_> = self
                .tracks
                .into_iter()
                .filter(|t| !t.src.is_empty())
                .collect();
            if tracks.is_empty() {
                error!("Refusing to start a player without any tracks");
                return Err(PlayerError::EmptyPlaylist);
            }

            let (event_tx, _) = broadcast::channel(64);
            let (cmd_tx, cmd_rx) = request_channel();
            let (media_tx, media_rx) = flume::unbounded();
            media.attach(media_tx);

            let active_rx = self.store.subscribe_active();
            let (trigger_rx, registration) = match &self.trigger_bus {
                Some(bus) => (
                    Some(bus.subscribe()),
                    Some(bus.register(tracks.iter().map(|t| t.src.clone()).collect())),
                ),
                None => (None, None),
            };

            let mut controller = Controller::new(
                tracks,
                media,
                self.store,
                self.settings,
                event_tx.clone(),
                registration,
            );
            controller.init();
            let task = tokio::spawn(main_loop(
                cmd_rx,
                media_rx,
                active_rx,
                trigger_rx,
                controller,
            ));

            Ok(PlaylistPlayer {
                cmd_sender: cmd_tx,
                event_tx,
                task: Some(task),
            })
        }
    }

    #[derive(Derivative)]
    #[derivative(Debug)]
    pub struct PlaylistPlayer {
        cmd_sender: RequestSender<Command, PlayerResponse>,
        event_tx: broadcast::Sender<PlayerEvent>,
        #[derivative(Debug = "ignore")]
        task: Option<JoinHandle<()>>,
    }

    impl PlaylistPlayer {
        pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
            self.event_tx.subscribe()
        }

        pub async fn play(&self) -> Result<(), PlayerError> {
            self.cmd_sender.send_async(Command::Play).await
        }

        pub async fn pause(&self) -> Result<(), PlayerError> {
            self.cmd_sender.send_async(Command::Pause).await
        }

        pub async fn toggle_play_pause(&self) -> Result<(), PlayerError> {
            self.cmd_sender.send_async(Command::TogglePlayPause).await
        }

        pub async fn next(&self) -> Result<(), PlayerError> {
            self.cmd_sender.send_async(Command::Next).await
        }

        pub async fn previous(&self) -> Result<(), PlayerError> {
            self.cmd_sender.send_async(Command::Previous).await
        }

        /// Switches to the track at `index` (clamped to the playlist) and plays it.
        pub async fn select_track(&self, index: usize) -> Result<(), PlayerError> {
            self.cmd_sender
                .send_async(Command::SelectTrack(index))
                .await
        }

        /// Plays the track with exactly this source. Does nothing if there is none.
        pub async fn play_source(&self, src: impl Into<String>) -> Result<(), PlayerError> {
            self.cmd_sender
                .send_async(Command::PlaySource(src.into()))
                .await
        }

        pub async fn seek(&self, position: Duration) -> Result<(), PlayerError> {
            self.cmd_sender.send_async(Command::Seek(position)).await
        }

        pub async fn seek_percent(&self, percent: f64) -> Result<(), PlayerError> {
            self.cmd_sender
                .send_async(Command::SeekPercent(percent))
                .await
        }

        pub async fn set_volume(&self, volume: f64) -> Result<(), PlayerError> {
            self.cmd_sender
                .send_async(Command::SetVolume(volume))
                .await
        }

        pub async fn toggle_mute(&self) -> Result<(), PlayerError> {
            self.cmd_sender.send_async(Command::ToggleMute).await
        }

        pub async fn set_playback_rate(&self, rate: f64) -> Result<(), PlayerError> {
            self.cmd_sender
                .send_async(Command::SetPlaybackRate(rate))
                .await
        }

        /// Reports whether the main player region is on screen.
        pub async fn set_main_visible(&self, visible: bool) -> Result<(), PlayerError> {
            self.cmd_sender
                .send_async(Command::SetMainVisible(visible))
                .await
        }

        pub async fn minimize(&self) -> Result<(), PlayerError> {
            self.cmd_sender.send_async(Command::Minimize).await
        }

        pub async fn expand(&self) -> Result<(), PlayerError> {
            self.cmd_sender.send_async(Command::Expand).await
        }

        pub async fn close_floating(&self) -> Result<(), PlayerError> {
            self.cmd_sender.send_async(Command::CloseFloating).await
        }

        /// Saves the position if playing, as when the page goes away.
        pub async fn unload(&self) -> Result<(), PlayerError> {
            self.cmd_sender.send_async(Command::Unload).await
        }

        pub async fn get_current_status(&self) -> Result<PlayerStatus, PlayerError> {
            match self
                .cmd_sender
                .get_response(Command::GetCurrentStatus)
                .await?
            {
                PlayerResponse::StatusResponse(status) => Ok(status),
            }
        }

        pub async fn join(mut self) -> Result<(), PlayerError> {
            info!("Joining player instance");
            self.cmd_sender.send_async(Command::Shutdown).await?;
            if let Some(task) = self.task.take() {
                task.await
                    .map_err(|e| PlayerError::Join(e.to_string()))?;
            }
            Ok(())
        }
    }

    impl Drop for PlaylistPlayer {
        fn drop(&mut self) {
            if self.task.is_some() {
                let _ = self
                    .cmd_sender
                    .send(Command::Shutdown)
                    .tap_err(|_| warn!("Player task already stopped"));
            }
        }
    }
}
