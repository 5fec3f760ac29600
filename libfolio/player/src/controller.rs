use std::sync::Arc;
use std::time::Duration;

use libfolio_audio_state::audio_state::{
    ActiveSourceChanged, AudioStateStore, StatePatch, UserAction, is_silent,
};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::dto::floating_layout::FloatingLayout;
use crate::dto::playback_phase::PlaybackPhase;
use crate::dto::player_event::PlayerEvent;
use crate::dto::player_status::PlayerStatus;
use crate::dto::track::Track;
use crate::media::{MediaEngine, MediaEvent};
use crate::settings::Settings;
use crate::timers::{TimerEvent, Timers};
use crate::trigger::TriggerRegistration;

/// All state for one player widget. Only ever touched from the player's own task.
pub(crate) struct Controller<M: MediaEngine> {
    tracks: Vec<Track>,
    index: usize,
    loaded: bool,
    media: M,
    store: Arc<AudioStateStore>,
    settings: Settings,
    event_tx: broadcast::Sender<PlayerEvent>,
    phase: PlaybackPhase,
    layout: FloatingLayout,
    main_visible: bool,
    user_hiding: bool,
    pending_autoplay: bool,
    volume: f64,
    previous_volume: f64,
    playback_rate: f64,
    timers: Timers,
    _registration: Option<TriggerRegistration>,
}

impl<M: MediaEngine> Controller<M> {
    pub(crate) fn new(
        tracks: Vec<Track>,
        media: M,
        store: Arc<AudioStateStore>,
        settings: Settings,
        event_tx: broadcast::Sender<PlayerEvent>,
        registration: Option<TriggerRegistration>,
    ) -> Self {
        let index = settings.default_index.min(tracks.len().saturating_sub(1));
        Self {
            tracks,
            index,
            loaded: false,
            media,
            store,
            settings,
            event_tx,
            phase: PlaybackPhase::Idle,
            layout: FloatingLayout::Hidden,
            main_visible: true,
            user_hiding: false,
            pending_autoplay: false,
            volume: 1.0,
            previous_volume: 1.0,
            playback_rate: 1.0,
            timers: Timers::default(),
            _registration: registration,
        }
    }

    fn src(&self) -> &str {
        &self.tracks[self.index].src
    }

    fn storage_key(&self) -> String {
        self.settings.storage_key(self.src())
    }

    fn is_active(&self) -> bool {
        self.store.get_active().as_deref() == Some(self.src())
    }

    pub(crate) fn status(&self) -> PlayerStatus {
        PlayerStatus {
            index: self.index,
            track: self.tracks[self.index].clone(),
            phase: self.phase,
            layout: self.layout,
            current_time: self.media.current_time(),
            duration: self.media.duration(),
            volume: self.volume,
            muted: is_silent(self.volume),
            playback_rate: self.playback_rate,
            is_active: self.is_active(),
            main_visible: self.main_visible,
        }
    }

    fn emit(&self, event: fn(PlayerStatus) -> PlayerEvent) {
        // nobody listening is fine
        let _ = self.event_tx.send(event(self.status()));
    }

    /// Loads the starting track without playing it.
    pub(crate) fn init(&mut self) {
        self.load_current(false);
    }

    fn load_current(&mut self, autoplay: bool) {
        let track = self.tracks[self.index].clone();
        info!("Loading track {} ({})", self.index, track.src);
        self.phase = PlaybackPhase::Loading;
        self.pending_autoplay = autoplay;
        self.loaded = true;
        self.media.load(&track.src);
        self.store.set_state(
            &track.src,
            StatePatch::new()
                .title(track.title)
                .is_playing(false)
                .volume(self.volume)
                .playback_rate(self.playback_rate),
        );
        self.emit(PlayerEvent::TrackChanged);
    }

    pub(crate) fn select_track(&mut self, index: usize, autoplay: bool) {
        let bounded = index.min(self.tracks.len() - 1);
        if bounded == self.index && self.loaded {
            if autoplay {
                self.start_playback();
            }
            return;
        }

        self.timers.stop_autosave();
        self.save_position();
        let previous = self.src().to_owned();
        self.store.set_state(
            &previous,
            StatePatch::new()
                .is_playing(false)
                .action(UserAction::Stop),
        );
        self.index = bounded;
        self.load_current(autoplay);
    }

    pub(crate) fn next(&mut self) {
        self.select_track(self.index + 1, true);
    }

    pub(crate) fn previous(&mut self) {
        self.select_track(self.index.saturating_sub(1), true);
    }

    pub(crate) fn play_source(&mut self, src: &str) {
        match self.tracks.iter().position(|t| t.src == src) {
            Some(index) => self.select_track(index, true),
            None => debug!("{src} is not in this playlist"),
        }
    }

    pub(crate) fn start_playback(&mut self) {
        if self.phase == PlaybackPhase::Loading {
            // plays once metadata arrives
            self.pending_autoplay = true;
            return;
        }
        self.user_hiding = false;
        self.store.set_active(Some(self.src()));
        if let Err(e) = self.media.play() {
            warn!("Unable to play {}: {e}", self.src());
        }
    }

    pub(crate) fn pause(&mut self) {
        self.pending_autoplay = false;
        self.media.pause();
    }

    pub(crate) fn toggle_play_pause(&mut self) {
        if self.media.is_paused() {
            self.start_playback();
        } else {
            self.pause();
        }
    }

    pub(crate) fn seek(&mut self, position: Duration) {
        let Some(duration) = self.media.duration() else {
            warn!("Cannot seek {} before metadata is loaded", self.src());
            return;
        };
        let position = position.min(duration);
        self.media.seek(position);
        self.store.set_state(
            self.src(),
            StatePatch::new()
                .current_time(position.as_secs_f64())
                .action(UserAction::Seek),
        );
        self.emit(PlayerEvent::Seek);
    }

    pub(crate) fn seek_percent(&mut self, percent: f64) {
        if !percent.is_finite() {
            return;
        }
        if let Some(duration) = self.media.duration() {
            self.seek(duration.mul_f64(percent.clamp(0.0, 100.0) / 100.0));
        }
    }

    pub(crate) fn set_volume(&mut self, volume: f64) {
        if !volume.is_finite() {
            warn!("Ignoring invalid volume {volume}");
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
        self.media.set_volume(self.volume);
        self.store
            .set_state(self.src(), StatePatch::new().volume(self.volume));
        self.emit(PlayerEvent::VolumeChanged);
    }

    pub(crate) fn toggle_mute(&mut self) {
        if self.volume > 0.0 {
            self.previous_volume = self.volume;
            self.set_volume(0.0);
        } else {
            self.set_volume(self.previous_volume);
        }
    }

    pub(crate) fn set_playback_rate(&mut self, rate: f64) {
        if !rate.is_finite() || rate <= 0.0 {
            warn!("Ignoring invalid playback rate {rate}");
            return;
        }
        self.playback_rate = rate;
        self.media.set_playback_rate(rate);
        self.store
            .set_state(self.src(), StatePatch::new().playback_rate(rate));
        self.emit(PlayerEvent::RateChanged);
    }

    fn set_layout(&mut self, layout: FloatingLayout) {
        if self.layout != layout {
            debug!("Layout {} -> {layout}", self.layout);
            self.layout = layout;
            self.emit(PlayerEvent::LayoutChanged);
        }
    }

    /// Shows the mini player if the main player is scrolled away and there is
    /// something worth showing.
    fn refresh_floating(&mut self) {
        let has_progress = !self.media.is_paused() || !self.media.current_time().is_zero();
        if !self.main_visible
            && has_progress
            && !self.user_hiding
            && self.layout == FloatingLayout::Hidden
        {
            self.set_layout(FloatingLayout::Mini);
        }
    }

    pub(crate) fn set_main_visible(&mut self, visible: bool) {
        self.main_visible = visible;
        if visible {
            self.timers.schedule_hide(self.settings.visibility_debounce);
        } else {
            self.timers.cancel_hide();
            self.refresh_floating();
        }
    }

    pub(crate) fn minimize(&mut self) {
        if self.layout == FloatingLayout::Mini {
            self.set_layout(FloatingLayout::Minimized);
        }
    }

    pub(crate) fn expand(&mut self) {
        if self.layout == FloatingLayout::Minimized {
            self.set_layout(FloatingLayout::Mini);
        }
    }

    pub(crate) fn close_floating(&mut self) {
        self.pause();
        self.timers.stop_autosave();
        self.save_position();
        self.user_hiding = true;
        self.set_layout(FloatingLayout::Hidden);
        if self.is_active() {
            self.store.set_active(None);
        }
        self.phase = PlaybackPhase::Idle;
    }

    pub(crate) fn unload(&mut self) {
        if !self.media.is_paused() {
            self.save_position();
        }
    }

    pub(crate) fn shutdown(&mut self) {
        self.unload();
        self.timers.clear();
        self.media.pause();
        if self.is_active() {
            self.store.set_active(None);
        }
    }

    /// Mirrors the engine position into the store and persists it.
    fn save_position(&mut self) {
        let src = self.src().to_owned();
        self.store.set_state(
            &src,
            StatePatch::new().current_time(self.media.current_time().as_secs_f64()),
        );
        let key = self.storage_key();
        if self.store.save_state(&src, Some(&key)) {
            debug!("Saved position for {src}");
        }
    }

    pub(crate) fn on_media_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::MetadataLoaded => self.on_metadata_loaded(),
            MediaEvent::TimeUpdate => {
                self.store.set_state(
                    self.src(),
                    StatePatch::new().current_time(self.media.current_time().as_secs_f64()),
                );
                self.emit(PlayerEvent::Progress);
            }
            MediaEvent::Play => {
                self.phase = PlaybackPhase::Playing;
                self.store.set_state(
                    self.src(),
                    StatePatch::new()
                        .is_playing(true)
                        .is_completed(false)
                        .action(UserAction::Play),
                );
                self.timers.start_autosave(self.settings.autosave_interval);
                self.refresh_floating();
                self.emit(PlayerEvent::Play);
            }
            MediaEvent::Pause => {
                if self.phase != PlaybackPhase::Idle {
                    self.phase = PlaybackPhase::Paused;
                }
                self.timers.stop_autosave();
                self.store.set_state(
                    self.src(),
                    StatePatch::new()
                        .is_playing(false)
                        .action(UserAction::Pause),
                );
                self.save_position();
                self.emit(PlayerEvent::Pause);
            }
            MediaEvent::Ended => self.on_ended(),
            MediaEvent::Error(message) => {
                error!("Media error for {}: {message}", self.src());
                self.pending_autoplay = false;
                if self.phase == PlaybackPhase::Loading {
                    self.phase = PlaybackPhase::Ready;
                }
            }
        }
    }

    fn on_metadata_loaded(&mut self) {
        if self.phase == PlaybackPhase::Loading {
            self.phase = PlaybackPhase::Ready;
        }
        let src = self.src().to_owned();
        let duration = self.media.duration().unwrap_or_default();
        self.store
            .set_state(&src, StatePatch::new().duration(duration.as_secs_f64()));
        self.emit(PlayerEvent::Ready);

        let key = self.storage_key();
        if let Some(restored) = self.store.try_load_state(&src, Some(&key)) {
            let media_duration = self.media.duration();
            let position = match Duration::try_from_secs_f64(restored.current_time) {
                Ok(position) => media_duration.map_or(position, |d| position.min(d)),
                Err(e) => {
                    warn!("Ignoring stored position for {src}: {e}");
                    Duration::ZERO
                }
            };
            self.media.seek(position);
            // keep the store within what the media reported
            let mut corrected = StatePatch::new().current_time(position.as_secs_f64());
            if let Some(d) = media_duration {
                corrected = corrected.duration(d.as_secs_f64());
            }
            self.store.set_state(&src, corrected);
            self.playback_rate = restored.playback_rate;
            self.media.set_playback_rate(restored.playback_rate);
            self.volume = restored.volume;
            self.media.set_volume(restored.volume);
            self.emit(PlayerEvent::Restored);
        }

        if self.pending_autoplay {
            self.pending_autoplay = false;
            self.start_playback();
        }
    }

    fn on_ended(&mut self) {
        info!("{} finished", self.src());
        self.timers.stop_autosave();
        let src = self.src().to_owned();
        let key = self.storage_key();
        let duration = self.media.duration().unwrap_or_default();
        self.store.reset_state(
            &src,
            Some(&key),
            StatePatch::new()
                .title(self.tracks[self.index].title.clone())
                .duration(duration.as_secs_f64())
                .volume(self.volume)
                .playback_rate(self.playback_rate)
                .is_completed(true)
                .action(UserAction::Ended),
        );
        self.phase = PlaybackPhase::Ended;
        if self.is_active() {
            self.store.set_active(None);
        }
        self.set_layout(FloatingLayout::Hidden);
        self.emit(PlayerEvent::Ended);
    }

    pub(crate) fn on_active_changed(&mut self, event: ActiveSourceChanged) {
        let mine = self.src();
        if event.src.as_deref() == Some(mine) || self.is_active() {
            return;
        }
        if self.media.is_paused() && self.layout == FloatingLayout::Hidden && !self.pending_autoplay
        {
            return;
        }
        info!(
            "Deactivating {mine}, active source is now {:?}",
            event.src
        );
        self.pause();
        self.user_hiding = true;
        self.set_layout(FloatingLayout::Hidden);
        self.emit(PlayerEvent::Deactivated);
    }

    pub(crate) fn on_trigger(&mut self, src: &str) {
        self.play_source(src);
    }

    pub(crate) async fn next_timer(&mut self) -> TimerEvent {
        self.timers.next().await
    }

    pub(crate) fn on_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::Autosave => {
                if !self.media.is_paused() {
                    self.save_position();
                }
            }
            TimerEvent::HideFloating => {
                if self.main_visible {
                    self.set_layout(FloatingLayout::Hidden);
                    self.user_hiding = false;
                }
            }
        }
    }
}
