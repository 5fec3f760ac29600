use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use flume::Sender;
use tap::TapFallible;
use tracing::{debug, warn};

use crate::media::{MediaEngine, MediaError, MediaEvent};

#[derive(Debug)]
struct MockState {
    events: Option<Sender<MediaEvent>>,
    src: Option<String>,
    durations: HashMap<String, Duration>,
    default_duration: Duration,
    position: Duration,
    paused: bool,
    volume: f64,
    playback_rate: f64,
    block_play: bool,
    load_count: usize,
}

impl MockState {
    fn emit(&self, event: MediaEvent) {
        if let Some(events) = &self.events {
            let _ = events
                .send(event)
                .tap_err(|e| warn!("Error sending media event: {e:?}"));
        }
    }

    fn duration(&self) -> Option<Duration> {
        let src = self.src.as_ref()?;
        Some(
            self.durations
                .get(src)
                .copied()
                .unwrap_or(self.default_duration),
        )
    }
}

/// An in-process engine with a manually advanced clock.
///
/// Clones share the same underlying state, so one clone can be handed to a player
/// while another drives playback forward.
#[derive(Clone, Debug)]
pub struct MockMedia {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockMedia {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMedia {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                events: None,
                src: None,
                durations: HashMap::new(),
                default_duration: Duration::from_secs(120),
                position: Duration::ZERO,
                paused: true,
                volume: 1.0,
                playback_rate: 1.0,
                block_play: false,
                load_count: 0,
            })),
        }
    }

    pub fn with_duration(self, src: impl Into<String>, duration: Duration) -> Self {
        self.lock().durations.insert(src.into(), duration);
        self
    }

    pub fn with_default_duration(self, duration: Duration) -> Self {
        self.lock().default_duration = duration;
        self
    }

    /// Rejects every `play` call, like a browser blocking autoplay.
    pub fn block_play(&self, block: bool) {
        self.lock().block_play = block;
    }

    /// Moves playback forward, scaled by the playback rate. Reaching the end pauses
    /// and reports `Ended`.
    pub fn advance(&self, by: Duration) {
        let mut state = self.lock();
        if state.paused {
            return;
        }
        let Some(duration) = state.duration() else {
            return;
        };
        let position = state.position + by.mul_f64(state.playback_rate);
        if position >= duration {
            state.position = duration;
            state.paused = true;
            state.emit(MediaEvent::TimeUpdate);
            state.emit(MediaEvent::Pause);
            state.emit(MediaEvent::Ended);
        } else {
            state.position = position;
            state.emit(MediaEvent::TimeUpdate);
        }
    }

    pub fn fail(&self, message: impl Into<String>) {
        self.lock().emit(MediaEvent::Error(message.into()));
    }

    pub fn current_src(&self) -> Option<String> {
        self.lock().src.clone()
    }

    pub fn position(&self) -> Duration {
        self.lock().position
    }

    pub fn volume(&self) -> f64 {
        self.lock().volume
    }

    pub fn playback_rate(&self) -> f64 {
        self.lock().playback_rate
    }

    pub fn load_count(&self) -> usize {
        self.lock().load_count
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MediaEngine for MockMedia {
    fn attach(&mut self, events: Sender<MediaEvent>) {
        self.lock().events = Some(events);
    }

    fn load(&mut self, src: &str) {
        let mut state = self.lock();
        debug!("Loading {src}");
        state.src = Some(src.to_owned());
        state.position = Duration::ZERO;
        state.paused = true;
        state.load_count += 1;
        state.emit(MediaEvent::MetadataLoaded);
    }

    fn play(&mut self) -> Result<(), MediaError> {
        let mut state = self.lock();
        if state.src.is_none() {
            return Err(MediaError::NoSource);
        }
        if state.block_play {
            return Err(MediaError::PlayBlocked("autoplay not allowed".to_owned()));
        }
        if state.paused {
            // playing after the end starts over
            if state.duration().is_some_and(|d| state.position >= d) {
                state.position = Duration::ZERO;
            }
            state.paused = false;
            state.emit(MediaEvent::Play);
        }
        Ok(())
    }

    fn pause(&mut self) {
        let mut state = self.lock();
        if !state.paused {
            state.paused = true;
            state.emit(MediaEvent::Pause);
        }
    }

    fn seek(&mut self, position: Duration) {
        let mut state = self.lock();
        let duration = state.duration().unwrap_or_default();
        state.position = position.min(duration);
        state.emit(MediaEvent::TimeUpdate);
    }

    fn set_volume(&mut self, volume: f64) {
        self.lock().volume = volume;
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.lock().playback_rate = rate;
    }

    fn current_time(&self) -> Duration {
        self.lock().position
    }

    fn duration(&self) -> Option<Duration> {
        self.lock().duration()
    }

    fn is_paused(&self) -> bool {
        self.lock().paused
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_advance_to_end() {
        let (tx, rx) = flume::unbounded();
        let mut media = MockMedia::new().with_duration("/a.mp3", Duration::from_secs(10));
        media.attach(tx);
        media.load("/a.mp3");
        media.play().unwrap();
        media.advance(Duration::from_secs(4));
        media.advance(Duration::from_secs(20));

        assert_eq!(
            vec![
                MediaEvent::MetadataLoaded,
                MediaEvent::Play,
                MediaEvent::TimeUpdate,
                MediaEvent::TimeUpdate,
                MediaEvent::Pause,
                MediaEvent::Ended,
            ],
            rx.drain().collect::<Vec<_>>()
        );
        assert!(media.is_paused());
        assert_eq!(Duration::from_secs(10), media.position());
    }

    #[test]
    fn test_blocked_play() {
        let mut media = MockMedia::new();
        assert_eq!(Err(MediaError::NoSource), media.play());
        media.load("/a.mp3");
        media.block_play(true);
        assert_matches::assert_matches!(media.play(), Err(MediaError::PlayBlocked(_)));
        assert!(media.is_paused());
    }
}
