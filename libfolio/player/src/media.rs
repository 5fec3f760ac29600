use std::time::Duration;

use flume::Sender;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("No source has been loaded")]
    NoSource,
    #[error("Playback was blocked: {0}")]
    PlayBlocked(String),
}

/// Notifications reported by a [`MediaEngine`] after it changes state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaEvent {
    MetadataLoaded,
    TimeUpdate,
    Play,
    Pause,
    Ended,
    Error(String),
}

/// The playback primitives a player drives.
///
/// Engines report state changes by sending [`MediaEvent`]s to the channel passed to
/// [`attach`](MediaEngine::attach) instead of calling back into the player.
pub trait MediaEngine: Send + 'static {
    fn attach(&mut self, events: Sender<MediaEvent>);
    /// Swaps the source. Must leave the engine paused at position zero.
    fn load(&mut self, src: &str);
    fn play(&mut self) -> Result<(), MediaError>;
    fn pause(&mut self);
    fn seek(&mut self, position: Duration);
    fn set_volume(&mut self, volume: f64);
    fn set_playback_rate(&mut self, rate: f64);
    fn current_time(&self) -> Duration;
    /// `None` until metadata for the current source is available.
    fn duration(&self) -> Option<Duration>;
    fn is_paused(&self) -> bool;
}
