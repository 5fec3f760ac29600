use std::time::Duration;

use super::floating_layout::FloatingLayout;
use super::playback_phase::PlaybackPhase;
use super::track::Track;
use crate::format::{format_progress, format_time, progress_percent};

#[derive(Clone, Debug, PartialEq)]
pub struct PlayerStatus {
    pub index: usize,
    pub track: Track,
    pub phase: PlaybackPhase,
    pub layout: FloatingLayout,
    pub current_time: Duration,
    pub duration: Option<Duration>,
    pub volume: f64,
    pub muted: bool,
    pub playback_rate: f64,
    pub is_active: bool,
    pub main_visible: bool,
}

impl PlayerStatus {
    pub fn is_playing(&self) -> bool {
        self.phase == PlaybackPhase::Playing
    }

    pub fn progress_percent(&self) -> f64 {
        progress_percent(self.current_time, self.duration)
    }

    pub fn current_time_label(&self) -> String {
        format_time(self.current_time)
    }

    pub fn duration_label(&self) -> String {
        format_time(self.duration.unwrap_or_default())
    }

    /// The `current / total` label shown by the floating layouts.
    pub fn progress_label(&self) -> String {
        format_progress(self.current_time, self.duration)
    }
}
