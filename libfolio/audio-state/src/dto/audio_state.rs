use serde::Serialize;
use tracing::warn;

use super::state_patch::StatePatch;
use super::user_action::UserAction;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioState {
    pub src: String,
    pub title: Option<String>,
    pub current_time: f64,
    pub duration: f64,
    pub is_playing: bool,
    pub playback_rate: f64,
    pub volume: f64,
    pub muted: bool,
    pub last_updated: i64,
    pub is_completed: bool,
    pub last_user_action: UserAction,
}

impl AudioState {
    pub(crate) fn base(src: &str, now: i64) -> Self {
        Self {
            src: src.to_owned(),
            title: None,
            current_time: 0.0,
            duration: 0.0,
            is_playing: false,
            playback_rate: 1.0,
            volume: 1.0,
            muted: false,
            last_updated: now,
            is_completed: false,
            last_user_action: UserAction::Init,
        }
    }

    pub(crate) fn merge(&self, patch: &StatePatch, now: i64) -> Self {
        let mut next = self.clone();
        if let Some(title) = &patch.title {
            next.title = Some(title.clone());
        }
        if let Some(current_time) = non_negative(patch.current_time, "current_time") {
            next.current_time = current_time;
        }
        if let Some(duration) = non_negative(patch.duration, "duration") {
            next.duration = duration;
        }
        if let Some(is_playing) = patch.is_playing {
            next.is_playing = is_playing;
        }
        if let Some(rate) = patch.playback_rate {
            if rate.is_finite() && rate > 0.0 {
                next.playback_rate = rate;
            } else {
                warn!("Ignoring invalid playback rate {rate} for {}", self.src);
            }
        }
        if let Some(volume) = patch.volume {
            if volume.is_finite() {
                next.volume = volume.clamp(0.0, 1.0);
                next.muted = is_silent(next.volume);
            } else {
                warn!("Ignoring invalid volume {volume} for {}", self.src);
            }
        }
        if let Some(is_completed) = patch.is_completed {
            next.is_completed = is_completed;
        }
        if let Some(action) = patch.last_user_action {
            next.last_user_action = action;
        }
        next.last_updated = now;
        next
    }

    /// Whether the duration has been reported yet.
    pub fn has_duration(&self) -> bool {
        self.duration > 0.0
    }
}

/// Volume that rounds to zero percent counts as muted.
pub fn is_silent(volume: f64) -> bool {
    (volume * 100.0).round() == 0.0
}

fn non_negative(value: Option<f64>, field: &str) -> Option<f64> {
    match value {
        Some(v) if v.is_finite() => Some(v.max(0.0)),
        Some(v) => {
            warn!("Ignoring non-finite {field} {v}");
            None
        }
        None => None,
    }
}
