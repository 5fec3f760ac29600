use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::audio_state::AudioState;
use super::state_patch::StatePatch;

/// The blob written to storage for a paused or interrupted source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SavedPosition {
    pub current_time: f64,
    pub duration: f64,
    pub playback_rate: f64,
    pub volume: f64,
    pub muted: bool,
    pub timestamp: i64,
}

impl Default for SavedPosition {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            duration: 0.0,
            playback_rate: 1.0,
            volume: 1.0,
            muted: false,
            timestamp: 0,
        }
    }
}

impl SavedPosition {
    pub(crate) fn from_state(state: &AudioState, now: i64) -> Self {
        Self {
            current_time: state.current_time,
            duration: state.duration,
            playback_rate: state.playback_rate,
            volume: state.volume,
            muted: state.muted,
            timestamp: now,
        }
    }

    pub fn is_fresh(&self, now: i64, ttl: Duration) -> bool {
        self.timestamp >= now - ttl.as_millis() as i64
    }

    /// A position is worth resuming past `threshold` and before the last `end_margin`
    /// of a known duration. Values that cannot be a playback position never are.
    pub fn is_resumable(&self, threshold: Duration, end_margin: Duration) -> bool {
        if Duration::try_from_secs_f64(self.current_time).is_err()
            || Duration::try_from_secs_f64(self.duration).is_err()
        {
            return false;
        }
        if self.current_time <= threshold.as_secs_f64() {
            return false;
        }
        self.duration <= 0.0 || self.current_time < self.duration - end_margin.as_secs_f64()
    }

    /// `muted` is not carried over, it follows the restored volume.
    pub(crate) fn to_patch(&self) -> StatePatch {
        let patch = StatePatch::new()
            .current_time(self.current_time)
            .playback_rate(self.playback_rate)
            .volume(self.volume);
        // an entry without a duration must not erase one the media already reported
        if self.duration > 0.0 {
            patch.duration(self.duration)
        } else {
            patch
        }
    }
}
