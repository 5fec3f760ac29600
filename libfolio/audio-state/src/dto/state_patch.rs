use super::user_action::UserAction;

/// A partial update merged into an [`AudioState`](super::audio_state::AudioState).
///
/// Unset fields leave the existing value untouched. `muted` is not patchable directly,
/// it always follows `volume`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatePatch {
    pub title: Option<String>,
    pub current_time: Option<f64>,
    pub duration: Option<f64>,
    pub is_playing: Option<bool>,
    pub playback_rate: Option<f64>,
    pub volume: Option<f64>,
    pub is_completed: Option<bool>,
    pub last_user_action: Option<UserAction>,
}

impl StatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn current_time(mut self, seconds: f64) -> Self {
        self.current_time = Some(seconds);
        self
    }

    pub fn duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn is_playing(mut self, is_playing: bool) -> Self {
        self.is_playing = Some(is_playing);
        self
    }

    pub fn playback_rate(mut self, rate: f64) -> Self {
        self.playback_rate = Some(rate);
        self
    }

    pub fn volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn is_completed(mut self, is_completed: bool) -> Self {
        self.is_completed = Some(is_completed);
        self
    }

    pub fn action(mut self, action: UserAction) -> Self {
        self.last_user_action = Some(action);
        self
    }
}
