use std::time::Duration;

pub(crate) static PLAYLIST_PREFIX: &str = "playlist-position-";
pub(crate) static SUMMARY_PREFIX: &str = "summary-position-";

#[derive(Clone, Debug)]
pub struct Settings {
    /// How often the position is saved while playing.
    pub autosave_interval: Duration,
    /// Delay before the floating layouts hide once the main player is back in view.
    pub visibility_debounce: Duration,
    pub trigger_poll_interval: Duration,
    pub trigger_poll_attempts: u32,
    /// Prepended to the track source to build its storage key.
    pub storage_key_prefix: String,
    pub default_index: usize,
}

impl Settings {
    pub fn summary() -> Self {
        Self {
            storage_key_prefix: SUMMARY_PREFIX.to_owned(),
            ..Default::default()
        }
    }

    pub(crate) fn storage_key(&self, src: &str) -> String {
        format!("{}{src}", self.storage_key_prefix)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            autosave_interval: Duration::from_secs(5),
            visibility_debounce: Duration::from_millis(300),
            trigger_poll_interval: Duration::from_millis(100),
            trigger_poll_attempts: 20,
            storage_key_prefix: PLAYLIST_PREFIX.to_owned(),
            default_index: 0,
        }
    }
}
