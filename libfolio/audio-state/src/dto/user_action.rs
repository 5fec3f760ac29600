use serde::{Deserialize, Serialize};
use strum::Display;

/// The last playback action that caused a state change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserAction {
    Play,
    Pause,
    Seek,
    Stop,
    Ended,
    #[default]
    Init,
}
