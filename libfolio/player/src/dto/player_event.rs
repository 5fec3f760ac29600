use strum::Display;

use super::player_status::PlayerStatus;

#[derive(Clone, Debug, Display)]
pub enum PlayerEvent {
    TrackChanged(PlayerStatus),
    Ready(PlayerStatus),
    Restored(PlayerStatus),
    Play(PlayerStatus),
    Pause(PlayerStatus),
    Seek(PlayerStatus),
    Progress(PlayerStatus),
    VolumeChanged(PlayerStatus),
    RateChanged(PlayerStatus),
    LayoutChanged(PlayerStatus),
    /// Another source became active and this player stepped aside.
    Deactivated(PlayerStatus),
    Ended(PlayerStatus),
}

impl PlayerEvent {
    pub fn status(&self) -> &PlayerStatus {
        match self {
            PlayerEvent::TrackChanged(status)
            | PlayerEvent::Ready(status)
            | PlayerEvent::Restored(status)
            | PlayerEvent::Play(status)
            | PlayerEvent::Pause(status)
            | PlayerEvent::Seek(status)
            | PlayerEvent::Progress(status)
            | PlayerEvent::VolumeChanged(status)
            | PlayerEvent::RateChanged(status)
            | PlayerEvent::LayoutChanged(status)
            | PlayerEvent::Deactivated(status)
            | PlayerEvent::Ended(status) => status,
        }
    }
}
