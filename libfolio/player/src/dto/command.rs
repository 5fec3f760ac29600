use std::time::Duration;

#[derive(Clone, Debug)]
pub(crate) enum Command {
    Play,
    Pause,
    TogglePlayPause,
    Next,
    Previous,
    SelectTrack(usize),
    PlaySource(String),
    Seek(Duration),
    SeekPercent(f64),
    SetVolume(f64),
    ToggleMute,
    SetPlaybackRate(f64),
    SetMainVisible(bool),
    Minimize,
    Expand,
    CloseFloating,
    Unload,
    GetCurrentStatus,
    Shutdown,
}
