use strum::Display;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display)]
pub enum PlaybackPhase {
    #[default]
    Idle,
    /// Media swap in progress, waiting for metadata.
    Loading,
    Ready,
    Playing,
    Paused,
    Ended,
}
