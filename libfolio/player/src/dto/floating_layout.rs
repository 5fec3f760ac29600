use strum::Display;

/// Which condensed layout is showing while the main player is out of view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display)]
pub enum FloatingLayout {
    #[default]
    Hidden,
    Mini,
    Minimized,
}
