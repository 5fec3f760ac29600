/// Broadcast whenever the active source changes. `None` means nothing is active.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveSourceChanged {
    pub src: Option<String>,
}
