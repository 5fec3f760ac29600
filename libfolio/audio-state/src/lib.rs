mod clock;
mod dto;
mod settings;
pub mod storage;
mod store;
mod subscription;

pub mod audio_state {
    pub use crate::dto::active_source::ActiveSourceChanged;
    pub use crate::dto::audio_state::{is_silent, AudioState};
    pub use crate::dto::saved_position::SavedPosition;
    pub use crate::dto::state_patch::StatePatch;
    pub use crate::dto::user_action::UserAction;
    pub use crate::settings::StoreSettings;
    pub use crate::store::AudioStateStore;
    pub use crate::subscription::Subscription;
}

#[cfg(test)]
#[path = "./store_test.rs"]
mod store_test;
