pub(crate) mod active_source;
pub(crate) mod audio_state;
pub(crate) mod saved_position;
pub(crate) mod state_patch;
pub(crate) mod user_action;
