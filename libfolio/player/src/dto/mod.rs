pub(crate) mod command;
pub(crate) mod floating_layout;
pub(crate) mod playback_phase;
pub(crate) mod player_event;
pub(crate) mod player_response;
pub(crate) mod player_status;
pub(crate) mod track;
