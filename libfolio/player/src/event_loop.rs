use libfolio_audio_state::audio_state::ActiveSourceChanged;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{error, info, warn};

use crate::controller::Controller;
use crate::dto::command::Command;
use crate::dto::player_response::PlayerResponse;
use crate::media::{MediaEngine, MediaEvent};
use crate::request_channel::RequestReceiver;

pub(crate) async fn main_loop<M: MediaEngine>(
    mut receiver: RequestReceiver<Command, PlayerResponse>,
    media_rx: flume::Receiver<MediaEvent>,
    mut active_rx: broadcast::Receiver<ActiveSourceChanged>,
    mut trigger_rx: Option<broadcast::Receiver<String>>,
    mut controller: Controller<M>,
) {
    loop {
        // Engine events are drained first so commands always see the latest media state
        tokio::select! {
            biased;

            Ok(event) = media_rx.recv_async() => {
                controller.on_media_event(event);
            }
            active = active_rx.recv() => match active {
                Ok(event) => controller.on_active_changed(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Missed {skipped} activation messages");
                }
                Err(RecvError::Closed) => {
                    error!("Activation channel closed");
                    break;
                }
            },
            command = receiver.recv_async() => {
                let Ok(command) = command else {
                    info!("All player handles dropped");
                    break;
                };
                if !handle_command(&mut receiver, &mut controller, command) {
                    break;
                }
            }
            src = next_trigger(&mut trigger_rx) => {
                controller.on_trigger(&src);
            }
            timer = controller.next_timer() => {
                controller.on_timer(timer);
            }
        }
    }
    controller.shutdown();
    info!("Player loop completed");
}

fn handle_command<M: MediaEngine>(
    receiver: &mut RequestReceiver<Command, PlayerResponse>,
    controller: &mut Controller<M>,
    command: Command,
) -> bool {
    info!("Got command {command:?}");
    match command {
        Command::Play => controller.start_playback(),
        Command::Pause => controller.pause(),
        Command::TogglePlayPause => controller.toggle_play_pause(),
        Command::Next => controller.next(),
        Command::Previous => controller.previous(),
        Command::SelectTrack(index) => controller.select_track(index, true),
        Command::PlaySource(src) => controller.play_source(&src),
        Command::Seek(position) => controller.seek(position),
        Command::SeekPercent(percent) => controller.seek_percent(percent),
        Command::SetVolume(volume) => controller.set_volume(volume),
        Command::ToggleMute => controller.toggle_mute(),
        Command::SetPlaybackRate(rate) => controller.set_playback_rate(rate),
        Command::SetMainVisible(visible) => controller.set_main_visible(visible),
        Command::Minimize => controller.minimize(),
        Command::Expand => controller.expand(),
        Command::CloseFloating => controller.close_floating(),
        Command::Unload => controller.unload(),
        Command::GetCurrentStatus => {
            if let Err(e) = receiver.respond(PlayerResponse::StatusResponse(controller.status())) {
                error!("Error sending player status: {e:?}");
            }
        }
        Command::Shutdown => return false,
    }
    true
}

async fn next_trigger(trigger_rx: &mut Option<broadcast::Receiver<String>>) -> String {
    let Some(trigger_rx) = trigger_rx else {
        return std::future::pending().await;
    };
    loop {
        match trigger_rx.recv().await {
            Ok(src) => return src,
            Err(RecvError::Lagged(skipped)) => warn!("Missed {skipped} trigger requests"),
            Err(RecvError::Closed) => return std::future::pending().await,
        }
    }
}
