use std::future;
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at, sleep_until};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TimerEvent {
    Autosave,
    HideFloating,
}

/// Owned timer handles for one player. Dropping a handle cancels it.
#[derive(Debug, Default)]
pub(crate) struct Timers {
    autosave: Option<Interval>,
    hide_floating_at: Option<Instant>,
}

impl Timers {
    pub(crate) fn start_autosave(&mut self, period: Duration) {
        // first tick one full period from now
        let mut autosave = interval_at(Instant::now() + period, period);
        autosave.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.autosave = Some(autosave);
    }

    pub(crate) fn stop_autosave(&mut self) {
        self.autosave = None;
    }

    pub(crate) fn schedule_hide(&mut self, delay: Duration) {
        self.hide_floating_at = Some(Instant::now() + delay);
    }

    pub(crate) fn cancel_hide(&mut self) {
        self.hide_floating_at = None;
    }

    pub(crate) fn clear(&mut self) {
        self.stop_autosave();
        self.cancel_hide();
    }

    /// Resolves when the next timer fires. Never resolves when nothing is scheduled.
    pub(crate) async fn next(&mut self) -> TimerEvent {
        let hide_at = self.hide_floating_at;
        let event = match (&mut self.autosave, hide_at) {
            (Some(autosave), Some(hide_at)) => {
                tokio::select! {
                    _ = autosave.tick() => TimerEvent::Autosave,
                    _ = sleep_until(hide_at) => TimerEvent::HideFloating,
                }
            }
            (Some(autosave), None) => {
                autosave.tick().await;
                TimerEvent::Autosave
            }
            (None, Some(hide_at)) => {
                sleep_until(hide_at).await;
                TimerEvent::HideFloating
            }
            (None, None) => future::pending().await,
        };
        if event == TimerEvent::HideFloating {
            self.hide_floating_at = None;
        }
        event
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tokio::time::timeout;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_hide_fires_once() {
        let mut timers = Timers::default();
        timers.schedule_hide(Duration::from_millis(300));
        let start = Instant::now();

        assert_eq!(TimerEvent::HideFloating, timers.next().await);
        assert!(start.elapsed() >= Duration::from_millis(300));
        assert!(
            timeout(Duration::from_secs(60), timers.next())
                .await
                .is_err()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_autosave_repeats_until_stopped() {
        let mut timers = Timers::default();
        timers.start_autosave(Duration::from_secs(5));
        let start = Instant::now();

        assert_eq!(TimerEvent::Autosave, timers.next().await);
        assert_eq!(TimerEvent::Autosave, timers.next().await);
        assert!(start.elapsed() >= Duration::from_secs(10));

        timers.stop_autosave();
        assert!(timeout(Duration::from_secs(60), timers.next()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_hide_never_fires() {
        let mut timers = Timers::default();
        timers.schedule_hide(Duration::from_millis(300));
        timers.start_autosave(Duration::from_secs(1));
        timers.cancel_hide();

        assert_eq!(TimerEvent::Autosave, timers.next().await);
    }
}
