use std::time::Duration;

#[derive(Clone, Debug)]
pub struct StoreSettings {
    /// Stored positions older than this are ignored.
    pub ttl: Duration,
    /// Positions at or below this are not worth resuming.
    pub resume_threshold: Duration,
    /// Positions this close to the end are not saved.
    pub end_margin: Duration,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(7 * 24 * 60 * 60),
            resume_threshold: Duration::from_secs(5),
            end_margin: Duration::from_secs(5),
        }
    }
}
