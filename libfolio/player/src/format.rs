use std::time::Duration;

/// Formats a position as `m:ss`.
pub fn format_time(time: Duration) -> String {
    let secs = time.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// `current / total`, with an unknown duration shown as `0:00`.
pub fn format_progress(current: Duration, duration: Option<Duration>) -> String {
    format!(
        "{} / {}",
        format_time(current),
        format_time(duration.unwrap_or_default())
    )
}

pub fn progress_percent(current: Duration, duration: Option<Duration>) -> f64 {
    match duration {
        Some(d) if !d.is_zero() => (current.as_secs_f64() / d.as_secs_f64() * 100.0).min(100.0),
        _ => 0.0,
    }
}
