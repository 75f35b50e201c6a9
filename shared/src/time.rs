//! Race-time formatting.

/// Format milliseconds as `MM:SS.mmm`.
pub fn format_race_time(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms / 1000) % 60;
    let millis = ms % 1000;
    format!("{:02}:{:02}.{:03}", minutes, seconds, millis)
}
