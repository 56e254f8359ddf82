//! Time and size formatting utilities

/// Format seconds as `HH:MM:SS`, truncating fractional seconds
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Format a byte count as megabytes with two decimals
pub fn format_file_size(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}

/// Format a bit rate in bits per second as megabits per second
pub fn format_bitrate(bits_per_second: u64) -> String {
    format!("{:.2} Mbps", bits_per_second as f64 / 1_000_000.0)
}
