//! Digital time formatting

/// Format whole seconds as `M:SS`, minutes unpadded, seconds zero-padded
pub fn seconds_to_digital_time(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
