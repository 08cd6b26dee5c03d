//! Parsing of human-written size and age thresholds.

use std::time::{Duration, SystemTime};

use crate::error::ConfigError;

/// Parse a size string like "1.5GB" or "100 MB" into bytes.
/// Units are binary multiples; the trailing `B` is optional.
pub fn parse_size(s: &str) -> Result<u64, ConfigError> {
    let invalid = || ConfigError::InvalidSize(s.to_string());
    let upper = s.trim().to_uppercase();
    if upper.is_empty() {
        return Err(invalid());
    }

    let body = upper.strip_suffix('B').unwrap_or(&upper);
    let (num_str, unit) = match body.chars().last() {
        Some('T') => (&body[..body.len() - 1], 1024u64.pow(4)),
        Some('G') => (&body[..body.len() - 1], 1024u64.pow(3)),
        Some('M') => (&body[..body.len() - 1], 1024u64.pow(2)),
        Some('K') => (&body[..body.len() - 1], 1024u64),
        _ => (body, 1u64),
    };

    let n: f64 = num_str.trim().parse().map_err(|_| invalid())?;
    if !n.is_finite() || n < 0.0 {
        return Err(invalid());
    }
    Ok((n * unit as f64) as u64)
}

/// Parse an age like "30d", "4w", "12h", "90m" or "45s".
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration(s.to_string());
    let lower = s.trim().to_lowercase();

    let unit = lower.chars().last().ok_or_else(invalid)?;
    let secs_per_unit = match unit {
        'w' => 7 * 24 * 3600,
        'd' => 24 * 3600,
        'h' => 3600,
        'm' => 60,
        's' => 1,
        _ => return Err(invalid()),
    };

    let digits = lower[..lower.len() - 1].trim_end();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let n: u64 = digits.parse().map_err(|_| invalid())?;

    n.checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(invalid)
}

/// Point in time `age` before now; anything modified after it is "too new".
pub fn cutoff_from_age(age: Duration) -> SystemTime {
    SystemTime::now()
        .checked_sub(age)
        .unwrap_or(SystemTime::UNIX_EPOCH)
}
