use std::time::Duration;

use anyhow::{bail, Result};

/// Suffix to milliseconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[
    ("ms", 1.0),
    ("s", 1_000.0),
    ("m", 60_000.0),
    ("h", 3_600_000.0),
];

/// Parse interval strings like "1s", "500ms", "1.5m", "2h".
///
/// A bare number is taken as milliseconds, matching how intervals are
/// written in the settings file.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    if let Ok(ms) = s.parse::<u64>() {
        return Ok(Duration::from_millis(ms));
    }

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str.trim().parse()?;
            return match Duration::try_from_secs_f64(val * multiplier / 1_000.0) {
                Ok(d) => Ok(d),
                Err(_) => bail!("Invalid duration: {}", s),
            };
        }
    }

    bail!("Unknown duration format: {}", s)
}

/// Format a duration for log lines
pub fn format_duration(d: Duration) -> String {
    let millis = d.as_millis();
    if millis < 1_000 {
        format!("{}ms", millis)
    } else if millis % 1_000 == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}
