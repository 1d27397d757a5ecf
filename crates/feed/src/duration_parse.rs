// ABOUTME: Duration parsing for embed video lengths and configured intervals.
// ABOUTME: Supports numeric seconds, HH:MM:SS, MM:SS, and Go-style duration strings.

use serde::{Deserialize, Deserializer};

/// Parses a duration string into fractional seconds.
/// Supports:
/// - Plain numbers (seconds, decimals allowed)
/// - HH:MM:SS format
/// - MM:SS format
/// - Go-style durations like "1m15s", "45s", "2h"
/// Returns None for empty, negative, or unparseable input.
pub fn parse_duration_seconds(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(secs) = s.parse::<f64>() {
        return (secs.is_finite() && secs >= 0.0).then_some(secs);
    }

    if s.contains(':') {
        return parse_colon_format(s);
    }

    // Go-style duration (1h30m, 45m, 2h, etc.)
    parse_duration::parse(s).ok().map(|d| d.as_secs_f64())
}

fn parse_colon_format(s: &str) -> Option<f64> {
    let parts: Vec<&str> = s.split(':').collect();

    match parts.len() {
        2 => {
            // MM:SS
            let mins: u64 = parts[0].parse().ok()?;
            let secs: f64 = parts[1].parse().ok()?;
            (secs >= 0.0).then(|| mins as f64 * 60.0 + secs)
        }
        3 => {
            // HH:MM:SS
            let hours: u64 = parts[0].parse().ok()?;
            let mins: u64 = parts[1].parse().ok()?;
            let secs: f64 = parts[2].parse().ok()?;
            let total = hours as f64 * 3600.0 + mins as f64 * 60.0 + secs;
            (secs >= 0.0 && total.is_finite()).then_some(total)
        }
        _ => None,
    }
}

/// Serde helper: accepts a number, a duration string, or null.
/// Unparseable strings become `None` rather than failing the whole entry.
pub fn deserialize_opt_seconds<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) if n.is_finite() && n >= 0.0 => Some(n),
        Some(Raw::Number(_)) => None,
        Some(Raw::Text(s)) => parse_duration_seconds(&s),
        None => None,
    })
}
