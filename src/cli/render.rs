//! Terminal rendering helpers shared by the read commands.

use ethers::types::U256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Render a wei amount as a decimal ETH string.
///
/// Keeps full wei precision but trims trailing fractional zeros, so
/// common amounts read naturally ("0.1" rather than
/// "0.100000000000000000").
pub fn format_eth(wei: U256) -> String {
    let full = ethers::utils::format_ether(wei);

    match full.split_once('.') {
        Some((whole, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                whole.to_string()
            } else {
                format!("{whole}.{frac}")
            }
        }
        None => full,
    }
}

/// Render a deadline relative to `now` ("in 4m 10s", "12m 3s ago").
pub fn format_deadline(deadline: SystemTime, now: SystemTime) -> String {
    match deadline.duration_since(now) {
        Ok(remaining) if remaining.as_secs() == 0 => "now".to_string(),
        Ok(remaining) => format!("in {}", humantime::format_duration(seconds(remaining))),
        Err(elapsed) => {
            let past = elapsed.duration();
            if past.as_secs() == 0 {
                "now".to_string()
            } else {
                format!("{} ago", humantime::format_duration(seconds(past)))
            }
        }
    }
}

/// Render an absolute timestamp as RFC 3339 with second precision.
pub fn format_timestamp(t: SystemTime) -> String {
    humantime::format_rfc3339_seconds(t).to_string()
}

/// Unix seconds for machine-readable output.
pub fn unix_seconds(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// Truncate sub-second noise before handing to humantime.
fn seconds(d: Duration) -> Duration {
    Duration::from_secs(d.as_secs())
}
