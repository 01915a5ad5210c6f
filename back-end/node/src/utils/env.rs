//! Environment variable parsing helpers.
//!
//! Each helper reads the variable, parses it, and falls back to the default
//! when the variable is unset or does not parse.

use std::str::FromStr;
use std::time::Duration;

#[inline]
fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

#[inline]
pub fn env_u16(key: &str, default: u16) -> u16 {
    env_parse(key, default)
}

#[inline]
pub fn env_u64(key: &str, default: u64) -> u64 {
    env_parse(key, default)
}

#[inline]
pub fn env_usize(key: &str, default: usize) -> usize {
    env_parse(key, default)
}

/// Recognizes "true", "1", "yes", "on" as true and "false", "0", "no", "off"
/// as false (case-insensitive). Anything else returns the default.
#[inline]
pub fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).map(|v| v.trim().to_lowercase()) {
        Ok(v) if matches!(v.as_str(), "true" | "1" | "yes" | "on") => true,
        Ok(v) if matches!(v.as_str(), "false" | "0" | "no" | "off") => false,
        _ => default,
    }
}

#[inline]
pub fn env_string(key: &str, default: &str) -> String {
    env_string_opt(key).unwrap_or_else(|| default.to_string())
}

/// `None` when the variable is unset or blank.
#[inline]
pub fn env_string_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Comma-separated list, blank entries dropped.
pub fn env_list(key: &str) -> Vec<String> {
    env_string_opt(key)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

#[inline]
pub fn env_duration_secs(key: &str, default_secs: u64) -> Duration {
    Duration::from_secs(env_u64(key, default_secs))
}

#[inline]
pub fn env_duration_ms(key: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_u64(key, default_ms))
}
