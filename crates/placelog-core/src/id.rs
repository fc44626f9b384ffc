//! Identifier generation and timestamp helpers.
//!
//! Identifiers are opaque strings: a zero-padded epoch-millisecond prefix
//! followed by a short random suffix. The fixed-width prefix keeps ids
//! lexicographically non-decreasing by creation time; the suffix makes them
//! unique within a process. They are an ordering aid, never a security token.

use chrono::Utc;
use uuid::Uuid;

/// Width of the millisecond prefix. 13 decimal digits covers dates
/// well past the year 2200.
const TIMESTAMP_WIDTH: usize = 13;

/// Length of the random suffix taken from a v4 UUID.
const SUFFIX_LEN: usize = 8;

/// Generate a new entity identifier.
pub fn new_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{:0width$}{}",
        now_ms(),
        &suffix[..SUFFIX_LEN],
        width = TIMESTAMP_WIDTH
    )
}

/// Current time as integer milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Next `updated_at` value: the current time, but always strictly greater
/// than the previous value even when the clock has not advanced.
pub fn bump(prev: i64) -> i64 {
    now_ms().max(prev + 1)
}
