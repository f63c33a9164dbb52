//! SDS Utils - Utility Functions
//!
//! Timestamp helpers shared by the store engine and the sample.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use crate::error::Result;
use chrono::{DateTime, SecondsFormat, Utc};

/// Parse an RFC 3339 timestamp such as `2017-01-11T22:21:23.430Z`.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(value.parse::<DateTime<Utc>>()?)
}

/// Format a timestamp the way the store echoes keys back.
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Split `[start, end]` into `count` sub-intervals of equal width. Boundaries
/// are computed in milliseconds from `start` so rounding never accumulates.
/// The last sub-interval always ends exactly at `end`.
pub fn split_interval(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    count: usize,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    if count == 0 {
        return Vec::new();
    }

    let span = i128::from((end - start).num_milliseconds());
    let boundary = |i: usize| {
        if i == count {
            end
        } else {
            // The offset never exceeds `span`, so it fits back into i64.
            let offset = span * i as i128 / count as i128;
            start + chrono::Duration::milliseconds(offset as i64)
        }
    };

    (0..count).map(|i| (boundary(i), boundary(i + 1))).collect()
}
