// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and calendar arithmetic.

use chrono::{DateTime, Datelike, SecondsFormat, TimeZone, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// First instant of the calendar month containing `now` (UTC).
///
/// Lower bound for the monthly quota queries.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .expect("first of month is always a valid instant")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_start_truncates() {
        let now = Utc.with_ymd_and_hms(2026, 8, 30, 15, 42, 7).unwrap();
        assert_eq!(format_utc_rfc3339(month_start(now)), "2026-08-01T00:00:00Z");
    }

    #[test]
    fn test_month_start_idempotent() {
        let first = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(month_start(first), first);
    }
}
