// SPDX-License-Identifier: GPL-3.0-only

//! Calendar-date decoding for Slack message timestamps.
//!
//! Slack encodes a message timestamp as a string of fractional seconds
//! since the Unix epoch, e.g. `"1733356800.000100"`. Day sharding only
//! needs the calendar date, which depends solely on the integer-seconds
//! prefix; the fractional suffix is ignored entirely.

use chrono::{DateTime, Local, NaiveDate};
use snafu::prelude::*;

/// Error type for timestamp decoding failures.
#[derive(Debug, Snafu)]
pub enum TimestampError {
    /// The timestamp string does not have the `<seconds>[.<fraction>]` shape.
    #[snafu(display("malformed timestamp {ts:?}"))]
    Malformed {
        /// The offending timestamp string.
        ts: String,
    },
}

/// Decodes a Slack timestamp string into the local calendar date.
///
/// Returns `Ok(None)` for the empty string: a message without a timestamp
/// has no calendar day, and callers skip file emission for it instead of
/// failing.
///
/// # Errors
///
/// Returns [`TimestampError::Malformed`] when the string contains more
/// than one `.`, when the seconds portion is not a decimal integer, or
/// when the seconds value lies outside the representable date range.
///
/// # Example
///
/// ```
/// use slackdump::timestamp::parse_date;
///
/// assert!(parse_date("1733356800.000100").unwrap().is_some());
/// assert!(parse_date("").unwrap().is_none());
/// assert!(parse_date("1.2.3").is_err());
/// ```
pub fn parse_date(ts: &str) -> Result<Option<NaiveDate>, TimestampError> {
    if ts.is_empty() {
        return Ok(None);
    }

    let pieces: Vec<&str> = ts.split('.').collect();
    ensure!(pieces.len() <= 2, MalformedSnafu { ts });

    let seconds: i64 = pieces[0].parse().ok().context(MalformedSnafu { ts })?;
    let utc = DateTime::from_timestamp(seconds, 0).context(MalformedSnafu { ts })?;
    Ok(Some(utc.with_timezone(&Local).date_naive()))
}

/// Formats a calendar date as the export's per-day filename,
/// `YYYY-MM-DD.json`, zero padded.
#[must_use]
pub fn day_filename(date: NaiveDate) -> String {
    format!("{}.json", date.format("%Y-%m-%d"))
}
