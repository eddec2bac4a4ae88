#![forbid(unsafe_code)]

//! Identifier and timestamp helpers.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

/// A fresh XML ID: `_` and 32 lowercase hex digits of a random 128-bit
/// value.  The leading underscore keeps it a valid NCName.
pub fn new_id() -> String {
    format!("_{:032x}", rand::random::<u128>())
}

/// The current instant truncated to whole seconds.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Render an `xs:dateTime` in UTC with a `Z` suffix.
pub fn xs_datetime(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}
