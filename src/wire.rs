//! Wire-level primitives for RFC 3977: message identifiers, newsgroup
//! names, article numbers, compact date/time, and dot-stuffing.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use std::fmt;

/// An RFC 3977 message identifier, `<id-left@id-right>`.
///
/// Equality and hashing are by literal string; no normalization is
/// performed beyond the validation done at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(String);

impl MessageId {
    /// Parse and validate a message identifier, requiring the
    /// `<local@domain>` form (or at minimum a non-empty token
    /// wrapped in angle brackets).
    pub fn parse(raw: &str) -> Result<Self, InvalidMessageId> {
        if raw.len() < 3 || !raw.starts_with('<') || !raw.ends_with('>') {
            return Err(InvalidMessageId);
        }
        let inner = &raw[1..raw.len() - 1];
        if inner.is_empty() || inner.contains(['<', '>', ' ', '\t', '\r', '\n']) {
            return Err(InvalidMessageId);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid message-id")]
pub struct InvalidMessageId;

/// A dot-separated hierarchical newsgroup name, e.g. `comp.lang.rust`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NewsgroupName(String);

impl NewsgroupName {
    pub fn parse(raw: &str) -> Result<Self, InvalidNewsgroupName> {
        if raw.is_empty() || raw.starts_with('.') || raw.ends_with('.') || raw.contains("..") {
            return Err(InvalidNewsgroupName);
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' || c == '+')
        {
            return Err(InvalidNewsgroupName);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Names under `local.` are reserved for this server's own use and
    /// may not be injected into by a peer via IHAVE.
    pub fn is_local_reserved(&self) -> bool {
        self.0 == "local" || self.0.starts_with("local.")
    }
}

impl fmt::Display for NewsgroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid newsgroup name")]
pub struct InvalidNewsgroupName;

/// A positive article number within a newsgroup.
pub type ArticleNumber = u64;

/// Sentinel low-water-mark reported for an empty group.
pub const LOWEST_WHEN_EMPTY: i64 = 0;
/// Sentinel high-water-mark reported for an empty group.
pub const HIGHEST_WHEN_EMPTY: i64 = -1;

/// Format a timestamp as the RFC 3977 compact UTC form `yyyyMMddHHmmss`.
pub fn format_compact_datetime(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%d%H%M%S").to_string()
}

/// Parse the `date`/`time`[/`GMT`] arguments accepted by NEWGROUPS and
/// NEWNEWS. `date` may be the 8-digit `yyyyMMdd` form or the legacy
/// 6-digit `yyMMdd` form, whose century is inferred relative to the
/// current year: if `yy` is less than or equal to the current two-digit
/// year, it is assumed to be this century, otherwise the prior one.
pub fn parse_compact_datetime(date: &str, time: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if time.len() != 6 || !time.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let naive_time = NaiveTime::parse_from_str(time, "%H%M%S").ok()?;

    let naive_date = match date.len() {
        8 if date.bytes().all(|b| b.is_ascii_digit()) => {
            NaiveDate::parse_from_str(date, "%Y%m%d").ok()?
        }
        6 if date.bytes().all(|b| b.is_ascii_digit()) => {
            let yy: i32 = date[0..2].parse().ok()?;
            let current_yy = now.format("%y").to_string().parse::<i32>().ok()?;
            let current_century = (now.format("%Y").to_string().parse::<i32>().ok()?) / 100;
            let century = if yy <= current_yy {
                current_century
            } else {
                current_century - 1
            };
            let year = century * 100 + yy;
            let rest = &date[2..];
            NaiveDate::parse_from_str(&format!("{year:04}{rest}"), "%Y%m%d").ok()?
        }
        _ => return None,
    };

    Some(Utc.from_utc_datetime(&naive_date.and_time(naive_time)))
}

/// Dot-stuff a single outgoing body line: a line beginning with `.` is
/// escaped with a leading extra `.`. The terminator line is handled
/// separately by the caller and is never passed through this function.
pub fn stuff_line(line: &str) -> String {
    if line.starts_with('.') {
        format!(".{line}")
    } else {
        line.to_string()
    }
}

/// Undo dot-stuffing on a single incoming body line.
pub fn unstuff_line(line: &str) -> &str {
    line.strip_prefix('.').map_or(line, |rest| {
        if line.starts_with("..") { rest } else { line }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_requires_brackets() {
        assert!(MessageId::parse("<a@b>").is_ok());
        assert!(MessageId::parse("a@b").is_err());
        assert!(MessageId::parse("<>").is_err());
        assert!(MessageId::parse("<a b@c>").is_err());
    }

    #[test]
    fn newsgroup_name_validation() {
        assert!(NewsgroupName::parse("comp.lang.rust").is_ok());
        assert!(NewsgroupName::parse(".bad").is_err());
        assert!(NewsgroupName::parse("bad.").is_err());
        assert!(NewsgroupName::parse("bad..name").is_err());
        assert!(NewsgroupName::parse("").is_err());
    }

    #[test]
    fn local_reserved_detection() {
        let g = NewsgroupName::parse("local.nntp.postus.log").unwrap();
        assert!(g.is_local_reserved());
        let g = NewsgroupName::parse("comp.lang.rust").unwrap();
        assert!(!g.is_local_reserved());
    }

    #[test]
    fn compact_datetime_roundtrip() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 12, 34, 56).unwrap();
        assert_eq!(format_compact_datetime(ts), "20240601123456");
    }

    #[test]
    fn parse_8digit_date() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let parsed = parse_compact_datetime("20240601", "123456", now).unwrap();
        assert_eq!(format_compact_datetime(parsed), "20240601123456");
    }

    #[test]
    fn parse_6digit_date_century_inference() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let parsed = parse_compact_datetime("240601", "123456", now).unwrap();
        assert_eq!(format_compact_datetime(parsed), "20240601123456");

        // yy greater than current yy rolls back a century.
        let parsed = parse_compact_datetime("990601", "000000", now).unwrap();
        assert_eq!(&format_compact_datetime(parsed)[0..4], "1999");
    }

    #[test]
    fn dot_stuffing_roundtrip() {
        for line in [".hidden", "..already", "plain", "."] {
            let stuffed = stuff_line(line);
            assert_eq!(unstuff_line(&stuffed), line);
        }
    }
}
