use std::sync::OnceLock;

use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Wire format for message timestamps: local date-time, fixed nine fractional digits.
pub const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]");

static LOCAL_OFFSET: OnceLock<UtcOffset> = OnceLock::new();

/// Server-local offset, resolved on first use. Falls back to UTC when the platform
/// refuses to report it (e.g. multi-threaded process on some Unix targets).
pub fn local_offset() -> UtcOffset {
    *LOCAL_OFFSET.get_or_init(|| UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC))
}

/// Current server-local date-time without offset.
pub fn now_local() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc().to_offset(local_offset());
    PrimitiveDateTime::new(now.date(), now.time())
}

/// Current server-local date-time formatted for the wire (es. "2025-11-02T12:34:56.123456789").
pub fn now_local_timestamp() -> String {
    format_timestamp(now_local())
}

pub fn format_timestamp(dt: PrimitiveDateTime) -> String {
    dt.format(TIMESTAMP_FORMAT).expect("error formatting timestamp")
}

pub fn parse_timestamp(s: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(s, TIMESTAMP_FORMAT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_has_fixed_width_and_parses_back() {
        let s = now_local_timestamp();
        assert_eq!(s.len(), "2025-11-02T12:34:56.123456789".len());
        assert_eq!(&s[10..11], "T");
        let parsed = parse_timestamp(&s).expect("parse");
        assert_eq!(format_timestamp(parsed), s);
    }

    #[test]
    fn consecutive_timestamps_do_not_go_backwards() {
        let a = now_local();
        let b = now_local();
        assert!(b >= a);
    }

    #[test]
    fn rejects_offset_suffix() {
        assert!(parse_timestamp("2025-11-02T12:34:56Z").is_err());
    }
}
