use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};

const IST_OFFSET_SECONDS: i32 = 5 * 3600 + 30 * 60;
const DISPLAY_FORMAT: &str = "%d %b %Y | %I:%M %p IST";

/// Indian Standard Time, the timezone every notification is stamped in.
pub fn display_timezone() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
}

pub fn to_display_timezone<Tz: TimeZone>(datetime: &DateTime<Tz>) -> DateTime<FixedOffset> {
    datetime.with_timezone(&display_timezone())
}

pub fn display_time(datetime: &DateTime<FixedOffset>) -> String {
    datetime.format(DISPLAY_FORMAT).to_string()
}

pub fn display_now() -> String {
    display_time(&to_display_timezone(&Utc::now()))
}
