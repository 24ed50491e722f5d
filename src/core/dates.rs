use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

/// Era year + offset = calendar year (民國 113 年 = 2024).
pub const ERA_YEAR_OFFSET: i32 = 1911;

fn local_era_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{7}$").expect("static regex"))
}

/// Whether `raw` has the shape of a local-era date (exactly 7 ASCII digits).
pub fn is_local_era_shaped(raw: &str) -> bool {
    raw.is_ascii() && local_era_pattern().is_match(raw)
}

/// Parse a local-era date such as `"1131227"` (2024-12-27).
///
/// Total: anything that is not 7 ASCII digits forming a real calendar
/// date yields `None`.
pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    if !is_local_era_shaped(raw) {
        return None;
    }
    let era_year: i32 = raw[..3].parse().ok()?;
    parse_ymd(era_year + ERA_YEAR_OFFSET, &raw[3..])
}

/// Parse an 8-digit `YYYYMMDD` date.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = raw[..4].parse().ok()?;
    parse_ymd(year, &raw[4..])
}

fn parse_ymd(year: i32, month_day: &str) -> Option<NaiveDate> {
    let month: u32 = month_day.get(..2)?.parse().ok()?;
    let day: u32 = month_day.get(2..4)?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
