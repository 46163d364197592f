//! Date/time field values (`Date`, `Last-Modified`, `Expires`, ...).
//!
//! Serialization always produces RFC 1123 in GMT. Parsing accepts RFC
//! 1123 (preferred), RFC 850 (two-digit year), and ANSI C `asctime`, per
//! RFC 9110 §5.6.7.
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Error;

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// An instant in time, stored as seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instant {
    secs: u64,
}

impl Instant {
    pub fn from_unix_secs(secs: u64) -> Self {
        Self { secs }
    }

    pub fn now() -> Self {
        let dur = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        Self { secs: dur.as_secs() }
    }

    pub fn unix_secs(&self) -> u64 {
        self.secs
    }

    /// Parse any of the three RFC 9110-recognized date formats.
    ///
    /// The RFC 850 two-digit year is pivoted against `reference`'s year
    /// (±50 years) rather than the wall clock, so callers get stable
    /// results in tests; [`parse`](Self::parse) forwards `Instant::now()`.
    pub fn parse_with_reference(input: &[u8], reference: Instant) -> Result<Self, Error> {
        let s = std::str::from_utf8(super::trim(input)).map_err(|_| Error::parse("non-ASCII date", 0))?;
        parse_rfc1123(s)
            .or_else(|| parse_rfc850(s, reference))
            .or_else(|| parse_asctime(s))
            .ok_or_else(|| Error::parse("unrecognized date format", 0))
    }

    pub fn parse(input: &[u8]) -> Result<Self, Error> {
        Self::parse_with_reference(input, Instant::now())
    }

    /// Serialize as RFC 1123 in GMT, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
    pub fn serialize(&self) -> String {
        String::from_utf8(httpdate(self.secs).to_vec()).expect("httpdate is ASCII")
    }
}

/// Civil calendar fields derived from a Unix timestamp (days since epoch
/// split into year/month/day, seconds-of-day split into h/m/s), grounded
/// on the teacher's `httpdate` implementation.
struct Civil {
    wday: usize,
    year: i64,
    mon: usize,
    mday: i64,
    hour: u8,
    min: u8,
    sec: u8,
}

fn civil_from_unix(secs_since_epoch: u64) -> Civil {
    const LEAPOCH: i64 = 11017;
    const DAYS_PER_400Y: i64 = 365 * 400 + 97;
    const DAYS_PER_100Y: i64 = 365 * 100 + 24;
    const DAYS_PER_4Y: i64 = 365 * 4 + 1;

    let days = (secs_since_epoch / 86400) as i64 - LEAPOCH;
    let secs_of_day = secs_since_epoch % 86400;

    let mut qc_cycles = days / DAYS_PER_400Y;
    let mut remdays = days % DAYS_PER_400Y;
    if remdays < 0 {
        remdays += DAYS_PER_400Y;
        qc_cycles -= 1;
    }

    let mut c_cycles = remdays / DAYS_PER_100Y;
    if c_cycles == 4 {
        c_cycles -= 1;
    }
    remdays -= c_cycles * DAYS_PER_100Y;

    let mut q_cycles = remdays / DAYS_PER_4Y;
    if q_cycles == 25 {
        q_cycles -= 1;
    }
    remdays -= q_cycles * DAYS_PER_4Y;

    let mut remyears = remdays / 365;
    if remyears == 4 {
        remyears -= 1;
    }
    remdays -= remyears * 365;

    let mut year = 2000 + remyears + 4 * q_cycles + 100 * c_cycles + 400 * qc_cycles;

    let months = [31, 30, 31, 30, 31, 31, 30, 31, 30, 31, 31, 29];
    let mut mon = 0;
    for mon_len in months.iter() {
        mon += 1;
        if remdays < *mon_len {
            break;
        }
        remdays -= *mon_len;
    }
    let mday = remdays + 1;
    let mon = if mon + 2 > 12 {
        year += 1;
        mon - 10
    } else {
        mon + 2
    };

    let mut wday = (3 + days) % 7;
    if wday <= 0 {
        wday += 7
    }

    Civil {
        wday: (wday - 1) as usize,
        year,
        mon,
        mday,
        hour: (secs_of_day / 3600) as u8,
        min: ((secs_of_day % 3600) / 60) as u8,
        sec: (secs_of_day % 60) as u8,
    }
}

/// Render `secs` (Unix time) as a 29-byte RFC 1123 date, e.g.
/// `Sun, 06 Nov 1994 08:49:37 GMT`.
fn httpdate(secs: u64) -> [u8; 29] {
    let c = civil_from_unix(secs);
    let mut buf: [u8; 29] = *b"ddd, 00 mmm 1970 00:00:00 GMT";

    buf[..3].copy_from_slice(WEEKDAYS[c.wday].as_bytes());
    buf[5] = b'0' + (c.mday / 10) as u8;
    buf[6] = b'0' + (c.mday % 10) as u8;
    buf[8..11].copy_from_slice(MONTHS[c.mon - 1].as_bytes());
    buf[12] = b'0' + (c.year / 1000 % 10) as u8;
    buf[13] = b'0' + (c.year / 100 % 10) as u8;
    buf[14] = b'0' + (c.year / 10 % 10) as u8;
    buf[15] = b'0' + (c.year % 10) as u8;
    buf[17] = b'0' + (c.hour / 10);
    buf[18] = b'0' + (c.hour % 10);
    buf[20] = b'0' + (c.min / 10);
    buf[21] = b'0' + (c.min % 10);
    buf[23] = b'0' + (c.sec / 10);
    buf[24] = b'0' + (c.sec % 10);
    buf
}

/// Days since the Unix epoch for a given proleptic-Gregorian civil date.
/// The inverse of [`civil_from_unix`]'s day math, used when parsing dates
/// back into a timestamp.
fn unix_secs_from_civil(year: i64, mon: u8, mday: u8, hour: u8, min: u8, sec: u8) -> Option<u64> {
    if !(1..=12).contains(&mon) || mday == 0 || mday > 31 {
        return None;
    }
    let y = if mon <= 2 { year - 1 } else { year };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as i64;
    let mp = (mon as i64 + 9) % 12;
    let doy = (153 * mp + 2) / 5 + mday as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    let days = era * 146097 + doe - 719468;
    let secs_of_day = hour as i64 * 3600 + min as i64 * 60 + sec as i64;
    let total = days * 86400 + secs_of_day;
    u64::try_from(total).ok()
}

fn month_index(name: &str) -> Option<u8> {
    MONTHS.iter().position(|m| m.eq_ignore_ascii_case(name)).map(|i| i as u8 + 1)
}

fn parse_time(h: &str, m: &str, s: &str) -> Option<(u8, u8, u8)> {
    Some((h.parse().ok()?, m.parse().ok()?, s.parse().ok()?))
}

/// `Sun, 06 Nov 1994 08:49:37 GMT`
fn parse_rfc1123(s: &str) -> Option<Instant> {
    let rest = s.split_once(", ")?.1;
    let mut parts = rest.split(' ');
    let mday: u8 = parts.next()?.parse().ok()?;
    let mon = month_index(parts.next()?)?;
    let year: i64 = parts.next()?.parse().ok()?;
    let time = parts.next()?;
    let zone = parts.next()?;
    if zone != "GMT" {
        return None;
    }
    let mut time_parts = time.split(':');
    let (h, m, sec) = parse_time(time_parts.next()?, time_parts.next()?, time_parts.next()?)?;
    unix_secs_from_civil(year, mon, mday, h, m, sec).map(Instant::from_unix_secs)
}

/// `Sunday, 06-Nov-94 08:49:37 GMT`
fn parse_rfc850(s: &str, reference: Instant) -> Option<Instant> {
    let rest = s.split_once(", ")?.1;
    let mut parts = rest.split(' ');
    let date = parts.next()?;
    let time = parts.next()?;
    let zone = parts.next()?;
    if zone != "GMT" {
        return None;
    }
    let mut date_parts = date.split('-');
    let mday: u8 = date_parts.next()?.parse().ok()?;
    let mon = month_index(date_parts.next()?)?;
    let yy: i64 = date_parts.next()?.parse().ok()?;

    let ref_civil = civil_from_unix(reference.secs);
    let century = ref_civil.year / 100 * 100;
    let mut year = century + yy;
    // pivot within +/- 50 years of the reference year
    if year > ref_civil.year + 50 {
        year -= 100;
    } else if year < ref_civil.year - 50 {
        year += 100;
    }

    let mut time_parts = time.split(':');
    let (h, m, sec) = parse_time(time_parts.next()?, time_parts.next()?, time_parts.next()?)?;
    unix_secs_from_civil(year, mon, mday, h, m, sec).map(Instant::from_unix_secs)
}

/// `Sun Nov  6 08:49:37 1994`
fn parse_asctime(s: &str) -> Option<Instant> {
    let mut parts = s.split_whitespace();
    let _wday = parts.next()?;
    let mon = month_index(parts.next()?)?;
    let mday: u8 = parts.next()?.parse().ok()?;
    let time = parts.next()?;
    let year: i64 = parts.next()?.parse().ok()?;
    let mut time_parts = time.split(':');
    let (h, m, sec) = parse_time(time_parts.next()?, time_parts.next()?, time_parts.next()?)?;
    unix_secs_from_civil(year, mon, mday, h, m, sec).map(Instant::from_unix_secs)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn serializes_epoch() {
        assert_eq!(Instant::from_unix_secs(0).serialize(), "Thu, 01 Jan 1970 00:00:00 GMT");
    }

    #[test]
    fn serializes_known_instant() {
        assert_eq!(
            Instant::from_unix_secs(1475419451).serialize(),
            "Sun, 02 Oct 2016 14:44:11 GMT"
        );
    }

    #[test]
    fn round_trips_rfc1123() {
        let rendered = Instant::from_unix_secs(784111777).serialize();
        let parsed = Instant::parse(rendered.as_bytes()).unwrap();
        assert_eq!(parsed.unix_secs(), 784111777);
    }

    #[test]
    fn parses_rfc850_with_pivot() {
        // reference year 1994 so "94" resolves to 1994, not 2094 or 1894
        let reference = Instant::parse(b"Sun, 06 Nov 1994 08:49:37 GMT").unwrap();
        let parsed =
            Instant::parse_with_reference(b"Sunday, 06-Nov-94 08:49:37 GMT", reference).unwrap();
        assert_eq!(parsed.unix_secs(), reference.unix_secs());
    }

    #[test]
    fn parses_asctime() {
        let parsed = Instant::parse(b"Sun Nov  6 08:49:37 1994").unwrap();
        assert_eq!(parsed.serialize(), "Sun, 06 Nov 1994 08:49:37 GMT");
    }
}
