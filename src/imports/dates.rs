// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Parsing of guest-supplied date strings written against Unicode date patterns.
//!
//! Patterns such as `yyyy-MM-dd HH:mm` or `MMM d, yyyy` are translated into
//! `chrono` format strings. Only English month and weekday names are
//! recognized; the locale argument is accepted and ignored.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Translates a Unicode date pattern into a `chrono` format string.
///
/// Quoted runs (`'T'`) are copied literally and `''` is a literal quote.
/// Pattern letters without a `chrono` equivalent are dropped.
pub fn to_chrono_format(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        out.push('\'');
                        i += 2;
                        continue;
                    }
                    i += 1;
                    break;
                }
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            continue;
        }

        if !c.is_ascii_alphabetic() {
            push_literal(&mut out, c);
            i += 1;
            continue;
        }

        let mut run = 1;
        while chars.get(i + run) == Some(&c) {
            run += 1;
        }
        out.push_str(field(c, run));
        i += run;
    }

    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

fn field(letter: char, run: usize) -> &'static str {
    match (letter, run) {
        ('y' | 'u', 2) => "%y",
        ('y' | 'u', _) => "%Y",
        ('M' | 'L', 1 | 2) => "%m",
        ('M' | 'L', 3) => "%b",
        ('M' | 'L', _) => "%B",
        ('d', _) => "%d",
        ('D', _) => "%j",
        ('H' | 'k', _) => "%H",
        ('h' | 'K', _) => "%I",
        ('m', _) => "%M",
        ('s', _) => "%S",
        ('S', _) => "%3f",
        ('a', _) => "%p",
        ('E', 1..=3) => "%a",
        ('E', _) => "%A",
        ('Z', 1..=4) | ('x', 1 | 2 | 4) | ('X', 1 | 2 | 4) => "%z",
        ('Z', _) | ('x', _) | ('X', _) => "%:z",
        _ => "",
    }
}

fn has_offset(format: &str) -> bool {
    format.contains("%z") || format.contains("%:z")
}

/// Parses `value` with a Unicode date `pattern`, interpreting wall-clock
/// times in `timezone` (IANA name, default UTC). Date-only patterns yield
/// midnight.
pub fn parse_date(value: &str, pattern: &str, timezone: Option<&str>) -> Option<DateTime<Utc>> {
    let format = to_chrono_format(pattern);
    let value = value.trim();

    if has_offset(&format) {
        return DateTime::parse_from_str(value, &format)
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(value, &format).ok().or_else(|| {
        NaiveDate::parse_from_str(value, &format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    })?;

    let zone: Tz = match timezone {
        Some(name) => name.trim().parse().ok()?,
        None => Tz::UTC,
    };
    zone.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

/// Seconds since the epoch with millisecond precision.
pub fn to_epoch_seconds(date: &DateTime<Utc>) -> f64 {
    date.timestamp_millis() as f64 / 1000.0
}

/// Negative times mean "now".
pub fn from_epoch_seconds(seconds: f64) -> DateTime<Utc> {
    if seconds < 0.0 || !seconds.is_finite() {
        return Utc::now();
    }
    DateTime::from_timestamp_millis((seconds * 1000.0) as i64).unwrap_or_else(Utc::now)
}
