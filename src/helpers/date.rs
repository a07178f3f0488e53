//! Date helper functions

use chrono::{DateTime, Locale, TimeZone, Utc};
use chrono_tz::Tz;

/// Locale and time zone used to display publication dates
#[derive(Debug, Clone, Copy)]
pub struct DateStyle {
    pub locale: Locale,
    pub timezone: Tz,
}

impl DateStyle {
    /// Build from a BCP 47 language tag (`pt-BR`) and an IANA zone name.
    ///
    /// Unknown values fall back to POSIX and UTC.
    pub fn new(language: &str, timezone: &str) -> Self {
        let locale = parse_locale(language).unwrap_or_else(|| {
            tracing::warn!("Unknown language {:?}, using POSIX month names", language);
            Locale::POSIX
        });
        let timezone = timezone.parse::<Tz>().unwrap_or_else(|_| {
            if !timezone.is_empty() {
                tracing::warn!("Unknown timezone {:?}, using UTC", timezone);
            }
            Tz::UTC
        });
        Self { locale, timezone }
    }

    /// Format `date` in this style using a date-fns pattern
    pub fn format<Z: TimeZone>(&self, date: &DateTime<Z>, pattern: &str) -> String {
        format_date(date, pattern, self.locale, self.timezone)
    }
}

/// Parse `pt-BR`, `pt_BR` or `en` into a chrono locale
pub fn parse_locale(language: &str) -> Option<Locale> {
    let code = language.replace('-', "_");
    Locale::try_from(code.as_str()).ok()
}

/// Format a date with a date-fns pattern, a locale and a display zone
///
/// # Examples
/// ```ignore
/// format_date(&date, "d MMM yyyy", Locale::pt_BR, Tz::UTC) // -> "25 mar 2021"
/// ```
pub fn format_date<Z: TimeZone>(
    date: &DateTime<Z>,
    pattern: &str,
    locale: Locale,
    tz: Tz,
) -> String {
    let chrono_format = date_fns_to_chrono_format(pattern);
    date.with_timezone(&tz)
        .format_localized(&chrono_format, locale)
        .to_string()
}

/// Generate a <time> HTML element
pub fn time_tag<Z: TimeZone>(date: &DateTime<Z>, display: &str) -> String {
    let datetime = date.with_timezone(&Utc).format("%Y-%m-%dT%H:%M:%SZ").to_string();
    format!(r#"<time datetime="{}">{}</time>"#, datetime, display)
}

/// Convert a date-fns format pattern to a chrono format string.
///
/// Letters are read in runs (`yyyy`, `MMM`, `d`); text inside single quotes
/// is copied literally and `''` is a quote.
fn date_fns_to_chrono_format(pattern: &str) -> String {
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
            while i < chars.len() && chars[i] != '\'' {
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }

        if !c.is_ascii_alphabetic() {
            push_literal(&mut out, c);
            i += 1;
            continue;
        }

        let run = chars[i..].iter().take_while(|&&x| x == c).count();
        let spec = match (c, run) {
            ('y', 2) => "%y",
            ('y', _) => "%Y",
            ('M', 1) => "%-m",
            ('M', 2) => "%m",
            ('M', 3) => "%b",
            ('M', _) => "%B",
            ('d', 1) => "%-d",
            ('d', _) => "%d",
            ('H', 1) => "%-H",
            ('H', _) => "%H",
            ('h', 1) => "%-I",
            ('h', _) => "%I",
            ('m', 1) => "%-M",
            ('m', _) => "%M",
            ('s', 1) => "%-S",
            ('s', _) => "%S",
            ('E', 4) => "%A",
            ('E', _) => "%a",
            ('a', _) => "%p",
            _ => {
                for _ in 0..run {
                    push_literal(&mut out, c);
                }
                i += run;
                continue;
            }
        };
        out.push_str(spec);
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
