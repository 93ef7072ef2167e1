//! `format` keyword checks
//!
//! Unknown format names always pass. Formats only apply to strings; the
//! engine never calls in here for other kinds.

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use std::net::{Ipv4Addr, Ipv6Addr};
use url::Url;

/// Formats this module knows how to check
pub const KNOWN_FORMATS: &[&str] = &[
    "date-time",
    "date",
    "time",
    "email",
    "hostname",
    "ipv4",
    "ipv6",
    "uri",
    "uri-reference",
    "json-pointer",
    "regex",
];

/// Whether `format` is one of [`KNOWN_FORMATS`]
pub fn is_known_format(format: &str) -> bool {
    KNOWN_FORMATS.contains(&format)
}

/// Check a string against a named format
#[must_use]
pub fn check_format(format: &str, value: &str) -> bool {
    match format {
        "date-time" => DateTime::parse_from_rfc3339(value).is_ok(),
        "date" => is_date(value),
        "time" => DateTime::parse_from_rfc3339(&format!("1970-01-01T{value}")).is_ok(),
        "email" => is_email(value),
        "hostname" => is_hostname(value),
        "ipv4" => value.parse::<Ipv4Addr>().is_ok(),
        "ipv6" => value.parse::<Ipv6Addr>().is_ok(),
        "uri" => Url::parse(value).is_ok(),
        "uri-reference" => is_uri_reference(value),
        "json-pointer" => is_json_pointer(value),
        "regex" => Regex::new(value).is_ok(),
        _ => true,
    }
}

fn is_date(value: &str) -> bool {
    value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };
    !local.is_empty() && !local.contains(char::is_whitespace) && is_hostname(domain)
}

fn is_hostname(value: &str) -> bool {
    let value = value.strip_suffix('.').unwrap_or(value);
    if value.is_empty() || value.len() > 253 {
        return false;
    }
    value.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

fn is_uri_reference(value: &str) -> bool {
    if value.contains(char::is_whitespace) {
        return false;
    }
    match Url::parse("http://reference.invalid/") {
        Ok(base) => base.join(value).is_ok(),
        Err(_) => false,
    }
}

fn is_json_pointer(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    if !value.starts_with('/') {
        return false;
    }
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '~' && !matches!(chars.next(), Some('0' | '1')) {
            return false;
        }
    }
    true
}
