//! Field cleaners and small helpers used across the scrapers.
//!
//! The cleaners turn raw strings pulled out of listing markup into typed or
//! normalized values:
//! - [`clean_price`] and [`extract_number`] for numeric fields
//! - [`normalize_whitespace`] and [`truncate_text`] for display text
//! - [`sanitize_filename`] for output file stems
//! - [`is_valid_url`] for a strict http(s) shape check
//!
//! None of them fail loudly: unusable input yields `None` (or an empty
//! string) and the caller decides whether the field matters.

use once_cell::sync::Lazy;
use regex::Regex;
use std::io;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

static FILENAME_DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s-]").expect("static regex"));
static FILENAME_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-\s]+").expect("static regex"));
static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("static regex"));
static DECIMAL_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d$").expect("static regex"));
static URL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)^https?://",
        r"(?:(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+[A-Z]{2,6}\.?|",
        r"localhost|",
        r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})",
        r"(?::\d+)?",
        r"(?:/?|[/?]\S+)$",
    ))
    .expect("static regex")
});

fn is_decimal_digit(c: char) -> bool {
    let mut buf = [0u8; 4];
    DECIMAL_DIGIT.is_match(c.encode_utf8(&mut buf))
}

/// Value of a Unicode decimal digit (`Nd`), e.g. `'७'` is 7.
///
/// `Nd` characters are assigned in contiguous runs of ten, zero first, so
/// the value is the distance from the start of the run, modulo ten.
fn decimal_digit_value(c: char) -> Option<u32> {
    if let Some(d) = c.to_digit(10) {
        return Some(d);
    }
    if !is_decimal_digit(c) {
        return None;
    }
    let code = u32::from(c);
    let mut start = code;
    while let Some(prev) = start.checked_sub(1).and_then(char::from_u32) {
        if !is_decimal_digit(prev) {
            break;
        }
        start -= 1;
    }
    Some((code - start) % 10)
}

/// Parse a string of decimal digits from any script.
fn parse_digits(digits: impl Iterator<Item = char>) -> Option<i64> {
    let ascii: String = digits
        .filter_map(decimal_digit_value)
        .filter_map(|d| char::from_digit(d, 10))
        .collect();
    if ascii.is_empty() {
        return None;
    }
    ascii.parse().ok()
}

/// Extract an integer price by concatenating every decimal digit in the
/// string. Digits from any script count, so Devanagari and fullwidth
/// prices parse too.
///
/// Separators of every kind are dropped, including the decimal point, so
/// `"$99.99"` becomes `9999`. Existing data sets were produced with this
/// rule, so it is kept as is.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clean_price("₹1,234"), Some(1234));
/// assert_eq!(clean_price("₹१,२३४"), Some(1234));
/// assert_eq!(clean_price("Price: 1,500"), Some(1500));
/// assert_eq!(clean_price(""), None);
/// ```
pub fn clean_price(raw: &str) -> Option<i64> {
    parse_digits(raw.chars())
}

/// Return the first run of decimal digits in `text` as an integer.
///
/// ```ignore
/// assert_eq!(extract_number("123 reviews"), Some(123));
/// assert_eq!(extract_number("Rating: 4.5 stars"), Some(4));
/// ```
pub fn extract_number(text: &str) -> Option<i64> {
    DIGIT_RUN.find(text).and_then(|m| parse_digits(m.as_str().chars()))
}

/// Turn an arbitrary string into a safe file stem.
///
/// Lowercases, removes everything except word characters, whitespace and
/// hyphens, collapses whitespace/hyphen runs into `_`, cuts to `max_length`
/// characters and trims underscores from both ends. Applying it twice gives
/// the same result as applying it once.
pub fn sanitize_filename(raw: &str, max_length: usize) -> String {
    let lowered = raw.to_lowercase();
    let kept = FILENAME_DISALLOWED.replace_all(&lowered, "");
    let joined = FILENAME_SEPARATORS.replace_all(&kept, "_");
    let truncated: String = joined.chars().take(max_length).collect();
    truncated.trim_matches('_').to_string()
}

/// Collapse every whitespace run to a single space.
pub fn normalize_whitespace(text: &str) -> Option<String> {
    let joined = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if joined.is_empty() { None } else { Some(joined) }
}

/// Shorten `text` to at most `max_length` characters, ending in `suffix`
/// when something was cut.
///
/// ```ignore
/// assert_eq!(truncate_text("Very long text here", 10, "..."), "Very lo...");
/// assert_eq!(truncate_text("Short", 10, "..."), "Short");
/// ```
pub fn truncate_text(text: &str, max_length: usize, suffix: &str) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }
    let suffix_len = suffix.chars().count();
    if suffix_len >= max_length {
        return suffix.chars().take(max_length).collect();
    }
    let mut out: String = text.chars().take(max_length - suffix_len).collect();
    out.push_str(suffix);
    out
}

/// Strict http(s) URL shape check: a dotted domain, `localhost` or an IPv4
/// host, with an optional port and path.
pub fn is_valid_url(url: &str) -> bool {
    URL_SHAPE.is_match(url)
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and the number
/// of dropped characters appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let total = s.chars().count();
    if total <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{}…(+{} chars)", head, total - max)
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    fs::write(&probe_path, b"").await?;
    let _ = fs::remove_file(&probe_path).await;
    info!("Output directory is writable");
    Ok(())
}
