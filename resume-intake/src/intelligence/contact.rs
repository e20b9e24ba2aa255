//! Email and phone extraction.
//!
//! Both return ordered sets: duplicates (by normalized value) are dropped and
//! the first occurrence keeps its position.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[a-z0-9_.%+\-]+@[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?)*\.[a-z]{2,}\b")
        .unwrap()
});

/// Digit groups joined by a single separator: one space or tab, a dash or
/// dot (optionally spaced), or a parenthesis. Wider gaps end the match.
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+?\(?\d+(?:(?:\) ?| ?\(| ?[.\-] ?|[ \t])\d+)*").unwrap()
});

/// A year glued onto the end of a number, e.g. a date column next to the
/// contact line.
static TRAILING_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?: ?[.\-] ?|[ \t])(?:19|20)\d{2}$").unwrap());

static YEAR_RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(19|20)\d{2}\s*[-.]\s*(19|20)\d{2}$").unwrap());

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,4}[./\-]\d{1,2}[./\-]\d{1,4}$").unwrap());

pub const MIN_PHONE_DIGITS: usize = 7;
pub const MAX_PHONE_DIGITS: usize = 15;

/// Extract email addresses, lowercased, in order of first appearance.
pub fn extract_emails(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut emails = Vec::new();

    for m in EMAIL_RE.find_iter(text) {
        let email = m.as_str().to_lowercase();
        if is_valid_email(&email) && seen.insert(email.clone()) {
            emails.push(email);
        }
    }

    emails
}

/// Extract phone numbers as written (trimmed), unique by digit sequence.
pub fn extract_phones(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut phones = Vec::new();

    for m in PHONE_RE.find_iter(text) {
        let candidate = strip_trailing_years(m.as_str().trim());
        if YEAR_RANGE_RE.is_match(candidate) || DATE_RE.is_match(candidate) {
            continue;
        }

        let digits = phone_digits(candidate);
        if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
            continue;
        }
        if seen.insert(digits) {
            phones.push(candidate.to_string());
        }
    }

    phones
}

/// Drops trailing year groups while what remains still reads as a phone: a
/// full ten-digit number, or anything valid when the whole run is too long.
fn strip_trailing_years(candidate: &str) -> &str {
    let mut current = candidate;
    while let Some(m) = TRAILING_YEAR_RE.find(current) {
        let rest = current[..m.start()].trim_end();
        let rest_digits = phone_digits(rest).len();
        let overlong = phone_digits(current).len() > MAX_PHONE_DIGITS;
        if rest_digits >= 10 || (overlong && rest_digits >= MIN_PHONE_DIGITS) {
            current = rest;
        } else {
            break;
        }
    }
    current
}

pub fn phone_digits(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// Structural check on an address: one `@`, non-empty local part without
/// leading/trailing/double dots, dotted domain with an alphabetic TLD.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    if labels
        .iter()
        .any(|l| l.is_empty() || l.starts_with('-') || l.ends_with('-'))
    {
        return false;
    }

    labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
}
