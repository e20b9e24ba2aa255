//! Years-of-experience estimate.
//!
//! Priority: an explicit "total experience" statement, then the largest
//! "N years" mention, then the longest single date range. Ranges are not
//! accumulated.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

const MAX_YEARS: f64 = 60.0;
const MIN_RANGE_YEAR: i32 = 1950;

static TOTAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)total\s+(?:work\s+|professional\s+)?experience\s*(?:of|:|-|is)?\s*(?:about\s+|over\s+)?(\d{1,2}(?:\.\d+)?)\s*\+?\s*(?:years?|yrs?)\b",
    )
    .unwrap()
});

static YEARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2}(?:\.\d+)?)\s*\+?\s*-?\s*(?:years?|yrs?)\b").unwrap());

static RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+)?\b((?:19|20)\d{2})\s*(?:-|–|—|to)\s*(?:(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+)?((?:19|20)\d{2}\b|present\b|current\b|now\b|date\b)",
    )
    .unwrap()
});

/// Best-effort estimate in years, rounded to one decimal.
pub fn extract_experience(text: &str, today: NaiveDate) -> Option<f64> {
    if let Some(total) = TOTAL_RE
        .captures_iter(text)
        .filter_map(|c| c[1].parse::<f64>().ok())
        .find(|y| (0.0..=MAX_YEARS).contains(y))
    {
        return Some(round_tenth(total));
    }

    let mentioned = YEARS_RE
        .captures_iter(text)
        .filter_map(|c| c[1].parse::<f64>().ok())
        .filter(|y| *y > 0.0 && *y <= MAX_YEARS)
        .fold(None, max_opt);
    if mentioned.is_some() {
        return mentioned.map(round_tenth);
    }

    RANGE_RE
        .captures_iter(text)
        .filter_map(|c| {
            let start_month = c.get(1).map_or(1, |m| month_number(m.as_str()));
            let start_year: i32 = c[2].parse().ok()?;
            let end_month = c.get(3).map(|m| month_number(m.as_str()));
            let (end_year, end_month) = match c[4].parse::<i32>() {
                Ok(year) => (year, end_month.unwrap_or(1)),
                Err(_) => (today.year(), end_month.unwrap_or(today.month())),
            };
            range_years(start_year, start_month, end_year, end_month, today)
        })
        .fold(None, max_opt)
        .map(round_tenth)
}

fn range_years(
    start_year: i32,
    start_month: u32,
    end_year: i32,
    end_month: u32,
    today: NaiveDate,
) -> Option<f64> {
    let latest = today.year() + 1;
    if !(MIN_RANGE_YEAR..=latest).contains(&start_year)
        || !(MIN_RANGE_YEAR..=latest).contains(&end_year)
    {
        return None;
    }

    let months = (end_year * 12 + end_month as i32) - (start_year * 12 + start_month as i32);
    let years = f64::from(months) / 12.0;
    (0.0..=MAX_YEARS).contains(&years).then_some(years)
}

fn month_number(name: &str) -> u32 {
    match name.get(..3).map(str::to_lowercase).as_deref() {
        Some("feb") => 2,
        Some("mar") => 3,
        Some("apr") => 4,
        Some("may") => 5,
        Some("jun") => 6,
        Some("jul") => 7,
        Some("aug") => 8,
        Some("sep") => 9,
        Some("oct") => 10,
        Some("nov") => 11,
        Some("dec") => 12,
        _ => 1,
    }
}

fn max_opt(acc: Option<f64>, y: f64) -> Option<f64> {
    Some(acc.map_or(y, |a| a.max(y)))
}

fn round_tenth(y: f64) -> f64 {
    (y * 10.0).round() / 10.0
}
