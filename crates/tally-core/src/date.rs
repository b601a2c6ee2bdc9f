use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

fn canonical_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static regex"))
}

fn display_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})\.(\d{1,2})\.(\d{4})$").expect("static regex")
    })
}

fn loose_canonical_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").expect("static regex")
    })
}

pub fn is_canonical(s: &str) -> bool {
    canonical_re().is_match(s)
}

pub fn to_canonical(display: &str) -> String {
    match display_re().captures(display) {
        Some(caps) => format!("{}-{:0>2}-{:0>2}", &caps[3], &caps[2], &caps[1]),
        None => display.to_string(),
    }
}

pub fn to_display(canonical: &str) -> String {
    match loose_canonical_re().captures(canonical) {
        Some(caps) => format!("{:0>2}.{:0>2}.{}", &caps[3], &caps[2], &caps[1]),
        None => canonical.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DateKey {
    Valid(NaiveDate),
    Invalid,
}

pub fn parse_for_comparison(raw: &str) -> DateKey {
    match parse_naive(raw) {
        Some(date) => DateKey::Valid(date),
        None => DateKey::Invalid,
    }
}

pub fn parse_naive(raw: &str) -> Option<NaiveDate> {
    let canonical = to_canonical(raw.trim());
    NaiveDate::parse_from_str(&canonical, "%Y-%m-%d").ok()
}
