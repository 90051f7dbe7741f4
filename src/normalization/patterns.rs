//! Shape heuristics used to spot values stored in the wrong column.

use std::sync::OnceLock;

use regex::Regex;

/// `^\d`: an IP address (or any numeric junk) where a URL should be.
static LEADING_DIGIT: OnceLock<Regex> = OnceLock::new();

/// `^\d{2}-\d{2}-\d{4}`: a `dd-mm-yyyy` date, possibly followed by a time.
static DMY_DATE_PREFIX: OnceLock<Regex> = OnceLock::new();

/// Date prefixes of the three export layouts, each with an unsigned
/// four-digit year and a space before the time.
static DMY_DASH_STAMP: OnceLock<Regex> = OnceLock::new();
static DMY_SLASH_STAMP: OnceLock<Regex> = OnceLock::new();
static YDM_DASH_STAMP: OnceLock<Regex> = OnceLock::new();

pub fn starts_with_digit(value: &str) -> bool {
    LEADING_DIGIT
        .get_or_init(|| Regex::new(r"^\d").expect("static regex"))
        .is_match(value)
}

pub fn has_dmy_date_prefix(value: &str) -> bool {
    DMY_DATE_PREFIX
        .get_or_init(|| Regex::new(r"^\d{2}-\d{2}-\d{4}").expect("static regex"))
        .is_match(value)
}

pub fn is_dmy_dash_stamp(value: &str) -> bool {
    DMY_DASH_STAMP
        .get_or_init(|| Regex::new(r"^\d{1,2}-\d{1,2}-\d{4} ").expect("static regex"))
        .is_match(value)
}

pub fn is_dmy_slash_stamp(value: &str) -> bool {
    DMY_SLASH_STAMP
        .get_or_init(|| Regex::new(r"^\d{1,2}/\d{1,2}/\d{4} ").expect("static regex"))
        .is_match(value)
}

pub fn is_ydm_dash_stamp(value: &str) -> bool {
    YDM_DASH_STAMP
        .get_or_init(|| Regex::new(r"^\d{4}-\d{1,2}-\d{1,2} ").expect("static regex"))
        .is_match(value)
}
