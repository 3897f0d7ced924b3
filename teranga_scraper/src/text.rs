//! Text, number and date normalizers for scraped fields.
//!
//! Everything here is total: malformed input degrades to `None` or zero
//! because the source renders missing data a dozen different ways and none
//! of them should abort an extraction.

use chrono::NaiveDate;
use regex::Regex;

/// French month abbreviations as the source prints them. Matching is by
/// prefix so both "déc." and "décembre" resolve.
const MONTHS_FR: [(&str, u32); 12] = [
    ("janv", 1),
    ("févr", 2),
    ("mars", 3),
    ("avr", 4),
    ("mai", 5),
    ("juin", 6),
    ("juil", 7),
    ("août", 8),
    ("sept", 9),
    ("oct", 10),
    ("nov", 11),
    ("déc", 12),
];

/// Collapses whitespace runs and trims. Empty input becomes `None`.
pub fn clean_text(text: &str) -> Option<String> {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Extracts the first run of digits from a table cell. Dashes, empty cells
/// and anything non-numeric parse to zero, matching how the source renders
/// "no data".
pub fn parse_count(text: &str) -> i64 {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() || compact == "-" || compact == "—" {
        return 0;
    }
    let digits: String = compact
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

/// Parses a French abbreviated date as the source renders it, e.g.
/// "28 déc. 2004 (20)". Anything unparsable, including months outside the
/// table and impossible calendar dates, yields `None`.
pub fn parse_fr_date(text: &str) -> Option<NaiveDate> {
    let re = Regex::new(r"(\d{1,2})\s+(\p{L}+)\.?\s+(\d{4})").ok()?;
    let caps = re.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month_key = caps[2].to_lowercase();
    let month = MONTHS_FR
        .iter()
        .find(|(abbrev, _)| month_key.starts_with(abbrev))
        .map(|(_, number)| *number)?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Finds a birth-date-with-age token ("28 déc. 2004 (20)") anywhere in a
/// block of text. Document-wide fallback for when the dedicated birth-date
/// markup is absent; the age suffix keeps it from matching arbitrary dates.
pub fn find_birth_date(text: &str) -> Option<NaiveDate> {
    let re = Regex::new(r"(\d{1,2})\s+(\p{L}+)\.?\s+(\d{4})\s*\(\d+\)").ok()?;
    let matched = re.find(text)?;
    parse_fr_date(matched.as_str())
}

/// Removes jersey-number tokens ("#10 ") from a headline and normalizes
/// whitespace. `None` when nothing but the token remains.
pub fn strip_jersey(headline: &str) -> Option<String> {
    let re = Regex::new(r"#\d+\s*").ok()?;
    clean_text(&re.replace_all(headline, ""))
}
