//! Text helpers for cards, heroes and detail headers.
//!
//! Only [`today`] reads the clock; everything else takes the date as input.

use chrono::{Local, NaiveDate};

fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

/// `"Mar 5, 2025"`, or `"TBA"` when the date is missing or unparsable.
pub fn format_release_date(date: Option<&str>) -> String {
    date.and_then(parse_date)
        .map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| String::from("TBA"))
}

/// Countdown label for an upcoming release; `None` once the date has passed.
pub fn days_until(date: Option<&str>, today: NaiveDate) -> Option<String> {
    let release = date.and_then(parse_date)?;
    let days = (release - today).num_days();
    match days {
        d if d < 0 => None,
        0 => Some(String::from("Today")),
        1 => Some(String::from("Tomorrow")),
        d => Some(format!("In {} days", d)),
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn release_year(date: &str) -> Option<String> {
    let year = date.trim().get(..4)?;
    year.chars()
        .all(|c| c.is_ascii_digit())
        .then(|| year.to_string())
}

pub fn rating_label(vote_average: f32) -> String {
    format!("{:.1}", vote_average)
}

pub fn truncate_description(description: &str, max_length: usize) -> String {
    if description.chars().count() <= max_length {
        return description.to_string();
    }
    let truncated: String = description.chars().take(max_length).collect();
    format!(
        "{}...",
        truncated.rfind(' ').map_or(truncated.as_str(), |i| &truncated[..i])
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn format_release_date_or_tba() {
        assert_eq!(format_release_date(Some("2025-03-05")), "Mar 5, 2025");
        assert_eq!(format_release_date(Some("2024-12-25")), "Dec 25, 2024");
        assert_eq!(format_release_date(Some("")), "TBA");
        assert_eq!(format_release_date(None), "TBA");
        assert_eq!(format_release_date(Some("soon")), "TBA");
    }

    #[test]
    fn days_until_labels() {
        let today = date(2026, 10, 18);
        assert_eq!(days_until(Some("2026-10-18"), today).as_deref(), Some("Today"));
        assert_eq!(days_until(Some("2026-10-19"), today).as_deref(), Some("Tomorrow"));
        assert_eq!(days_until(Some("2026-11-01"), today).as_deref(), Some("In 14 days"));
        assert_eq!(days_until(Some("2026-10-17"), today), None);
        assert_eq!(days_until(None, today), None);
    }

    #[test]
    fn release_year_takes_leading_digits() {
        assert_eq!(release_year("2010-07-15").as_deref(), Some("2010"));
        assert_eq!(release_year("20"), None);
        assert_eq!(release_year("TBA-x"), None);
    }

    #[test]
    fn rating_label_has_one_decimal() {
        assert_eq!(rating_label(7.0), "7.0");
        assert_eq!(rating_label(8.37), "8.4");
    }

    #[test]
    fn truncate_description_breaks_on_word() {
        assert_eq!(truncate_description("short", 10), "short");
        assert_eq!(
            truncate_description("a thief who steals secrets", 12),
            "a thief who..."
        );
    }
}
