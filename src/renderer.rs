//! # Prayer Window Text Rendering
//!
//! Plain-text views of a derived day for terminals and logs: a table of the day's
//! windows with the active one marked, and a one-line countdown.

use crate::scheduler::PrayerSnapshot;
use crate::windows::DerivedDay;
use crate::Category;
use chrono::NaiveDateTime;
use std::fmt::Write;

fn category_tag(category: Category) -> &'static str {
    match category {
        Category::Obligatory => "fard",
        Category::Recommended => "sunnah",
        Category::Discouraged => "makruh",
    }
}

/// Render the windows of `day`, marking the one that contains `now`.
///
/// ```text
///    Fajr      04:40 - 05:50  fard
/// ▶  Dhuhr     12:05 - 15:20  fard
/// ```
pub fn render_table(day: &DerivedDay, now: NaiveDateTime) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Prayer windows for {}", day.date().format("%A %-d %B %Y"));
    for window in day.windows() {
        let marker = if window.contains(now) { "▶" } else { " " };
        let _ = writeln!(
            out,
            "{marker}  {:<9} {} - {}  {}",
            window.label.name(),
            window.start.format("%H:%M"),
            window.end.format("%H:%M"),
            category_tag(window.category),
        );
    }
    out
}

/// One-line status: current window and the countdown to the next.
pub fn render_status(snapshot: &PrayerSnapshot) -> String {
    let mut line = match (
        &snapshot.current_window_label,
        &snapshot.time_remaining_formatted,
    ) {
        (Some(current), Some(countdown)) => format!("{current} now, {countdown}"),
        _ => "No prayer window available".to_string(),
    };
    if let Some(arabic) = snapshot.next_window_arabic_label {
        let _ = write!(line, " ({arabic})");
    }
    if let Some(location) = &snapshot.location_label {
        let _ = write!(line, " [{location}]");
    }
    if let Some(error) = &snapshot.last_error {
        let _ = write!(line, " ⚠ {error}");
    }
    line
}

/// Print the table and the status line to stdout.
pub fn draw_ascii(day: &DerivedDay, snapshot: &PrayerSnapshot, now: NaiveDateTime) {
    print!("{}", render_table(day, now));
    println!();
    println!("{}", render_status(snapshot));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::FixedTimesProvider;
    use crate::provider::PrayerTimesProvider;
    use crate::{windows, WindowLabel};
    use chrono::NaiveDate;

    #[test]
    fn test_table_marks_active_window() {
        let provider = FixedTimesProvider::default();
        let d = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let base = provider.compute_base_times(0.0, 0.0, d).unwrap();
        let next = provider
            .compute_base_times(0.0, 0.0, d.succ_opt().unwrap())
            .unwrap();
        let day = windows::derive(&base, next.fajr).unwrap();

        let table = render_table(&day, d.and_hms_opt(13, 0, 0).unwrap());
        let marked: Vec<_> = table.lines().filter(|l| l.starts_with('▶')).collect();
        assert_eq!(marked.len(), 1);
        assert!(marked[0].contains("Dhuhr"));
        assert!(marked[0].contains("12:05 - 15:20"));
        assert!(table.contains("Tahajjud  01:06 - 04:40"));
    }

    #[test]
    fn test_status_line() {
        let snapshot = PrayerSnapshot {
            location_label: Some("Jakarta".to_string()),
            current_window_label: Some(WindowLabel::Tahajjud),
            current_window_category: Some(Category::Recommended),
            next_window_label: Some(WindowLabel::Fajr),
            next_window_arabic_label: Some(WindowLabel::Fajr.arabic_name()),
            time_remaining_formatted: Some("Fajr in 3 hours".to_string()),
            last_error: None,
        };
        assert_eq!(
            render_status(&snapshot),
            "Tahajjud now, Fajr in 3 hours (الفجر) [Jakarta]"
        );
    }

    #[test]
    fn test_status_without_window() {
        let snapshot = PrayerSnapshot {
            last_error: Some("no location set".to_string()),
            ..PrayerSnapshot::default()
        };
        assert_eq!(
            render_status(&snapshot),
            "No prayer window available ⚠ no location set"
        );
    }
}
