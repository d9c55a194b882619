use crate::models::{Calendar, MonthLabel};
use chrono::Datelike;

/// One label per month transition, attributed to the week whose first dated
/// day is the first seen in that month. Weeks without a parseable date are
/// skipped and leave the running month untouched.
pub fn month_labels(calendar: &Calendar) -> Vec<MonthLabel> {
    let mut labels = Vec::new();
    let mut last_month = None;

    for (week_index, week) in calendar.weeks().iter().enumerate() {
        let Some(date) = week.first_dated().and_then(|day| day.parsed_date()) else {
            continue;
        };

        let month = date.month0();
        if last_month != Some(month) {
            labels.push(MonthLabel {
                label: date.format("%b").to_string(),
                week_index,
            });
            last_month = Some(month);
        }
    }

    labels
}

/// Week indices that get an interior separator. The leading label never does.
pub fn month_boundaries(labels: &[MonthLabel]) -> Vec<usize> {
    labels.iter().skip(1).map(|label| label.week_index).collect()
}
