use crate::models::{Calendar, GrowthPoint, WeeklyTotal};

pub const GROWTH_WINDOW_WEEKS: usize = 52;

/// Growth reported when a week rises from a zero baseline.
pub const GROWTH_FROM_ZERO: f64 = 100.0;

pub fn weekly_totals(calendar: &Calendar) -> Vec<WeeklyTotal> {
    calendar
        .weeks()
        .iter()
        .map(|week| {
            let period_end_date = week
                .last_dated()
                .or_else(|| week.first_dated())
                .map(|day| day.date.clone())
                .unwrap_or_default();
            WeeklyTotal {
                period_end_date,
                total: week.total(),
            }
        })
        .collect()
}

/// Keeps the most recent weeks, dropping the oldest.
pub fn trim_recent(totals: &[WeeklyTotal]) -> &[WeeklyTotal] {
    let start = totals.len().saturating_sub(GROWTH_WINDOW_WEEKS);
    &totals[start..]
}

/// Week-over-week change in percent. The first point has no prior week and a
/// zero baseline maps to 0 (flat) or +100 (any rise) instead of a ratio.
pub fn growth_series(totals: &[WeeklyTotal]) -> Vec<GrowthPoint> {
    totals
        .iter()
        .enumerate()
        .map(|(index, week)| {
            let value = match index.checked_sub(1).map(|prev| totals[prev].total) {
                None => None,
                Some(0) if week.total == 0 => Some(0.0),
                Some(0) => Some(GROWTH_FROM_ZERO),
                Some(previous) => {
                    let change = (week.total as f64 - previous as f64) / previous as f64 * 100.0;
                    change.is_finite().then_some(change)
                }
            };
            GrowthPoint {
                label: week.period_end_date.clone(),
                value,
            }
        })
        .collect()
}
