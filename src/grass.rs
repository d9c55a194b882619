use crate::chart::escape_xml;
use crate::colors::{ContributionPalette, resolve_color};
use crate::models::{Calendar, MonthLabel};
use crate::months::month_boundaries;
use std::fmt::Write as _;

const CELL: usize = 10;
const GAP: usize = 2;
const PITCH: usize = CELL + GAP;
const LEFT: usize = 28;
const TOP: usize = 16;
const WEEKDAY_LABELS: [(usize, &str); 3] = [(1, "Mon"), (3, "Wed"), (5, "Fri")];

/// Week-major contribution grid: one column per week, Sunday on top.
pub fn render_grass_svg(calendar: &Calendar, labels: &[MonthLabel]) -> String {
    let columns = calendar.weeks().len();
    let width = LEFT + columns * PITCH;
    let height = TOP + 7 * PITCH;
    let aria = if calendar.is_placeholder() {
        "Contribution calendar, no data"
    } else {
        "Contribution calendar"
    };

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="grass" viewBox="0 0 {width} {height}" width="{width}" height="{height}" role="img" aria-label="{aria}">"#
    );

    svg.push_str(r#"<g class="month-labels">"#);
    for label in labels {
        let _ = write!(
            svg,
            r#"<text class="grass-label" x="{}" y="{}">{}</text>"#,
            LEFT + label.week_index * PITCH,
            TOP - 5,
            escape_xml(&label.label)
        );
    }
    svg.push_str("</g>");

    svg.push_str(r#"<g class="weekday-labels">"#);
    for (row, name) in WEEKDAY_LABELS {
        let _ = write!(
            svg,
            r#"<text class="grass-label" x="0" y="{}">{name}</text>"#,
            TOP + row * PITCH + CELL - 1
        );
    }
    svg.push_str("</g>");

    svg.push_str(r#"<g class="month-separators">"#);
    for week_index in month_boundaries(labels) {
        let x = (LEFT + week_index * PITCH) as f64 - GAP as f64 / 2.0;
        let _ = write!(
            svg,
            r#"<line x1="{x}" x2="{x}" y1="{TOP}" y2="{}" />"#,
            height - GAP
        );
    }
    svg.push_str("</g>");

    svg.push_str(r#"<g class="cells">"#);
    for (column, week) in calendar.weeks().iter().enumerate() {
        for (row, day) in week.days().iter().enumerate() {
            let fill = if day.is_dated() {
                resolve_color(day.count, day.color.as_deref())
            } else {
                ContributionPalette::EMPTY
            };
            let _ = write!(
                svg,
                r#"<rect x="{}" y="{}" width="{CELL}" height="{CELL}" rx="2" fill="{}""#,
                LEFT + column * PITCH,
                TOP + row * PITCH,
                escape_xml(fill)
            );
            if day.is_dated() {
                let _ = write!(
                    svg,
                    "><title>{}: {} contributions</title></rect>",
                    escape_xml(&day.date),
                    day.count
                );
            } else {
                svg.push_str(" />");
            }
        }
    }
    svg.push_str("</g></svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::months::month_labels;
    use serde_json::json;

    #[test]
    fn placeholder_grid_renders_all_empty_cells() {
        let calendar = Calendar::placeholder();
        let svg = render_grass_svg(&calendar, &month_labels(&calendar));
        assert_eq!(svg.matches("<rect").count(), 53 * 7);
        assert_eq!(
            svg.matches(&format!(r#"fill="{}""#, ContributionPalette::EMPTY)).count(),
            53 * 7
        );
        assert!(!svg.contains("<title>"));
        assert!(!svg.contains("<line"));
        assert!(svg.contains(r#"aria-label="Contribution calendar, no data""#));
    }

    #[test]
    fn cells_use_resolved_colors_and_tooltips() {
        let payload = json!({
            "contributions": [
                [
                    { "date": "2024-01-28", "count": 0, "color": "#123456" },
                    { "date": "2024-01-29", "count": 2 },
                    { "date": "2024-01-30", "count": 9, "color": "#0e4429" }
                ],
                [{ "date": "2024-02-04", "count": 1 }]
            ]
        });
        let calendar = Calendar::from_payload(&payload);
        let labels = month_labels(&calendar);
        let svg = render_grass_svg(&calendar, &labels);

        assert!(!svg.contains("#123456"));
        assert!(svg.contains(ContributionPalette::LEVEL2));
        assert!(svg.contains("#0e4429"));
        assert!(svg.contains("<title>2024-01-30: 9 contributions</title>"));
        assert_eq!(svg.matches("<title>").count(), 4);
        assert!(svg.contains(">Jan</text>"));
        assert!(svg.contains(">Feb</text>"));
        assert!(svg.contains(r#"aria-label="Contribution calendar""#));
        // one interior separator, before the February column
        assert_eq!(svg.matches("<line").count(), 1);
        assert!(svg.contains(r#"x1="39""#));
    }

    #[test]
    fn undated_cells_render_empty() {
        let payload = json!({ "contributions": [[{ "date": "", "count": 5, "color": "#216e39" }]] });
        let calendar = Calendar::from_payload(&payload);
        let svg = render_grass_svg(&calendar, &month_labels(&calendar));
        assert_eq!(
            svg.matches(&format!(r#"fill="{}""#, ContributionPalette::EMPTY)).count(),
            7
        );
        assert!(!svg.contains(ContributionPalette::LEVEL3));
    }
}
