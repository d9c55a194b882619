//! Growth chart renderer.
//!
//! Maps a growth series onto an SVG viewport: a point scale across the
//! labels, a niced linear scale for percentages, a line that breaks at
//! absent values, thinned date ticks and a latest-value readout. Rendering is
//! a pure function of the current data, width and height, so every call
//! produces the complete chart from scratch.

use crate::grid::parse_date;
use crate::models::{ChartSummary, GrowthPoint};
use std::fmt::Write as _;

pub const MIN_CHART_WIDTH: f64 = 280.0;
pub const DEFAULT_CHART_WIDTH: f64 = 420.0;
pub const DEFAULT_CHART_HEIGHT: f64 = 180.0;

const EMPTY_DOMAIN: (f64, f64) = (-100.0, 100.0);
const NICE_COUNT: f64 = 10.0;
const Y_TICK_COUNT: f64 = 5.0;
const POINT_RADIUS: f64 = 2.5;
const NO_VALUE: &str = "\u{2014}";

struct Margin {
    top: f64,
    right: f64,
    bottom: f64,
    left: f64,
}

const MARGIN: Margin = Margin {
    top: 16.0,
    right: 12.0,
    bottom: 24.0,
    left: 36.0,
};

#[derive(Debug, Clone)]
pub struct GrowthChart {
    width: f64,
    height: f64,
    points: Vec<GrowthPoint>,
    domain: (f64, f64),
}

impl GrowthChart {
    pub fn new(height: f64) -> Self {
        let height = if height.is_finite() && height > 0.0 {
            height
        } else {
            DEFAULT_CHART_HEIGHT
        };
        Self {
            width: DEFAULT_CHART_WIDTH,
            height,
            points: Vec::new(),
            domain: EMPTY_DOMAIN,
        }
    }

    pub fn with_data(mut self, points: Vec<GrowthPoint>) -> Self {
        self.set_data(points);
        self
    }

    pub fn set_data(&mut self, points: Vec<GrowthPoint>) {
        self.domain = y_domain(&points);
        self.points = points;
    }

    /// Applies a container width observation. Returns whether the layout
    /// changed and the chart needs to be drawn again.
    pub fn on_container_resize(&mut self, observed: f64) -> bool {
        let width = observed_width(observed);
        let changed = width != self.width;
        self.width = width;
        changed
    }

    #[cfg(test)]
    pub(crate) fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    #[cfg(test)]
    pub(crate) fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn render(&self) -> String {
        let inner_w = (self.width - MARGIN.left - MARGIN.right).max(10.0);
        let inner_h = (self.height - MARGIN.top - MARGIN.bottom).max(10.0);
        let x = PointScale::new(self.points.len(), inner_w);
        let y = LinearScale::new(self.domain, (inner_h, 0.0)).nice(NICE_COUNT);

        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" class="growth-chart" viewBox="0 0 {w} {h}" width="{w}" height="{h}" role="img" aria-label="Weekly growth line chart">"#,
            w = self.width,
            h = self.height,
        );
        let _ = write!(
            svg,
            r#"<g class="root" transform="translate({},{})">"#,
            MARGIN.left, MARGIN.top
        );

        let (y_ticks, y_step) = y.ticks(Y_TICK_COUNT);

        svg.push_str(r#"<g class="chart-grid">"#);
        for tick in &y_ticks {
            let pos = y.apply(*tick);
            let _ = write!(
                svg,
                r#"<line x1="0" x2="{}" y1="{}" y2="{}" />"#,
                coord(inner_w),
                coord(pos),
                coord(pos)
            );
        }
        svg.push_str("</g>");

        let zero = y.apply(0.0);
        let _ = write!(
            svg,
            r#"<line class="chart-axis" x1="0" x2="{}" y1="{}" y2="{}" />"#,
            coord(inner_w),
            coord(zero),
            coord(zero)
        );

        let _ = write!(
            svg,
            r#"<path class="chart-line" fill="none" d="{}" />"#,
            line_path(&self.points, |index| x.apply(index), |value| y.apply(value))
        );

        svg.push_str(r#"<g class="chart-points">"#);
        for (index, point) in self.points.iter().enumerate() {
            if let Some(value) = point.defined_value() {
                let _ = write!(
                    svg,
                    r#"<circle cx="{}" cy="{}" r="{}" />"#,
                    coord(x.apply(index)),
                    coord(y.apply(value)),
                    POINT_RADIUS
                );
            }
        }
        svg.push_str("</g>");

        let _ = write!(
            svg,
            r#"<g class="x-axis" transform="translate(0,{})">"#,
            coord(inner_h)
        );
        for index in x_tick_indices(self.points.len()) {
            let _ = write!(
                svg,
                r#"<text class="chart-label" transform="translate({},3) rotate(-45)" text-anchor="end" dx="-0.35em" dy="0.6em">{}</text>"#,
                coord(x.apply(index)),
                escape_xml(&axis_date(&self.points[index].label))
            );
        }
        svg.push_str("</g>");

        svg.push_str(r#"<g class="y-axis">"#);
        for tick in &y_ticks {
            let _ = write!(
                svg,
                r#"<text class="chart-label" x="-6" y="{}" dy="0.32em" text-anchor="end">{}</text>"#,
                coord(y.apply(*tick)),
                percent_tick(*tick, y_step)
            );
        }
        svg.push_str("</g>");

        if self.points.is_empty() {
            let _ = write!(
                svg,
                r#"<text class="chart-label" x="{}" y="{}" text-anchor="middle">No data yet</text>"#,
                coord(inner_w / 2.0),
                coord(inner_h / 2.0)
            );
        }

        svg.push_str("</g></svg>");
        svg
    }

    pub fn summary(&self) -> ChartSummary {
        let latest = self
            .points
            .iter()
            .rev()
            .find_map(GrowthPoint::defined_value)
            .map(|value| {
                let sign = if value > 0.0 { "+" } else { "" };
                format!("{sign}{value:.1}%")
            })
            .unwrap_or_else(|| NO_VALUE.to_string());

        let latest_date = self
            .points
            .iter()
            .rev()
            .find(|point| !point.label.is_empty())
            .map(|point| match parse_date(&point.label) {
                Some(date) => date.format("%Y-%m-%d").to_string(),
                None => point.label.clone(),
            });

        ChartSummary {
            latest,
            latest_date,
        }
    }
}

/// Container widths are floored to whole units and never drop below the
/// legible minimum.
pub fn observed_width(raw: f64) -> f64 {
    if raw.is_finite() {
        raw.floor().max(MIN_CHART_WIDTH)
    } else {
        MIN_CHART_WIDTH
    }
}

/// Vertical domain over the defined values, always containing zero.
pub fn y_domain(points: &[GrowthPoint]) -> (f64, f64) {
    let mut values = points.iter().filter_map(GrowthPoint::defined_value);
    let Some(first) = values.next() else {
        return EMPTY_DOMAIN;
    };
    let (min_raw, max_raw) = values.fold((first, first), |(lo, hi), value| {
        (lo.min(value), hi.max(value))
    });

    let pad = if min_raw == 0.0 {
        (max_raw * 0.05).max(10.0)
    } else {
        ((max_raw - min_raw) * 0.1).max(10.0)
    };

    ((min_raw - pad).min(0.0), (max_raw + pad).max(0.0))
}

/// Indices of the x labels to draw: roughly one per four points.
pub fn x_tick_indices(len: usize) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    let tick_count = (len / 4).max(2);
    let stride = len.div_ceil(tick_count);
    (0..len).step_by(stride).collect()
}

/// SVG path through consecutive defined points, drawn as a monotone cubic
/// in x so the curve never overshoots between data points. An absent point
/// ends the current run; the next defined point starts a new subpath.
pub fn line_path(
    points: &[GrowthPoint],
    x: impl Fn(usize) -> f64,
    y: impl Fn(f64) -> f64,
) -> String {
    let mut path = String::new();
    let mut run: Vec<(f64, f64)> = Vec::new();
    for (index, point) in points.iter().enumerate() {
        match point.defined_value() {
            Some(value) => run.push((x(index), y(value))),
            None => {
                monotone_run(&mut path, &run);
                run.clear();
            }
        }
    }
    monotone_run(&mut path, &run);
    path
}

fn monotone_run(path: &mut String, run: &[(f64, f64)]) {
    let Some(&(x0, y0)) = run.first() else {
        return;
    };
    let _ = write!(path, "M{},{}", coord(x0), coord(y0));
    if run.len() == 2 {
        let (x1, y1) = run[1];
        let _ = write!(path, "L{},{}", coord(x1), coord(y1));
    }
    if run.len() < 3 {
        return;
    }

    let last = run.len() - 1;
    let mut tangents = vec![0.0; run.len()];
    for index in 1..last {
        tangents[index] = interior_tangent(run[index - 1], run[index], run[index + 1]);
    }
    tangents[0] = end_tangent(run[0], run[1], tangents[1]);
    tangents[last] = end_tangent(run[last - 1], run[last], tangents[last - 1]);

    for index in 0..last {
        let (x0, y0) = run[index];
        let (x1, y1) = run[index + 1];
        let dx = (x1 - x0) / 3.0;
        let _ = write!(
            path,
            "C{},{},{},{},{},{}",
            coord(x0 + dx),
            coord(y0 + dx * tangents[index]),
            coord(x1 - dx),
            coord(y1 - dx * tangents[index + 1]),
            coord(x1),
            coord(y1)
        );
    }
}

/// Steffen's slope limiter: zero at local extrema, otherwise bounded by the
/// neighbouring secants.
fn interior_tangent(p0: (f64, f64), p1: (f64, f64), p2: (f64, f64)) -> f64 {
    let h0 = p1.0 - p0.0;
    let h1 = p2.0 - p1.0;
    if h0 == 0.0 || h1 == 0.0 {
        return 0.0;
    }
    let s0 = (p1.1 - p0.1) / h0;
    let s1 = (p2.1 - p1.1) / h1;
    let p = (s0 * h1 + s1 * h0) / (h0 + h1);
    let sign = |v: f64| if v < 0.0 { -1.0 } else { 1.0 };
    let tangent = (sign(s0) + sign(s1)) * s0.abs().min(s1.abs()).min(0.5 * p.abs());
    if tangent.is_finite() { tangent } else { 0.0 }
}

fn end_tangent(p0: (f64, f64), p1: (f64, f64), neighbour: f64) -> f64 {
    let h = p1.0 - p0.0;
    if h == 0.0 {
        neighbour
    } else {
        (3.0 * (p1.1 - p0.1) / h - neighbour) / 2.0
    }
}

fn axis_date(label: &str) -> String {
    match parse_date(label) {
        Some(date) => date.format("%m/%d").to_string(),
        None => label.to_string(),
    }
}

fn percent_tick(value: f64, step: f64) -> String {
    let decimals = if step > 0.0 && step.is_finite() {
        (-step.log10().floor()).max(0.0) as usize
    } else {
        0
    };
    let text = format!("{value:.decimals$}");
    if text.trim_start_matches('-').trim_matches(|c: char| c == '0' || c == '.').is_empty() {
        "0%".to_string()
    } else {
        format!("{text}%")
    }
}

fn coord(value: f64) -> String {
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

pub(crate) fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Evenly spaced categorical positions with half a step of outer padding.
struct PointScale {
    step: f64,
}

impl PointScale {
    fn new(len: usize, extent: f64) -> Self {
        Self {
            step: extent / len.max(1) as f64,
        }
    }

    fn apply(&self, index: usize) -> f64 {
        self.step * (index as f64 + 0.5)
    }
}

struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    fn apply(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }

    /// Extends the domain outward to round step boundaries.
    fn nice(mut self, count: f64) -> Self {
        let (mut start, mut stop) = self.domain;
        if !(start < stop) {
            return self;
        }
        let mut previous = None;
        for _ in 0..10 {
            let step = tick_increment(start, stop, count);
            if previous == Some(step) {
                break;
            }
            if step > 0.0 {
                start = (start / step).floor() * step;
                stop = (stop / step).ceil() * step;
            } else if step < 0.0 {
                start = (start * step).ceil() / step;
                stop = (stop * step).floor() / step;
            } else {
                break;
            }
            previous = Some(step);
        }
        self.domain = (start, stop);
        self
    }

    /// Round tick values inside the domain, plus the step between them.
    fn ticks(&self, count: f64) -> (Vec<f64>, f64) {
        let (start, stop) = self.domain;
        if !(start < stop) || count <= 0.0 {
            return (vec![start], 0.0);
        }
        let Some((i1, i2, inc)) = tick_spec(start, stop, count) else {
            return (Vec::new(), 0.0);
        };
        let ticks = (i1..=i2)
            .map(|i| {
                if inc < 0.0 {
                    i as f64 / -inc
                } else {
                    i as f64 * inc
                }
            })
            .collect();
        let step = if inc < 0.0 { 1.0 / -inc } else { inc };
        (ticks, step)
    }
}

fn step_factor(step: f64) -> (f64, f64) {
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    (power, factor)
}

fn tick_increment(start: f64, stop: f64, count: f64) -> f64 {
    let step = (stop - start) / count.max(0.0);
    if !(step.is_finite() && step > 0.0) {
        return 0.0;
    }
    let (power, factor) = step_factor(step);
    if power >= 0.0 {
        factor * 10f64.powf(power)
    } else {
        -10f64.powf(-power) / factor
    }
}

fn tick_spec(start: f64, stop: f64, count: f64) -> Option<(i64, i64, f64)> {
    let step = (stop - start) / count.max(0.0);
    if !(step.is_finite() && step > 0.0) {
        return None;
    }
    let (power, factor) = step_factor(step);
    let (i1, i2, inc) = if power < 0.0 {
        let inc = 10f64.powf(-power) / factor;
        let mut i1 = (start * inc).round();
        let mut i2 = (stop * inc).round();
        if i1 / inc < start {
            i1 += 1.0;
        }
        if i2 / inc > stop {
            i2 -= 1.0;
        }
        (i1, i2, -inc)
    } else {
        let inc = 10f64.powf(power) * factor;
        let mut i1 = (start / inc).round();
        let mut i2 = (stop / inc).round();
        if i1 * inc < start {
            i1 += 1.0;
        }
        if i2 * inc > stop {
            i2 -= 1.0;
        }
        (i1, i2, inc)
    };
    if i2 < i1 && (0.5..2.0).contains(&count) {
        return tick_spec(start, stop, count * 2.0);
    }
    Some((i1 as i64, i2 as i64, inc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(label: &str, value: Option<f64>) -> GrowthPoint {
        GrowthPoint {
            label: label.to_string(),
            value,
        }
    }

    fn series(values: &[Option<f64>]) -> Vec<GrowthPoint> {
        values
            .iter()
            .enumerate()
            .map(|(index, value)| point(&format!("2024-01-{:02}", index + 1), *value))
            .collect()
    }

    #[test]
    fn domain_defaults_without_defined_values() {
        assert_eq!(y_domain(&[]), (-100.0, 100.0));
        assert_eq!(y_domain(&series(&[None, Some(f64::NAN)])), (-100.0, 100.0));
    }

    #[test]
    fn domain_pads_from_zero_minimum_by_max() {
        // min 0: pad = max(10, 400 * 0.05) = 20
        assert_eq!(y_domain(&series(&[None, Some(0.0), Some(400.0)])), (-20.0, 420.0));
        // small max keeps the 10 unit floor
        assert_eq!(y_domain(&series(&[Some(0.0), Some(50.0)])), (-10.0, 60.0));
    }

    #[test]
    fn domain_pads_by_range_otherwise() {
        // range 300: pad = 30
        assert_eq!(y_domain(&series(&[Some(-100.0), Some(200.0)])), (-130.0, 230.0));
        // all positive values still include zero
        assert_eq!(y_domain(&series(&[Some(40.0), Some(60.0)])), (0.0, 70.0));
        // all negative values still include zero
        assert_eq!(y_domain(&series(&[Some(-40.0), Some(-60.0)])), (-70.0, 0.0));
    }

    #[test]
    fn width_is_floored_and_clamped() {
        let mut chart = GrowthChart::new(180.0);
        assert_eq!(chart.width(), DEFAULT_CHART_WIDTH);
        assert!(chart.on_container_resize(640.7));
        assert_eq!(chart.width(), 640.0);
        assert!(!chart.on_container_resize(640.2));
        assert!(chart.on_container_resize(120.0));
        assert_eq!(chart.width(), MIN_CHART_WIDTH);
        assert!(!chart.on_container_resize(f64::NAN));
    }

    #[test]
    fn line_path_breaks_at_absent_points() {
        let points = series(&[Some(10.0), None, Some(20.0)]);
        let path = line_path(&points, |i| i as f64 * 10.0, |v| v);
        assert_eq!(path, "M0,10M20,20");
        assert!(!path.contains('L'));
    }

    #[test]
    fn line_path_connects_consecutive_defined_points() {
        let points = series(&[None, Some(1.0), Some(2.0), None, Some(3.0), Some(4.0)]);
        let path = line_path(&points, |i| i as f64, |v| v * 2.0);
        assert_eq!(path, "M1,2L2,4M4,6L5,8");
    }

    #[test]
    fn line_path_curves_without_overshoot() {
        let straight = series(&[Some(0.0), Some(3.0), Some(6.0)]);
        let path = line_path(&straight, |i| i as f64 * 3.0, |v| v);
        assert_eq!(path, "M0,0C1,1,2,2,3,3C4,4,5,5,6,6");

        // the peak gets a flat tangent, so no control point rises above it
        let peak = series(&[Some(0.0), Some(6.0), Some(0.0)]);
        let path = line_path(&peak, |i| i as f64 * 3.0, |v| v);
        assert_eq!(path, "M0,0C1,3,2,6,3,6C4,6,5,3,6,0");
    }

    #[test]
    fn x_ticks_follow_stride() {
        assert!(x_tick_indices(0).is_empty());
        assert_eq!(x_tick_indices(1), vec![0]);
        assert_eq!(x_tick_indices(5), vec![0, 3]);
        // 52 points: 13 ticks, stride 4
        let ticks = x_tick_indices(52);
        assert_eq!(ticks.len(), 13);
        assert_eq!(ticks[1], 4);
    }

    #[test]
    fn nice_domain_and_ticks() {
        let scale = LinearScale::new((-10.0, 160.0), (100.0, 0.0)).nice(NICE_COUNT);
        assert_eq!(scale.domain, (-20.0, 160.0));
        let (ticks, step) = scale.ticks(Y_TICK_COUNT);
        assert_eq!(ticks, vec![0.0, 50.0, 100.0, 150.0]);
        assert_eq!(step, 50.0);

        let default = LinearScale::new(EMPTY_DOMAIN, (100.0, 0.0)).nice(NICE_COUNT);
        assert_eq!(default.domain, (-100.0, 100.0));
        let (ticks, _) = default.ticks(Y_TICK_COUNT);
        assert_eq!(ticks, vec![-100.0, -50.0, 0.0, 50.0, 100.0]);
    }

    #[test]
    fn percent_ticks_are_suffixed() {
        assert_eq!(percent_tick(50.0, 50.0), "50%");
        assert_eq!(percent_tick(-100.0, 50.0), "-100%");
        assert_eq!(percent_tick(0.5, 0.5), "0.5%");
        assert_eq!(percent_tick(-0.0, 20.0), "0%");
    }

    #[test]
    fn summary_uses_latest_defined_value() {
        let chart = GrowthChart::new(180.0).with_data(series(&[None, Some(12.34), None]));
        let summary = chart.summary();
        assert_eq!(summary.latest, "+12.3%");
        assert_eq!(summary.latest_date.as_deref(), Some("2024-01-03"));

        let falling = GrowthChart::new(180.0).with_data(series(&[None, Some(-50.0)]));
        assert_eq!(falling.summary().latest, "-50.0%");

        let flat = GrowthChart::new(180.0).with_data(series(&[None, Some(0.0)]));
        assert_eq!(flat.summary().latest, "0.0%");
    }

    #[test]
    fn summary_placeholders() {
        let chart = GrowthChart::new(180.0).with_data(vec![point("", None), point("", None)]);
        let summary = chart.summary();
        assert_eq!(summary.latest, "\u{2014}");
        assert_eq!(summary.latest_date, None);

        let odd = GrowthChart::new(180.0).with_data(vec![point("week 9", Some(1.0))]);
        assert_eq!(odd.summary().latest_date.as_deref(), Some("week 9"));
    }

    #[test]
    fn render_is_repeatable_and_sized() {
        let mut chart = GrowthChart::new(200.0).with_data(series(&[None, Some(50.0), Some(-25.0)]));
        assert_eq!(chart.domain(), (-35.0, 60.0));
        chart.on_container_resize(500.0);
        let first = chart.render();
        assert_eq!(first, chart.render());
        assert!(first.contains(r#"viewBox="0 0 500 200""#));
        assert_eq!(first.matches("<circle").count(), 2);
        assert!(first.contains("01/01"));
        assert!(first.contains("%</text>"));
        assert!(!first.contains("No data yet"));

        chart.on_container_resize(300.0);
        assert_ne!(first, chart.render());
    }

    #[test]
    fn render_empty_series() {
        let chart = GrowthChart::new(180.0);
        let svg = chart.render();
        assert!(svg.contains("No data yet"));
        assert!(svg.contains(r#"d="""#));
        assert!(svg.contains("-100%"));
    }

    #[test]
    fn labels_are_escaped() {
        let chart = GrowthChart::new(180.0).with_data(vec![point("<b>", Some(1.0)), point("x", None)]);
        let svg = chart.render();
        assert!(svg.contains("&lt;b&gt;"));
        assert!(!svg.contains("<b>"));
    }
}
