use serde_json::Value;

pub struct ContributionPalette;

impl ContributionPalette {
    pub const EMPTY: &'static str = "#dfe1e4";
    pub const LEVEL1: &'static str = "#9be9a8";
    pub const LEVEL2: &'static str = "#40c463";
    pub const LEVEL3: &'static str = "#216e39";
}

/// Picks the fill for a grid cell. Zero activity is never colored, even when
/// the provider supplied a color for the day.
pub fn resolve_color<'a>(count: u64, provided: Option<&'a str>) -> &'a str {
    if count == 0 {
        return ContributionPalette::EMPTY;
    }
    if let Some(color) = provided.filter(|color| !color.is_empty()) {
        return color;
    }
    match count {
        1 => ContributionPalette::LEVEL1,
        2..=3 => ContributionPalette::LEVEL2,
        _ => ContributionPalette::LEVEL3,
    }
}

/// Lenient numeric coercion for counts coming from untyped payloads.
/// Anything that does not yield a finite, non-negative number becomes 0.
pub fn coerce_count(value: &Value) -> u64 {
    let raw = match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                0.0
            } else {
                text.parse::<f64>().unwrap_or(0.0)
            }
        }
        _ => 0.0,
    };

    if raw.is_finite() && raw > 0.0 {
        raw.floor() as u64
    } else {
        0
    }
}
