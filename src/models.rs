use serde::{Deserialize, Serialize};

pub const DAYS_PER_WEEK: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Day {
    pub date: String,
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Week {
    pub(crate) days: [Day; DAYS_PER_WEEK],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Calendar {
    pub(crate) weeks: Vec<Week>,
    pub(crate) placeholder: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthLabel {
    pub label: String,
    pub week_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyTotal {
    pub period_end_date: String,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthPoint {
    pub label: String,
    pub value: Option<f64>,
}

impl GrowthPoint {
    /// Value usable for plotting; absent and non-finite values are gaps.
    pub fn defined_value(&self) -> Option<f64> {
        self.value.filter(|value| value.is_finite())
    }
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    #[serde(default)]
    pub username: String,
    pub width: Option<f64>,
    pub height: Option<f64>,
    /// Client page id; stale responses are only detected within one session.
    pub session: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Prompt,
    Ok,
    Error,
}

#[derive(Debug, Serialize)]
pub struct ViewStatus {
    pub kind: StatusKind,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSummary {
    pub latest: String,
    pub latest_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub query_key: String,
    pub total: u64,
    pub status: ViewStatus,
    pub stale: bool,
    pub grass_svg: String,
    pub chart_svg: String,
    pub summary: ChartSummary,
    pub month_labels: Vec<MonthLabel>,
    pub month_boundaries: Vec<usize>,
    pub weekly_totals: Vec<WeeklyTotal>,
    pub growth: Vec<GrowthPoint>,
}
