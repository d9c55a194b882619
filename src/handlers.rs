use crate::chart::GrowthChart;
use crate::errors::AppError;
use crate::grass::render_grass_svg;
use crate::models::{StatusKind, UserQuery, ViewQuery, ViewResponse, ViewStatus};
use crate::provider::fetch_contributions;
use crate::snapshot::{QueryOutcome, Snapshot};
use crate::state::AppState;
use crate::ui::render_index;
use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::{Html, IntoResponse},
};
use serde_json::Value;
use std::sync::Arc;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(state.chart_height))
}

pub async fn get_contributions(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Value>, AppError> {
    let payload = fetch_contributions(state.provider.as_ref(), &query.username).await?;
    Ok(Json(payload))
}

/// Full view for one username. Provider failures are reported in the status
/// while the fallback grid is still rendered.
pub async fn get_view(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<ViewResponse>, AppError> {
    let height = chart_height(&query, state.chart_height)?;
    let key = query.username.trim();
    let outcome = run_query(&state, query.session.as_deref(), key).await;

    let status = match &outcome {
        QueryOutcome::Failed { error, .. } => ViewStatus {
            kind: StatusKind::Error,
            message: Some(format!("Failed to load contributions: {error}")),
        },
        _ if key.is_empty() => ViewStatus {
            kind: StatusKind::Prompt,
            message: Some("Enter a GitHub username".to_string()),
        },
        _ => ViewStatus {
            kind: StatusKind::Ok,
            message: None,
        },
    };
    let stale = matches!(outcome, QueryOutcome::Superseded(_));
    let snapshot = Arc::clone(outcome.snapshot());
    let chart = build_chart(&snapshot, query.width, height);

    Ok(Json(ViewResponse {
        query_key: snapshot.query_key.clone(),
        total: snapshot.total,
        status,
        stale,
        grass_svg: render_grass_svg(&snapshot.calendar, &snapshot.month_labels),
        chart_svg: chart.render(),
        summary: chart.summary(),
        month_labels: snapshot.month_labels.clone(),
        month_boundaries: snapshot.month_boundaries.clone(),
        weekly_totals: snapshot.weekly_totals.clone(),
        growth: snapshot.growth.clone(),
    }))
}

/// Re-renders the growth chart for a new container size from the stored
/// snapshot for the username. Never calls the provider; an unknown username
/// renders the placeholder chart.
pub async fn get_growth_chart(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<impl IntoResponse, AppError> {
    let height = chart_height(&query, state.chart_height)?;
    let key = query.username.trim();
    let snapshot = match state.snapshots.latest_for(key).await {
        Some(snapshot) => snapshot,
        None => Arc::new(Snapshot::placeholder(key)),
    };

    let svg = build_chart(&snapshot, query.width, height).render();
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

async fn run_query(state: &AppState, session: Option<&str>, key: &str) -> QueryOutcome {
    let ticket = state.snapshots.begin(session, key).await;
    let result = fetch_contributions(state.provider.as_ref(), ticket.key()).await;
    state.snapshots.complete(ticket, result).await
}

fn chart_height(query: &ViewQuery, default: f64) -> Result<f64, AppError> {
    match query.height {
        None => Ok(default),
        Some(height) if height.is_finite() && height > 0.0 => Ok(height),
        Some(_) => Err(AppError::bad_request("height must be a positive number")),
    }
}

fn build_chart(snapshot: &Snapshot, width: Option<f64>, height: f64) -> GrowthChart {
    let mut chart = GrowthChart::new(height).with_data(snapshot.growth.clone());
    if let Some(width) = width {
        chart.on_container_resize(width);
    }
    chart
}
