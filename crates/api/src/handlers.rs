use anyhow::Context;
use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use ai_client::{AdviceClient, AdviceClientConfig};
use metrics_engine::{load_csv, load_csv_path};
use models::{ChartSeries, SummaryStatistics};

use crate::error::ApiError;
use crate::state::AppState;
use crate::Result;

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// POST /api/upload
/// Accepts a multipart form with a `file` field containing a CSV, keeps a
/// copy under the uploads directory and replaces the session dataset.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut payload: Option<(String, Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart payload: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("upload.csv").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {e}")))?;
            payload = Some((filename, bytes));
            break;
        }
    }

    let (filename, bytes) =
        payload.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;
    if !filename.to_ascii_lowercase().ends_with(".csv") {
        return Err(ApiError::BadRequest("Please upload a CSV file".to_string()));
    }

    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .context("Creating uploads directory")?;
    let dest = state.upload_dir.join(sanitize_filename(&filename));
    tokio::fs::write(&dest, &bytes)
        .await
        .with_context(|| format!("Writing {}", dest.display()))?;

    let dataset = load_csv(bytes.as_ref())?;
    let rows = dataset.len();
    state.session.write().await.replace(dataset);
    tracing::info!(rows, file = %dest.display(), "dataset replaced from upload");

    Ok(Json(json!({
        "message": "File uploaded successfully",
        "rows": rows
    })))
}

/// GET /api/sample
/// Loads the bundled sample dataset into the session.
pub async fn load_sample(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let path = state.sample_data.clone();
    let dataset = tokio::task::spawn_blocking(move || load_csv_path(&path))
        .await
        .context("Sample load task failed")??;

    let rows = dataset.len();
    state.session.write().await.replace(dataset);
    tracing::info!(rows, "sample dataset loaded");

    Ok(Json(json!({
        "message": "Sample data loaded successfully",
        "rows": rows
    })))
}

/// Everything the dashboard needs in one payload.
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub income_trend: ChartSeries,
    pub expense_breakdown: ChartSeries,
    pub monthly_expenses: ChartSeries,
    pub savings_analysis: ChartSeries,
    pub net_income_trend: ChartSeries,
    pub summary: SummaryStatistics,
}

/// GET /api/analyze
/// Recomputes all chart series and the summary from the current dataset.
pub async fn analyze(State(state): State<AppState>) -> Result<Json<AnalysisResponse>> {
    let session = state.session.read().await;
    let engine = session.engine()?;

    Ok(Json(AnalysisResponse {
        income_trend: engine.income_trend()?,
        expense_breakdown: engine.expense_breakdown()?,
        monthly_expenses: engine.monthly_expenses()?,
        savings_analysis: engine.savings_analysis()?,
        net_income_trend: engine.net_income_trend()?,
        summary: engine.summary()?,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// POST /api/chat
/// Answers a free-text question about the current dataset.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let question = req.question.trim().to_string();
    if question.is_empty() {
        return Err(ApiError::BadRequest("No question provided".to_string()));
    }

    let summary = state.session.read().await.engine()?.summary()?;

    // The advice client is blocking HTTP; keep it off the async runtime.
    let advice = tokio::task::spawn_blocking(move || {
        match AdviceClient::new(AdviceClientConfig::from_env()) {
            Ok(client) => client.generate_advice(&summary, &question),
            Err(err) => {
                tracing::warn!("advice client unavailable: {err:#}");
                ai_client::fallback_advice(&summary)
            }
        }
    })
    .await
    .context("Advice generation task failed")?;

    Ok(Json(ChatResponse { response: advice }))
}

/// Strips path components and unusual characters from a client-supplied
/// filename.
fn sanitize_filename(name: &str) -> String {
    let base = std::path::Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.csv");

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches(|c| c == '_' || c == '.').is_empty() {
        "upload.csv".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_strips_paths() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("my data (1).csv"), "my_data__1_.csv");
        assert_eq!(sanitize_filename("statement.csv"), "statement.csv");
        assert_eq!(sanitize_filename("///"), "upload.csv");
    }
}
