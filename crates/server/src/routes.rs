// ABOUTME: Feed HTTP handlers: paged video listing and the health probe.
// ABOUTME: Response bodies use camelCase keys for the UI layer.

use axum::extract::{Query, State};
use axum::Json;
use reelfeed_feed::{Cursor, FeedPage, FeedQuery, PageNotice, VideoItem};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct FeedParams {
    pub cursor: Option<String>,
    pub fid: Option<u64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub videos: Vec<VideoItem>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
    pub total_found: usize,
    pub total_available: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<FeedPage> for FeedResponse {
    fn from(page: FeedPage) -> Self {
        let message = page.notice.map(|notice| match notice {
            PageNotice::NoQualifyingVideo { scanned } => format!(
                "No video content found in {scanned} feed entries; try again later or adjust filters"
            ),
        });
        Self {
            total_found: page.items.len(),
            videos: page.items,
            next_cursor: page.next_cursor.map(Cursor::into_inner),
            has_more: page.has_more,
            total_available: page.total_available,
            message,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub mode: &'static str,
    pub api_key_configured: bool,
    pub timestamp: String,
}

pub async fn get_feed(
    State(state): State<AppState>,
    Query(params): Query<FeedParams>,
) -> Result<Json<FeedResponse>, AppError> {
    let assembler = state.assembler().map_err(|e| AppError::from(e.clone()))?;

    let query = FeedQuery {
        cursor: params.cursor.filter(|c| !c.is_empty()).map(Cursor::new),
        limit: params.limit,
        fid: params.fid,
    };
    let page = assembler.get_page(&query).await?;

    tracing::debug!(
        mode = state.mode(),
        videos = page.items.len(),
        has_more = page.has_more,
        "served feed page"
    );
    Ok(Json(FeedResponse::from(page)))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        mode: state.mode(),
        api_key_configured: state.api_key_configured(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
