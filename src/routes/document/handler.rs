use axum::{
    Json,
    extract::State,
};

use crate::AppState;
use crate::error::AppResult;
use crate::utils::{ApiResponse, AppQuery, success_to_api_response};

use super::model::{Document, DocumentQuery};

pub async fn list_documents(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<DocumentQuery>,
) -> AppResult<Json<ApiResponse<Vec<Document>>>> {
    let range = query.range()?;
    let documents = Document::find_in_range(&state.pool, &range, query.doc_type()).await?;
    tracing::debug!(
        "documents {:?}..{:?}: {} rows",
        range.start,
        range.end,
        documents.len()
    );
    Ok(success_to_api_response(documents))
}
