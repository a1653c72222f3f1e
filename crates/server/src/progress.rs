use axum::{
    Extension, Json,
    extract::{Query, State},
};

use api_types::progress::{MarkPaid, ProgressQuery};
use engine::{Progress, User};

use crate::{ServerError, server::ServerState};

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<ProgressQuery>,
) -> Result<Json<Vec<Progress>>, ServerError> {
    let rows = state
        .engine
        .progress_for(&user.id, query.group_id.as_deref())
        .await?;
    Ok(Json(rows))
}

pub async fn mark_as_paid(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<MarkPaid>,
) -> Result<Json<Progress>, ServerError> {
    let row = state
        .engine
        .mark_as_paid(&user.id, &payload.group_id, payload.note.as_deref())
        .await?;
    Ok(Json(row))
}
