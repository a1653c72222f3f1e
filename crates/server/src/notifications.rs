use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};

use api_types::notification::NotificationQuery;
use engine::{Notification, User};

use crate::{ServerError, server::ServerState};

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Vec<Notification>>, ServerError> {
    let notifications = state
        .engine
        .notifications(&user.id, query.unread_only)
        .await?;
    Ok(Json(notifications))
}

pub async fn mark_read(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(notification_id): Path<String>,
) -> Result<Json<Notification>, ServerError> {
    let notification = state
        .engine
        .mark_notification_read(&user.id, &notification_id)
        .await?;
    Ok(Json(notification))
}
