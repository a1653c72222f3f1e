use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use api_types::group::{GroupNew, GroupUpdate};
use engine::{Group, GroupMember, GroupSummary, User};

use crate::{ServerError, server::ServerState};

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<GroupSummary>>, ServerError> {
    Ok(Json(state.engine.list_groups(&user.id).await?))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<GroupNew>,
) -> Result<(StatusCode, Json<Group>), ServerError> {
    let group = state
        .engine
        .create_group(
            &user.id,
            &payload.name,
            payload.monthly_contribution,
            payload.max_members,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<Group>, ServerError> {
    Ok(Json(state.engine.group(&user.id, &group_id).await?))
}

pub async fn join(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<(StatusCode, Json<GroupMember>), ServerError> {
    let member = state.engine.join_group(&user.id, &group_id).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn leave(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.engine.leave_group(&user.id, &group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn members(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<GroupMember>>, ServerError> {
    Ok(Json(state.engine.group_members(&user.id, &group_id).await?))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
    Json(payload): Json<GroupUpdate>,
) -> Result<Json<Group>, ServerError> {
    let group = state
        .engine
        .update_group(
            &user.id,
            &group_id,
            engine::GroupUpdate {
                name: payload.name,
                monthly_contribution: payload.monthly_contribution,
                max_members: payload.max_members,
            },
        )
        .await?;
    Ok(Json(group))
}

pub async fn remove(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_group(&user.id, &group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
