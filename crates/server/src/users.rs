//! Account endpoints: registration, own profile and admin user management.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use api_types::user::{ProfileUpdate, Role, RoleUpdate, SignUp, UserUpdate};
use engine::User;

use crate::{ServerError, server::ServerState};

fn engine_role(role: Role) -> engine::Role {
    match role {
        Role::User => engine::Role::User,
        Role::Admin => engine::Role::Admin,
    }
}

pub async fn sign_up(
    State(state): State<ServerState>,
    Json(payload): Json<SignUp>,
) -> Result<(StatusCode, Json<User>), ServerError> {
    let user = state
        .engine
        .sign_up(&payload.email, &payload.password, &payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn me(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<User>, ServerError> {
    Ok(Json(state.engine.profile(&user.id).await?))
}

pub async fn update_profile(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<User>, ServerError> {
    let updated = state
        .engine
        .update_profile(
            &user.id,
            engine::ProfileUpdate {
                name: payload.name,
                bank_account: payload.bank_account,
                avatar_url: payload.avatar_url,
            },
        )
        .await?;
    Ok(Json(updated))
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<User>>, ServerError> {
    Ok(Json(state.engine.list_users(&user.id).await?))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<User>, ServerError> {
    let updated = state
        .engine
        .update_user(
            &user.id,
            &user_id,
            engine::UserUpdate {
                name: payload.name,
                role: payload.role.map(engine_role),
                loan_category: payload.loan_category,
                bank_account: payload.bank_account,
                stars: payload.stars,
            },
        )
        .await?;
    Ok(Json(updated))
}

pub async fn update_role(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
    Json(payload): Json<RoleUpdate>,
) -> Result<Json<User>, ServerError> {
    let updated = state
        .engine
        .update_user_role(&user.id, &user_id, engine_role(payload.role))
        .await?;
    Ok(Json(updated))
}

pub async fn remove(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_user(&user.id, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
