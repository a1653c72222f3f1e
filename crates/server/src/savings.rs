//! Savings pool endpoints. Invitations are answered through the
//! notification that carried them.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use api_types::savings::{DepositNew, MemberInvite, MessageNew, SavingsAccountNew, SavingsRename};
use engine::{
    SavingsAccount, SavingsDetail, SavingsMember, SavingsMessage, SavingsSummary,
    SavingsTransaction, User,
};

use crate::{ServerError, server::ServerState};

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<SavingsSummary>>, ServerError> {
    Ok(Json(state.engine.my_savings_accounts(&user.id).await?))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<SavingsAccountNew>,
) -> Result<(StatusCode, Json<SavingsAccount>), ServerError> {
    let account = state
        .engine
        .create_savings_account(&user.id, &payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn detail(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(account_id): Path<String>,
) -> Result<Json<SavingsDetail>, ServerError> {
    Ok(Json(state.engine.savings_account(&user.id, &account_id).await?))
}

pub async fn invite(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(account_id): Path<String>,
    Json(payload): Json<MemberInvite>,
) -> Result<(StatusCode, Json<SavingsMember>), ServerError> {
    let member = state
        .engine
        .add_savings_member(&user.id, &account_id, &payload.email)
        .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn accept_invite(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(notification_id): Path<String>,
) -> Result<Json<SavingsAccount>, ServerError> {
    Ok(Json(
        state.engine.accept_invite(&user.id, &notification_id).await?,
    ))
}

pub async fn reject_invite(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(notification_id): Path<String>,
) -> Result<Json<SavingsAccount>, ServerError> {
    Ok(Json(
        state.engine.reject_invite(&user.id, &notification_id).await?,
    ))
}

pub async fn deposit(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(account_id): Path<String>,
    Json(payload): Json<DepositNew>,
) -> Result<(StatusCode, Json<SavingsTransaction>), ServerError> {
    let transaction = state
        .engine
        .add_deposit(
            &user.id,
            &account_id,
            payload.amount,
            payload.note.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn messages(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(account_id): Path<String>,
) -> Result<Json<Vec<SavingsMessage>>, ServerError> {
    Ok(Json(state.engine.messages(&user.id, &account_id).await?))
}

pub async fn send_message(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(account_id): Path<String>,
    Json(payload): Json<MessageNew>,
) -> Result<(StatusCode, Json<SavingsMessage>), ServerError> {
    let message = state
        .engine
        .send_message(&user.id, &account_id, &payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn rename(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(account_id): Path<String>,
    Json(payload): Json<SavingsRename>,
) -> Result<Json<SavingsAccount>, ServerError> {
    let account = state
        .engine
        .rename_savings_account(&user.id, &account_id, &payload.name)
        .await?;
    Ok(Json(account))
}

pub async fn remove(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(account_id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_savings_account(&user.id, &account_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
