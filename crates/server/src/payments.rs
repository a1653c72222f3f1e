//! Payment submission and admin reconciliation endpoints.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use api_types::payment::{
    PaymentDecision, PaymentList, PaymentMethod, PaymentNew, PaymentStatus, PaymentStatusUpdate,
    PaymentUpdate,
};
use engine::{Payment, PaymentView, User};

use crate::{ServerError, server::ServerState};

fn engine_method(method: PaymentMethod) -> engine::PaymentMethod {
    match method {
        PaymentMethod::BankTransfer => engine::PaymentMethod::BankTransfer,
        PaymentMethod::Qpay => engine::PaymentMethod::Qpay,
    }
}

fn engine_status(status: PaymentStatus) -> engine::PaymentStatus {
    match status {
        PaymentStatus::Pending => engine::PaymentStatus::Pending,
        PaymentStatus::Verified => engine::PaymentStatus::Verified,
        PaymentStatus::Approved => engine::PaymentStatus::Approved,
        PaymentStatus::Rejected => engine::PaymentStatus::Rejected,
    }
}

fn engine_decision(decision: PaymentDecision) -> engine::PaymentDecision {
    match decision {
        PaymentDecision::Approved => engine::PaymentDecision::Approved,
        PaymentDecision::Rejected => engine::PaymentDecision::Rejected,
    }
}

pub async fn submit(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<PaymentNew>,
) -> Result<(StatusCode, Json<Payment>), ServerError> {
    let payment = state
        .engine
        .submit_payment(
            &user.id,
            &payload.group_id,
            engine_method(payload.method),
            payload.note.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn mine(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<Payment>>, ServerError> {
    Ok(Json(state.engine.my_payments(&user.id).await?))
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<PaymentList>,
) -> Result<Json<Vec<PaymentView>>, ServerError> {
    let payments = state
        .engine
        .list_payments(&user.id, query.status.map(engine_status))
        .await?;
    Ok(Json(payments))
}

pub async fn update_status(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(payment_id): Path<String>,
    Json(payload): Json<PaymentStatusUpdate>,
) -> Result<Json<Payment>, ServerError> {
    let payment = state
        .engine
        .update_payment_status(&user.id, &payment_id, engine_decision(payload.status))
        .await?;
    Ok(Json(payment))
}

pub async fn update_details(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(payment_id): Path<String>,
    Json(payload): Json<PaymentUpdate>,
) -> Result<Json<Payment>, ServerError> {
    let payment = state
        .engine
        .update_payment_details(
            &user.id,
            &payment_id,
            engine::PaymentUpdate {
                amount: payload.amount,
                note: payload.note,
            },
        )
        .await?;
    Ok(Json(payment))
}

pub async fn remove(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(payment_id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_payment(&user.id, &payment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_enums_map_to_engine_storage_names() {
        for method in [PaymentMethod::BankTransfer, PaymentMethod::Qpay] {
            assert_eq!(method.as_str(), engine_method(method).as_str());
        }
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Verified,
            PaymentStatus::Approved,
            PaymentStatus::Rejected,
        ] {
            assert_eq!(status.as_str(), engine_status(status).as_str());
        }
    }
}
