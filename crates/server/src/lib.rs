use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{router, run_with_listener};

mod groups;
mod notifications;
mod overview;
mod payments;
mod progress;
mod savings;
mod server;
mod users;

pub mod types {
    pub mod user {
        pub use api_types::user::{ProfileUpdate, Role, RoleUpdate, SignUp, UserUpdate};
        pub use engine::User;
    }

    pub mod group {
        pub use api_types::group::{GroupNew, GroupUpdate};
        pub use engine::{Group, GroupMember, GroupSummary};
    }

    pub mod payment {
        pub use api_types::payment::{
            PaymentDecision, PaymentList, PaymentMethod, PaymentNew, PaymentStatus,
            PaymentStatusUpdate, PaymentUpdate,
        };
        pub use engine::{Payment, PaymentView};
    }

    pub mod progress {
        pub use api_types::progress::{MarkPaid, ProgressQuery};
        pub use engine::Progress;
    }

    pub mod savings {
        pub use api_types::savings::{
            DepositNew, MemberInvite, MessageNew, SavingsAccountNew, SavingsRename,
        };
        pub use engine::{
            SavingsAccount, SavingsDetail, SavingsMember, SavingsMessage, SavingsSummary,
            SavingsTransaction,
        };
    }

    pub mod notification {
        pub use api_types::notification::NotificationQuery;
        pub use engine::Notification;
    }

    pub mod overview {
        pub use engine::{Dashboard, DashboardGroup, Overview};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        EngineError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::AlreadyExists(_)
        | EngineError::CapacityExceeded(_)
        | EngineError::LimitExceeded(_)
        | EngineError::InvalidTransition(_) => StatusCode::CONFLICT,
        EngineError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Internal(_) | EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Internal(msg) => {
            tracing::error!("internal error: {msg}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_unauthorized_maps_to_401() {
        let res = ServerError::from(EngineError::Unauthorized("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn engine_permission_denied_maps_to_403() {
        let res =
            ServerError::from(EngineError::PermissionDenied("admin".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::NotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_rule_conflicts_map_to_409() {
        for err in [
            EngineError::AlreadyExists("x".to_string()),
            EngineError::CapacityExceeded("Group is full".to_string()),
            EngineError::LimitExceeded("x".to_string()),
            EngineError::InvalidTransition("x".to_string()),
        ] {
            assert_eq!(ServerError::from(err).into_response().status(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn engine_validation_maps_to_422() {
        let res = ServerError::from(EngineError::ValidationFailed("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn database_errors_hide_the_cause() {
        let err = EngineError::Database(sea_orm::DbErr::Custom("disk on fire".to_string()));
        assert_eq!(status_for_engine_error(&err), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message_for_engine_error(err), "internal server error");
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
