use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};

use std::sync::Arc;

use crate::{ServerError, groups, notifications, overview, payments, progress, savings, users};
use engine::{Engine, EngineError};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Resolves the caller from HTTP Basic credentials (email and password) and
/// stores the [`engine::User`] in the request extensions.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(TypedHeader(credentials)) = auth_header else {
        return Err(EngineError::Unauthorized("missing credentials".to_string()).into());
    };
    if credentials.username().is_empty() || credentials.password().is_empty() {
        return Err(EngineError::Unauthorized("missing credentials".to_string()).into());
    }

    let user = state
        .engine
        .authenticate(credentials.username(), credentials.password())
        .await?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Build the HTTP router. `POST /signup` is the only route without
/// authentication.
pub fn router(engine: Arc<Engine>) -> Router {
    let state = ServerState { engine };
    Router::new()
        .route("/me", get(users::me).patch(users::update_profile))
        .route("/dashboard", get(overview::dashboard))
        .route("/groups", get(groups::list).post(groups::create))
        .route("/groups/{id}", get(groups::get))
        .route("/groups/{id}/join", post(groups::join))
        .route("/groups/{id}/leave", post(groups::leave))
        .route("/groups/{id}/members", get(groups::members))
        .route("/payments", post(payments::submit).get(payments::mine))
        .route("/progress", get(progress::list))
        .route("/progress/mark", post(progress::mark_as_paid))
        .route("/savings", get(savings::list).post(savings::create))
        .route("/savings/{id}", get(savings::detail))
        .route("/savings/{id}/members", post(savings::invite))
        .route("/savings/{id}/deposits", post(savings::deposit))
        .route(
            "/savings/{id}/messages",
            get(savings::messages).post(savings::send_message),
        )
        .route("/notifications", get(notifications::list))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .route("/notifications/{id}/accept", post(savings::accept_invite))
        .route("/notifications/{id}/reject", post(savings::reject_invite))
        .route("/admin/overview", get(overview::admin_overview))
        .route("/admin/users", get(users::list))
        .route(
            "/admin/users/{id}",
            patch(users::update).delete(users::remove),
        )
        .route("/admin/users/{id}/role", post(users::update_role))
        .route(
            "/admin/groups/{id}",
            patch(groups::update).delete(groups::remove),
        )
        .route("/admin/payments", get(payments::list))
        .route(
            "/admin/payments/{id}",
            patch(payments::update_details).delete(payments::remove),
        )
        .route("/admin/payments/{id}/status", post(payments::update_status))
        .route(
            "/admin/savings/{id}",
            patch(savings::rename).delete(savings::remove),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .route("/signup", post(users::sign_up))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(Arc::new(engine))).await
}
