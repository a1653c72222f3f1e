use axum::{Extension, Json, extract::State};

use engine::{Dashboard, Overview, User};

use crate::{ServerError, server::ServerState};

pub async fn dashboard(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Dashboard>, ServerError> {
    Ok(Json(state.engine.dashboard(&user.id).await?))
}

pub async fn admin_overview(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Overview>, ServerError> {
    Ok(Json(state.engine.overview(&user.id).await?))
}
