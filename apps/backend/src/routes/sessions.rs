use actix_web::{web, HttpResponse};

use crate::domain::SessionId;
use crate::error::AppError;
use crate::state::app_state::AppState;

/// Read-only view of one room, live or ended (until it is pruned).
async fn get_session(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let raw = path.into_inner();
    let id: SessionId = raw.parse().map_err(|_| {
        AppError::bad_request("INVALID_SESSION_ID", format!("`{raw}` is not a session id"))
    })?;

    let session = app_state
        .arena()
        .registry()
        .get(id)
        .ok_or_else(|| AppError::not_found("SESSION_NOT_FOUND", format!("no session {id}")))?;

    Ok(HttpResponse::Ok().json(session.summary()))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/{session_id}", web::get().to(get_session));
}
