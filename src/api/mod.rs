pub mod alert;
pub mod backup;
pub mod chantier;
pub mod entry;
pub mod leave;
pub mod planning;
pub mod user;

use actix_web::HttpResponse;
use serde_json::json;

use crate::planning::PlanningError;

/// One mapping for every handler that calls into the planning core:
/// Validation 400, Forbidden 403, AlreadyDecided 409, NotFound 404,
/// store failures 500.
pub(crate) fn planning_error_response(err: &PlanningError) -> HttpResponse {
    match err {
        PlanningError::Validation(msg) => HttpResponse::BadRequest().json(json!({"error": msg})),
        PlanningError::Forbidden => HttpResponse::Forbidden().json(json!({"error": "Admin only"})),
        PlanningError::AlreadyDecided { .. } => {
            HttpResponse::Conflict().json(json!({"error": err.to_string()}))
        }
        PlanningError::NotFound(_) => {
            HttpResponse::NotFound().json(json!({"error": err.to_string()}))
        }
        PlanningError::Store(e) => {
            tracing::error!(error = %e, "leave store failure");
            HttpResponse::InternalServerError().finish()
        }
    }
}
