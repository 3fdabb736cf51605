use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::error;

use crate::auth::auth::AuthUser;
use crate::planning::{LeaveStore, SqliteLeaveStore, calendar};

/// Month view of everyone's leave. Always rebuilt from a full fetch;
/// any open view re-requests after a mutation.
pub async fn calendar_month(
    _auth: AuthUser,
    store: web::Data<SqliteLeaveStore>,
    path: web::Path<(i32, u32)>,
) -> actix_web::Result<impl Responder> {
    let (year, month) = path.into_inner();

    if !(1..=12).contains(&month) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "month must be between 1 and 12"
        })));
    }

    let leaves = match store.get_ref().list(None).await {
        Ok(l) => l,
        Err(e) => {
            error!(error = %e, year, month, "Failed to fetch leaves for calendar");
            return Ok(HttpResponse::InternalServerError().finish());
        }
    };

    Ok(HttpResponse::Ok().json(calendar::build_month(year, month, &leaves)))
}
