use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::error;

use crate::auth::auth::AuthUser;
use crate::model::entry::{Entry, EntryStatus};

const SELECT_ENTRY: &str = r#"
SELECT e.id, e.user_id, u.username AS user_name,
       e.chantier_id, c.nom AS chantier_nom,
       e.date, e.heures, e.materiel, e.status, e.created_by_id
FROM entries e
JOIN users u ON u.id = e.user_id
JOIN chantiers c ON c.id = e.chantier_id
"#;

#[derive(Deserialize)]
pub struct CreateEntry {
    /// Admins may enter hours on a worker's behalf; workers may only
    /// file their own.
    pub user_id: Option<i64>,
    pub chantier_id: i64,
    pub date: NaiveDate,
    pub heures: Option<f64>,
    pub materiel: Option<f64>,
}

#[derive(Deserialize)]
pub struct UpdateEntry {
    pub heures: Option<f64>,
    pub materiel: Option<f64>,
    pub status: Option<EntryStatus>,
}

async fn fetch_entry(pool: &SqlitePool, entry_id: i64) -> Result<Option<Entry>, sqlx::Error> {
    let sql = format!("{SELECT_ENTRY} WHERE e.id = ?");
    sqlx::query_as::<_, Entry>(&sql)
        .bind(entry_id)
        .fetch_optional(pool)
        .await
}

/* =========================
Create entry
========================= */
pub async fn create_entry(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateEntry>,
) -> actix_web::Result<impl Responder> {
    let target_user = payload.user_id.unwrap_or(auth.user_id);
    if target_user != auth.user_id && !auth.is_admin() {
        return Ok(HttpResponse::Forbidden()
            .json(json!({"error": "Only admins can enter hours for someone else"})));
    }

    let chantier_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM chantiers WHERE id = ?)")
            .bind(payload.chantier_id)
            .fetch_one(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to check chantier");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;

    if !chantier_exists {
        return Ok(HttpResponse::NotFound().json(json!({"error": "Chantier not found"})));
    }

    // New entries always await validation.
    let result = sqlx::query(
        r#"
        INSERT INTO entries (user_id, chantier_id, date, heures, materiel, status, created_by_id)
        VALUES (?, ?, ?, ?, ?, 'PENDING', ?)
        "#,
    )
    .bind(target_user)
    .bind(payload.chantier_id)
    .bind(payload.date)
    .bind(payload.heures.unwrap_or(0.0))
    .bind(payload.materiel.unwrap_or(0.0))
    .bind(auth.user_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create entry");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let entry = fetch_entry(pool.get_ref(), result.last_insert_rowid())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to refetch entry");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Internal Server Error"))?;

    Ok(HttpResponse::Created().json(entry))
}

/* =========================
Pending entries (admin)
========================= */
pub async fn pending_entries(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let sql = format!("{SELECT_ENTRY} WHERE e.status = 'PENDING' ORDER BY e.date, e.id");
    let entries = sqlx::query_as::<_, Entry>(&sql)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch pending entries");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(entries))
}

/* =========================
Validate entry (admin)
========================= */
pub async fn validate_entry(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let entry_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE entries
        SET status = 'VALIDATED'
        WHERE id = ?
        AND status = 'PENDING'
        "#,
    )
    .bind(entry_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, entry_id, "Validate entry failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest()
            .json(json!({"error": "Entry not found or already validated"})));
    }

    let entry = fetch_entry(pool.get_ref(), entry_id).await.map_err(|e| {
        error!(error = %e, entry_id, "Failed to refetch entry");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?
    .ok_or_else(|| actix_web::error::ErrorInternalServerError("Internal Server Error"))?;

    Ok(HttpResponse::Ok().json(entry))
}

/* =========================
Amend / delete entry (admin)
========================= */
pub async fn update_entry(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    payload: web::Json<UpdateEntry>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let entry_id = path.into_inner();

    let current = fetch_entry(pool.get_ref(), entry_id).await.map_err(|e| {
        error!(error = %e, entry_id, "Failed to fetch entry");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let current = match current {
        Some(e) => e,
        None => return Ok(HttpResponse::NotFound().json(json!({"error": "Entry not found"}))),
    };

    sqlx::query(
        r#"
        UPDATE entries
        SET heures = ?, materiel = ?, status = ?
        WHERE id = ?
        "#,
    )
    .bind(payload.heures.unwrap_or(current.heures))
    .bind(payload.materiel.unwrap_or(current.materiel))
    .bind(payload.status.unwrap_or(current.status))
    .bind(entry_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, entry_id, "Failed to update entry");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let entry = fetch_entry(pool.get_ref(), entry_id).await.map_err(|e| {
        error!(error = %e, entry_id, "Failed to refetch entry");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?
    .ok_or_else(|| actix_web::error::ErrorInternalServerError("Internal Server Error"))?;

    Ok(HttpResponse::Ok().json(entry))
}

pub async fn delete_entry(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let entry_id = path.into_inner();

    let result = sqlx::query("DELETE FROM entries WHERE id = ?")
        .bind(entry_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, entry_id, "Failed to delete entry");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({"error": "Entry not found"})));
    }

    Ok(HttpResponse::Ok().json(json!({"message": "Entry deleted"})))
}
