use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::error;

use crate::auth::auth::AuthUser;
use crate::model::alert::Alert;

const SELECT_ALERT: &str = r#"
SELECT a.id, a.chantier_id, c.nom AS chantier_nom,
       a.title, a.description, a.due_date, a.is_resolved
FROM alerts a
JOIN chantiers c ON c.id = a.chantier_id
"#;

#[derive(Deserialize)]
pub struct CreateAlert {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct UpdateAlert {
    pub is_resolved: Option<bool>,
}

pub async fn list_alerts(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let chantier_id = path.into_inner();

    let sql = format!("{SELECT_ALERT} WHERE a.chantier_id = ? ORDER BY a.due_date, a.id");
    let alerts = sqlx::query_as::<_, Alert>(&sql)
        .bind(chantier_id)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, chantier_id, "Failed to fetch alerts");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(alerts))
}

pub async fn create_alert(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    payload: web::Json<CreateAlert>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let chantier_id = path.into_inner();

    let chantier_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM chantiers WHERE id = ?)")
            .bind(chantier_id)
            .fetch_one(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to check chantier");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;

    if !chantier_exists {
        return Ok(HttpResponse::NotFound().json(json!({"error": "Chantier not found"})));
    }

    if payload.title.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({"error": "title must not be empty"})));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO alerts (chantier_id, title, description, due_date, is_resolved)
        VALUES (?, ?, ?, ?, 0)
        "#,
    )
    .bind(chantier_id)
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(payload.due_date)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, chantier_id, "Failed to create alert");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let sql = format!("{SELECT_ALERT} WHERE a.id = ?");
    let alert = sqlx::query_as::<_, Alert>(&sql)
        .bind(result.last_insert_rowid())
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to refetch alert");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Created().json(alert))
}

pub async fn update_alert(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    payload: web::Json<UpdateAlert>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let alert_id = path.into_inner();

    if let Some(is_resolved) = payload.is_resolved {
        let result = sqlx::query("UPDATE alerts SET is_resolved = ? WHERE id = ?")
            .bind(is_resolved)
            .bind(alert_id)
            .execute(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, alert_id, "Failed to update alert");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;

        if result.rows_affected() == 0 {
            return Ok(HttpResponse::NotFound().json(json!({"error": "Alert not found"})));
        }
    }

    let sql = format!("{SELECT_ALERT} WHERE a.id = ?");
    let alert = sqlx::query_as::<_, Alert>(&sql)
        .bind(alert_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, alert_id, "Failed to refetch alert");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    match alert {
        Some(a) => Ok(HttpResponse::Ok().json(a)),
        None => Ok(HttpResponse::NotFound().json(json!({"error": "Alert not found"}))),
    }
}

pub async fn delete_alert(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let alert_id = path.into_inner();

    let result = sqlx::query("DELETE FROM alerts WHERE id = ?")
        .bind(alert_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, alert_id, "Failed to delete alert");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({"error": "Alert not found"})));
    }

    Ok(HttpResponse::Ok().json(json!({"message": "Alert deleted"})))
}
