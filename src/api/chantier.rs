use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::error;

use crate::auth::auth::AuthUser;
use crate::model::chantier::{Chantier, ChantierDetail, ChantierStatus};
use crate::model::entry::Entry;

const SELECT_CHANTIER: &str = r#"
SELECT id, nom, annee, pdf_path, address_work, address_billing,
       date_start, date_end, remarque, status
FROM chantiers
"#;

#[derive(Deserialize)]
pub struct ChantierFilter {
    /// FUTURE | ACTIVE | DONE; absent or ALL means no filter.
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateChantier {
    pub nom: String,
    pub annee: i32,
    pub pdf_path: Option<String>,
    pub address_work: Option<String>,
    pub address_billing: Option<String>,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    pub remarque: Option<String>,
    pub status: Option<ChantierStatus>,
    pub members: Option<Vec<i64>>,
}

#[derive(Deserialize)]
pub struct UpdateChantier {
    pub nom: Option<String>,
    pub annee: Option<i32>,
    pub pdf_path: Option<String>,
    pub address_work: Option<String>,
    pub address_billing: Option<String>,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    pub remarque: Option<String>,
    pub status: Option<ChantierStatus>,
}

#[derive(Deserialize)]
pub struct MemberReq {
    pub user_id: i64,
}

fn parse_status_filter(raw: Option<&str>) -> Result<Option<ChantierStatus>, HttpResponse> {
    match raw {
        None | Some("ALL") => Ok(None),
        Some("FUTURE") => Ok(Some(ChantierStatus::Future)),
        Some("ACTIVE") => Ok(Some(ChantierStatus::Active)),
        Some("DONE") => Ok(Some(ChantierStatus::Done)),
        Some(_) => Err(HttpResponse::BadRequest()
            .json(json!({"error": "status must be FUTURE, ACTIVE, DONE or ALL"}))),
    }
}

async fn member_ids(pool: &SqlitePool, chantier_id: i64) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT user_id FROM chantier_members WHERE chantier_id = ? ORDER BY user_id")
        .bind(chantier_id)
        .fetch_all(pool)
        .await
}

/* =========================
List chantiers
========================= */
pub async fn list_chantiers(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<ChantierFilter>,
) -> actix_web::Result<impl Responder> {
    let status = match parse_status_filter(query.status.as_deref()) {
        Ok(s) => s,
        Err(resp) => return Ok(resp),
    };

    // Workers only see chantiers they are assigned to.
    let mut sql = String::from(SELECT_CHANTIER);
    if !auth.is_admin() {
        sql.push_str(
            " WHERE id IN (SELECT chantier_id FROM chantier_members WHERE user_id = ?)",
        );
    } else {
        sql.push_str(" WHERE 1=1");
    }
    if status.is_some() {
        sql.push_str(" AND status = ?");
    }
    sql.push_str(" ORDER BY annee DESC, nom");

    let mut q = sqlx::query_as::<_, Chantier>(&sql);
    if !auth.is_admin() {
        q = q.bind(auth.user_id);
    }
    if let Some(status) = status {
        q = q.bind(status);
    }

    let chantiers = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch chantiers");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(chantiers))
}

/* =========================
Create chantier (admin)
========================= */
pub async fn create_chantier(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateChantier>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if payload.nom.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({"error": "nom must not be empty"})));
    }

    let status = payload.status.unwrap_or(ChantierStatus::Future);

    let result = sqlx::query(
        r#"
        INSERT INTO chantiers
            (nom, annee, pdf_path, address_work, address_billing,
             date_start, date_end, remarque, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.nom.trim())
    .bind(payload.annee)
    .bind(&payload.pdf_path)
    .bind(&payload.address_work)
    .bind(&payload.address_billing)
    .bind(payload.date_start)
    .bind(payload.date_end)
    .bind(&payload.remarque)
    .bind(status)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create chantier");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let chantier_id = result.last_insert_rowid();

    if let Some(members) = &payload.members {
        for user_id in members {
            if let Err(e) = sqlx::query(
                "INSERT OR IGNORE INTO chantier_members (user_id, chantier_id) VALUES (?, ?)",
            )
            .bind(user_id)
            .bind(chantier_id)
            .execute(pool.get_ref())
            .await
            {
                error!(error = %e, chantier_id, user_id, "Failed to assign member");
            }
        }
    }

    get_detail(pool.get_ref(), chantier_id).await
}

/* =========================
Chantier detail
========================= */
pub async fn get_chantier(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    get_detail(pool.get_ref(), path.into_inner()).await
}

async fn get_detail(pool: &SqlitePool, chantier_id: i64) -> actix_web::Result<HttpResponse> {
    let sql = format!("{SELECT_CHANTIER} WHERE id = ?");
    let chantier = sqlx::query_as::<_, Chantier>(&sql)
        .bind(chantier_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            error!(error = %e, chantier_id, "Failed to fetch chantier");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let chantier = match chantier {
        Some(c) => c,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({"error": "Chantier not found"})));
        }
    };

    let members = member_ids(pool, chantier_id).await.map_err(|e| {
        error!(error = %e, chantier_id, "Failed to fetch members");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(ChantierDetail { chantier, members }))
}

/* =========================
Update chantier (admin)
========================= */
pub async fn update_chantier(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    payload: web::Json<UpdateChantier>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let chantier_id = path.into_inner();

    let sql = format!("{SELECT_CHANTIER} WHERE id = ?");
    let current = sqlx::query_as::<_, Chantier>(&sql)
        .bind(chantier_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, chantier_id, "Failed to fetch chantier");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let current = match current {
        Some(c) => c,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({"error": "Chantier not found"})));
        }
    };

    // Absent fields keep their current value.
    sqlx::query(
        r#"
        UPDATE chantiers
        SET nom = ?, annee = ?, pdf_path = ?, address_work = ?, address_billing = ?,
            date_start = ?, date_end = ?, remarque = ?, status = ?
        WHERE id = ?
        "#,
    )
    .bind(payload.nom.as_deref().unwrap_or(&current.nom))
    .bind(payload.annee.unwrap_or(current.annee))
    .bind(payload.pdf_path.as_deref().or(current.pdf_path.as_deref()))
    .bind(payload.address_work.as_deref().or(current.address_work.as_deref()))
    .bind(payload.address_billing.as_deref().or(current.address_billing.as_deref()))
    .bind(payload.date_start.or(current.date_start))
    .bind(payload.date_end.or(current.date_end))
    .bind(payload.remarque.as_deref().or(current.remarque.as_deref()))
    .bind(payload.status.unwrap_or(current.status))
    .bind(chantier_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, chantier_id, "Failed to update chantier");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    get_detail(pool.get_ref(), chantier_id).await
}

/* =========================
Membership (admin)
========================= */
pub async fn add_member(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    payload: web::Json<MemberReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let chantier_id = path.into_inner();

    let user_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
        .bind(payload.user_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to check user");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if !user_exists {
        return Ok(HttpResponse::NotFound().json(json!({"error": "User not found"})));
    }

    sqlx::query("INSERT OR IGNORE INTO chantier_members (user_id, chantier_id) VALUES (?, ?)")
        .bind(payload.user_id)
        .bind(chantier_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, chantier_id, "Failed to add member");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    get_detail(pool.get_ref(), chantier_id).await
}

pub async fn remove_member(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    payload: web::Json<MemberReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let chantier_id = path.into_inner();

    sqlx::query("DELETE FROM chantier_members WHERE user_id = ? AND chantier_id = ?")
        .bind(payload.user_id)
        .bind(chantier_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, chantier_id, "Failed to remove member");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    get_detail(pool.get_ref(), chantier_id).await
}

/* =========================
Entries for one chantier
========================= */
pub async fn chantier_entries(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let chantier_id = path.into_inner();

    let mut sql = String::from(
        r#"
        SELECT e.id, e.user_id, u.username AS user_name,
               e.chantier_id, c.nom AS chantier_nom,
               e.date, e.heures, e.materiel, e.status, e.created_by_id
        FROM entries e
        JOIN users u ON u.id = e.user_id
        JOIN chantiers c ON c.id = e.chantier_id
        WHERE e.chantier_id = ?
        "#,
    );
    if !auth.is_admin() {
        sql.push_str(" AND e.user_id = ?");
    }
    sql.push_str(" ORDER BY e.date, e.id");

    let mut q = sqlx::query_as::<_, Entry>(&sql).bind(chantier_id);
    if !auth.is_admin() {
        q = q.bind(auth.user_id);
    }

    let entries = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, chantier_id, "Failed to fetch entries");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(entries))
}
