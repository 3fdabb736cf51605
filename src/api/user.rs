use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::error;

use crate::auth::auth::AuthUser;
use crate::auth::pin::{hash_pin, valid_pin_format, verify_pin};
use crate::model::role::Role;
use crate::model::user::User;

#[derive(Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub pin: String,
    pub role: String,
}

#[derive(Deserialize)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub pin: Option<String>,
    pub role: Option<String>,
}

#[derive(Serialize)]
struct UserResponse {
    id: i64,
    username: String,
    role: &'static str,
    vacation_balance: f64,
}

/// Login identifies a user by PIN alone, so no two accounts may share
/// one. PINs are stored hashed; the check scans and verifies, same as
/// the login lookup. `exclude_id` lets an update keep the user's own PIN.
async fn pin_in_use(
    pool: &SqlitePool,
    pin: &str,
    exclude_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let rows: Vec<(i64, String)> = sqlx::query_as("SELECT id, pin_hash FROM users")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .iter()
        .any(|(id, hash)| exclude_id != Some(*id) && verify_pin(pin, hash).is_ok()))
}

fn to_response(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username,
        role: Role::from_id(user.role_id).map(Role::as_str).unwrap_or("unknown"),
        vacation_balance: user.vacation_balance,
    }
}

pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, role_id, vacation_balance
        FROM users
        ORDER BY username
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch users");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let response: Vec<UserResponse> = users.into_iter().map(to_response).collect();
    Ok(HttpResponse::Ok().json(response))
}

pub async fn create_user(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateUser>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let username = payload.username.trim();
    if username.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({"error": "Username must not be empty"})));
    }

    if !valid_pin_format(&payload.pin) {
        return Ok(HttpResponse::BadRequest().json(json!({"error": "PIN must be exactly 6 digits"})));
    }

    let role = match Role::from_name(&payload.role) {
        Some(r) => r,
        None => {
            return Ok(
                HttpResponse::BadRequest().json(json!({"error": "Role must be admin or worker"}))
            );
        }
    };

    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? LIMIT 1)",
    )
    .bind(username)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to check username");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if taken {
        return Ok(HttpResponse::Conflict().json(json!({"error": "Username already exists"})));
    }

    let pin_taken = pin_in_use(pool.get_ref(), &payload.pin, None).await.map_err(|e| {
        error!(error = %e, "Failed to check PIN");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if pin_taken {
        return Ok(HttpResponse::Conflict().json(json!({"error": "PIN already in use"})));
    }

    let pin_hash = hash_pin(&payload.pin).map_err(|e| {
        error!(error = %e, "PIN hashing failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, pin_hash, role_id)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(username)
    .bind(pin_hash)
    .bind(role.as_id())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create user");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(json!({
        "id": result.last_insert_rowid(),
        "username": username,
        "role": role.as_str(),
    })))
}

pub async fn update_user(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    payload: web::Json<UpdateUser>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();

    let existing = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, role_id, vacation_balance
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, user_id, "Failed to fetch user");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let existing = match existing {
        Some(u) => u,
        None => return Ok(HttpResponse::NotFound().json(json!({"error": "User not found"}))),
    };

    if let Some(username) = payload.username.as_deref() {
        let username = username.trim();
        if username != existing.username {
            let taken: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? AND id != ? LIMIT 1)",
            )
            .bind(username)
            .bind(user_id)
            .fetch_one(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to check username");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;
            if taken {
                return Ok(
                    HttpResponse::Conflict().json(json!({"error": "Username already exists"}))
                );
            }

            sqlx::query("UPDATE users SET username = ? WHERE id = ?")
                .bind(username)
                .bind(user_id)
                .execute(pool.get_ref())
                .await
                .map_err(|e| {
                    error!(error = %e, user_id, "Failed to update username");
                    actix_web::error::ErrorInternalServerError("Internal Server Error")
                })?;
        }
    }

    if let Some(pin) = payload.pin.as_deref() {
        if !valid_pin_format(pin) {
            return Ok(
                HttpResponse::BadRequest().json(json!({"error": "PIN must be exactly 6 digits"}))
            );
        }
        let pin_taken = pin_in_use(pool.get_ref(), pin, Some(user_id))
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to check PIN");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;
        if pin_taken {
            return Ok(HttpResponse::Conflict().json(json!({"error": "PIN already in use"})));
        }
        let pin_hash = hash_pin(pin).map_err(|e| {
            error!(error = %e, "PIN hashing failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;
        sqlx::query("UPDATE users SET pin_hash = ? WHERE id = ?")
            .bind(pin_hash)
            .bind(user_id)
            .execute(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, user_id, "Failed to update PIN");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;
    }

    if let Some(role_name) = payload.role.as_deref() {
        let role = match Role::from_name(role_name) {
            Some(r) => r,
            None => {
                return Ok(HttpResponse::BadRequest()
                    .json(json!({"error": "Role must be admin or worker"})));
            }
        };
        sqlx::query("UPDATE users SET role_id = ? WHERE id = ?")
            .bind(role.as_id())
            .bind(user_id)
            .execute(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, user_id, "Failed to update role");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;
    }

    let updated = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, role_id, vacation_balance
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, user_id, "Failed to refetch user");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(to_response(updated)))
}

/// Removes a user together with the rows that reference them, in one
/// transaction, so the foreign keys on entries, leaves and
/// chantier_members do not block the delete. Entries an admin keyed in
/// for someone else survive with created_by_id cleared. Returns false
/// when the user does not exist.
async fn delete_user_cascade(pool: &SqlitePool, user_id: i64) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM chantier_members WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE entries SET created_by_id = NULL WHERE created_by_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM entries WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM leaves WHERE employee_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        // dropped tx rolls the rest back
        return Ok(false);
    }

    tx.commit().await?;
    Ok(true)
}

pub async fn delete_user(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();

    let deleted = delete_user_cascade(pool.get_ref(), user_id).await.map_err(|e| {
        error!(error = %e, user_id, "Failed to delete user");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if !deleted {
        return Ok(HttpResponse::NotFound().json(json!({"error": "User not found"})));
    }

    Ok(HttpResponse::Ok().json(json!({"message": "User deleted"})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;

    async fn test_pool() -> SqlitePool {
        let path = std::env::temp_dir().join(format!("chantier-users-{}.db", uuid::Uuid::new_v4()));
        init_db(&format!("sqlite://{}?mode=rwc", path.display()))
            .await
            .unwrap()
    }

    async fn insert_worker(pool: &SqlitePool, username: &str, pin: &str) -> i64 {
        let pin_hash = hash_pin(pin).unwrap();
        sqlx::query("INSERT INTO users (username, pin_hash, role_id) VALUES (?, ?, ?)")
            .bind(username)
            .bind(pin_hash)
            .bind(Role::Worker.as_id())
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid()
    }

    #[actix_web::test]
    async fn pin_scan_flags_a_shared_pin() {
        let pool = test_pool().await;
        let marc = insert_worker(&pool, "Marc", "123456").await;
        insert_worker(&pool, "Paul", "654321").await;

        assert!(pin_in_use(&pool, "123456", None).await.unwrap());
        // the seeded Admin account holds 000000
        assert!(pin_in_use(&pool, "000000", None).await.unwrap());
        assert!(!pin_in_use(&pool, "999999", None).await.unwrap());

        // a user keeping their own PIN is not a collision
        assert!(!pin_in_use(&pool, "123456", Some(marc)).await.unwrap());
        // but taking someone else's still is
        assert!(pin_in_use(&pool, "654321", Some(marc)).await.unwrap());
    }

    #[actix_web::test]
    async fn delete_clears_rows_referencing_the_user() {
        let pool = test_pool().await;
        let marc = insert_worker(&pool, "Marc", "123456").await;
        let paul = insert_worker(&pool, "Paul", "654321").await;

        let chantier_id =
            sqlx::query("INSERT INTO chantiers (nom, annee) VALUES ('Maison Dupont', 2024)")
                .execute(&pool)
                .await
                .unwrap()
                .last_insert_rowid();
        sqlx::query("INSERT INTO chantier_members (user_id, chantier_id) VALUES (?, ?)")
            .bind(marc)
            .bind(chantier_id)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            r#"
            INSERT INTO entries (user_id, chantier_id, date, heures, created_by_id)
            VALUES (?, ?, '2024-06-10', 8, ?)
            "#,
        )
        .bind(marc)
        .bind(chantier_id)
        .bind(marc)
        .execute(&pool)
        .await
        .unwrap();
        // an entry Marc keyed in for Paul must survive him
        sqlx::query(
            r#"
            INSERT INTO entries (user_id, chantier_id, date, heures, created_by_id)
            VALUES (?, ?, '2024-06-11', 8, ?)
            "#,
        )
        .bind(paul)
        .bind(chantier_id)
        .bind(marc)
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            r#"
            INSERT INTO leaves (employee_id, leave_type, start_date, end_date)
            VALUES (?, 'VACATION', '2024-07-01', '2024-07-03')
            "#,
        )
        .bind(marc)
        .execute(&pool)
        .await
        .unwrap();

        assert!(delete_user_cascade(&pool, marc).await.unwrap());

        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?")
            .bind(marc)
            .fetch_one(&pool)
            .await
            .unwrap();
        let own_entries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries WHERE user_id = ?")
            .bind(marc)
            .fetch_one(&pool)
            .await
            .unwrap();
        let leaves: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leaves WHERE employee_id = ?")
            .bind(marc)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!((users, own_entries, leaves), (0, 0, 0));

        let paul_created_by: Option<i64> =
            sqlx::query_scalar("SELECT created_by_id FROM entries WHERE user_id = ?")
                .bind(paul)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(paul_created_by, None);

        // already gone
        assert!(!delete_user_cascade(&pool, marc).await.unwrap());
    }
}
