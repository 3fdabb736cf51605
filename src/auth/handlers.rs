use crate::{
    auth::{jwt::generate_access_token, pin::{valid_pin_format, verify_pin}},
    config::Config,
    model::role::Role,
    models::{LoginReqDto, UserCred},
};
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{debug, error, info, instrument};

/// PIN login. The site crew logs in with a personal 6-digit PIN, no
/// username field. PINs are stored hashed, so the lookup scans and
/// verifies; the user table is a handful of rows for one company.
#[instrument(name = "auth_login", skip_all)]
pub async fn login(
    body: web::Json<LoginReqDto>,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    let pin = body.pin.trim();
    if !valid_pin_format(pin) {
        info!("Validation failed: malformed PIN");
        return HttpResponse::BadRequest().json(json!({
            "error": "PIN must be exactly 6 digits"
        }));
    }

    debug!("Fetching credential rows");

    let users = match sqlx::query_as::<_, UserCred>(
        r#"
        SELECT id, username, pin_hash, role_id
        FROM users
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    {
        Ok(rows) => rows,
        Err(e) => {
            error!(error = %e, "Database error while fetching users");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let matched = users.iter().find(|u| verify_pin(pin, &u.pin_hash).is_ok());

    let db_user = match matched {
        Some(user) => user,
        None => {
            info!("Invalid credentials: no user with that PIN");
            return HttpResponse::Unauthorized().json(json!({
                "error": "Invalid PIN"
            }));
        }
    };

    let role = match Role::from_id(db_user.role_id) {
        Some(r) => r,
        None => {
            error!(user_id = db_user.id, role_id = db_user.role_id, "Corrupt role id");
            return HttpResponse::InternalServerError().finish();
        }
    };

    debug!(user_id = db_user.id, "Generating access token");

    let access_token = generate_access_token(
        db_user.id,
        db_user.username.clone(),
        db_user.role_id,
        &config.jwt_secret,
        config.access_token_ttl,
    );

    info!(user_id = db_user.id, "Login successful");

    HttpResponse::Ok().json(json!({
        "access_token": access_token,
        "user": {
            "id": db_user.id,
            "username": db_user.username,
            "role": role.as_str(),
        }
    }))
}
