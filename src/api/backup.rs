use std::path::{Path, PathBuf};
use std::str::FromStr;

use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde_json::json;
use sqlx::sqlite::SqliteConnectOptions;
use tracing::{error, info};

use crate::auth::auth::AuthUser;
use crate::config::Config;

/// Copies the database file into `backup_dir` under a timestamped name
/// and returns the copy's path.
fn run_backup(source: &Path, backup_dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(backup_dir)?;
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let dest = backup_dir.join(format!("chantier_{stamp}.db"));
    std::fs::copy(source, &dest)?;
    Ok(dest)
}

/// On-demand local backup of the SQLite file, admin only. Off-site
/// copies are handled outside the server.
pub async fn create_backup(
    auth: AuthUser,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let options = SqliteConnectOptions::from_str(&config.database_url).map_err(|e| {
        error!(error = %e, "Invalid DATABASE_URL");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;
    let source = options.get_filename().to_path_buf();

    let dest = web::block(move || run_backup(&source, Path::new("backup")))
        .await
        .map_err(|e| {
            error!(error = %e, "Backup task failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?
        .map_err(|e| {
            error!(error = %e, "Backup failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    info!(path = %dest.display(), "Backup created");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Backup created successfully",
        "path": dest.display().to_string(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_the_database_file() {
        let dir = std::env::temp_dir().join(format!("chantier-backup-{}", uuid::Uuid::new_v4()));
        let source = dir.join("chantier.db");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&source, b"not really a database").unwrap();

        let dest = run_backup(&source, &dir.join("backup")).unwrap();

        let name = dest.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("chantier_") && name.ends_with(".db"));
        assert_eq!(std::fs::read(&dest).unwrap(), b"not really a database");
    }

    #[test]
    fn missing_source_is_an_error() {
        let dir = std::env::temp_dir().join(format!("chantier-backup-{}", uuid::Uuid::new_v4()));
        assert!(run_backup(&dir.join("nope.db"), &dir.join("backup")).is_err());
    }
}
