use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use crate::auth::pin::hash_pin;
use crate::model::role::Role;

pub async fn init_db(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .context("invalid DATABASE_URL")?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .context("failed to open database")?;

    create_schema(&pool).await?;
    seed_default_admin(&pool).await?;

    Ok(pool)
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        pin_hash TEXT NOT NULL,
        role_id INTEGER NOT NULL,
        vacation_balance REAL NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS chantiers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nom TEXT NOT NULL,
        annee INTEGER NOT NULL,
        pdf_path TEXT,
        address_work TEXT,
        address_billing TEXT,
        date_start TEXT,
        date_end TEXT,
        remarque TEXT,
        status TEXT NOT NULL DEFAULT 'FUTURE'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS chantier_members (
        user_id INTEGER NOT NULL REFERENCES users(id),
        chantier_id INTEGER NOT NULL REFERENCES chantiers(id),
        PRIMARY KEY (user_id, chantier_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS entries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        chantier_id INTEGER NOT NULL REFERENCES chantiers(id),
        date TEXT NOT NULL,
        heures REAL NOT NULL DEFAULT 0,
        materiel REAL NOT NULL DEFAULT 0,
        status TEXT NOT NULL DEFAULT 'PENDING',
        created_by_id INTEGER REFERENCES users(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS leaves (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        employee_id INTEGER NOT NULL REFERENCES users(id),
        leave_type TEXT NOT NULL,
        start_date TEXT NOT NULL,
        end_date TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'PENDING',
        days_count REAL NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS alerts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        chantier_id INTEGER NOT NULL REFERENCES chantiers(id),
        title TEXT NOT NULL,
        description TEXT,
        due_date TEXT,
        is_resolved INTEGER NOT NULL DEFAULT 0
    )
    "#,
];

async fn create_schema(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("schema creation failed")?;
    }
    Ok(())
}

/// First run on an empty database: create the Admin account so someone
/// can log in and create everyone else. PIN 000000, to be changed.
async fn seed_default_admin(pool: &SqlitePool) -> Result<()> {
    let user_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    if user_count > 0 {
        return Ok(());
    }

    let pin_hash = hash_pin("000000").map_err(|e| anyhow::anyhow!("PIN hashing failed: {e}"))?;

    sqlx::query(
        r#"
        INSERT INTO users (username, pin_hash, role_id)
        VALUES ('Admin', ?, ?)
        "#,
    )
    .bind(pin_hash)
    .bind(Role::Admin.as_id())
    .execute(pool)
    .await?;

    info!("Default Admin user created with PIN 000000");

    Ok(())
}
