use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum EntryStatus {
    Pending,
    Validated,
}

/// One worker-day of hours and material cost against a chantier.
#[derive(Debug, Serialize, FromRow)]
pub struct Entry {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub chantier_id: i64,
    pub chantier_nom: String,
    pub date: NaiveDate,
    pub heures: f64,
    pub materiel: f64,
    pub status: EntryStatus,
    /// Who keyed the entry in; differs from user_id when an admin
    /// entered it on a worker's behalf.
    pub created_by_id: Option<i64>,
}
