use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum ChantierStatus {
    Future,
    Active,
    Done,
}

#[derive(Debug, Serialize, FromRow)]
pub struct Chantier {
    pub id: i64,
    pub nom: String,
    pub annee: i32,
    pub pdf_path: Option<String>,
    pub address_work: Option<String>,
    pub address_billing: Option<String>,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    pub remarque: Option<String>,
    pub status: ChantierStatus,
}

/// Detail payload: the chantier plus the ids of its assigned workers.
#[derive(Debug, Serialize)]
pub struct ChantierDetail {
    #[serde(flatten)]
    pub chantier: Chantier,
    pub members: Vec<i64>,
}
