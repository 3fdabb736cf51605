pub mod alert;
pub mod chantier;
pub mod entry;
pub mod leave;
pub mod role;
pub mod user;
