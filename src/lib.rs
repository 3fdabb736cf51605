pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod model;
pub mod models;
pub mod planning;
pub mod routes;
