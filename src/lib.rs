pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod flag;
pub mod migration;
pub mod routes;
pub mod seat;
pub mod seed;
pub mod session;
pub mod templates;
