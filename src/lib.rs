//! HRM service: attendance, leave, payroll, performance and the records
//! around them, behind an actix-web API.

pub mod access;
pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod model;
pub mod routes;
pub mod service;
pub mod store;
