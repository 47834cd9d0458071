//! Backend for the "Business on Autopilot" five-day course site: course content,
//! the contact form, and the admin submissions list with spreadsheet export.

pub mod admin;
pub mod client;
pub mod config;
pub mod course;
pub mod db;
pub mod error;
pub mod export;
pub mod form;
pub mod models;
pub mod notice;
pub mod progress;
pub mod query;
pub mod routes;
pub mod store;
pub mod validation;
