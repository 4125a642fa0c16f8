//! Feder - blog backend
//!
//! Credential endpoints (signup, signin, Google login), the comment
//! endpoints behind session tokens, and a client for moderating comments
//! from an admin dashboard.

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
