//! Brusio: a small community blogging platform.
//!
//! Users publish text posts (optionally with an image reference and a group
//! tag), browse feeds by community or author, comment, and follow authors
//! for a personalized feed. Storage is Postgres via sqlx; the HTTP surface
//! is axum and exposes structured data for an external rendering layer.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
