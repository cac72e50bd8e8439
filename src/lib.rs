// HTTP server modules
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod sse;
pub mod store;

// Reply connector abstraction
pub mod connector;
