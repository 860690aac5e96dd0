//! HTTP API - request models, handlers and routes

pub mod handlers;
pub mod models;
pub mod routes;
