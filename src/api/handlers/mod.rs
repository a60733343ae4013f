//! API handlers for the auth endpoints, health and the landing route.

pub mod auth;
pub mod health;
pub mod root;
