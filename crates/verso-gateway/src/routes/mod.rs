//! HTTP route handlers.

pub mod health;
pub mod keys;
pub mod versions;
