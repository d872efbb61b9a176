//! Storefront backend: a persisted per-device cart and a rate-limited
//! product listing API over either a demo catalog or a MongoDB collection.

pub mod cart;
pub mod catalog;
pub mod config;
pub mod db;
pub mod errors;
pub mod gateway;
pub mod middleware;
pub mod models;
pub mod query;
pub mod rate_limit;
