//! Product catalog service.
//!
//! Serves the product list that clients show in their picker and the full
//! product record that agents look up once a user has chosen one.

pub mod config;
pub mod products;
pub mod web;
