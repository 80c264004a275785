//! API endpoint handlers module
//!
//! Contains all HTTP endpoint handler implementations.

pub mod compare;
pub mod health;
pub mod models;
pub mod ui;
