//! # Identity Common Library
//!
//! Shared code for the identity services including:
//! - Contact model and link precedence
//! - Database initialization (pool + contacts schema)
//! - Bootstrap configuration loading
//! - Timestamp helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use db::models::{Contact, LinkPrecedence, NewContact};
pub use error::{Error, Result};
