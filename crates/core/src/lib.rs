//! Core library for taskbin
//!
//! This crate contains the core business logic, including:
//! - Task management scoped to the owning user
//! - The trash bin: soft delete, restore and purge
//! - A transactional store over pluggable persistence

pub mod clock;
pub mod error;
pub mod store;
pub mod task;
pub mod trash;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
