//! Common library for the image gallery
//!
//! This crate provides the domain model shared by the API service and the
//! gallery client, together with PostgreSQL connectivity and error types.

pub mod database;
pub mod error;
pub mod models;

pub use error::{DatabaseError, DatabaseResult, RepositoryError, RepositoryResult};
pub use models::{Category, Image, NewImage, NewUser, UpdateUser, User};
