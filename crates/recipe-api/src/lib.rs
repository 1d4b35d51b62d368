//! Typed endpoints for the recipe backend
//!
//! Thin async helpers over [`AuthenticatedClient`]. Each one builds a request,
//! lets the client handle credentials and the refresh-once retry, and decodes
//! the success body into a model.

pub mod chat;
pub mod models;
pub mod notifications;
pub mod orders;
pub mod profile;
pub mod recipes;
pub mod search;

pub use auth_client::{AuthenticatedClient, Error, ErrorKind, Result};
pub use models::*;
