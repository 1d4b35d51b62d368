//! Types shared by the recipe client crates

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
