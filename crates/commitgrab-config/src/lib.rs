//! # commitgrab config
//!
//! TOML configuration for the capture pipeline and the JSON state store that
//! keeps the curated message list and pattern settings between runs.

mod error;
mod loader;
mod schema;
mod store;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use store::{PopupState, StateStore};
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
