#![allow(clippy::must_use_candidate)]

mod error;
mod secret;

pub use error::HttpError;
pub use secret::{ConnectionSecret, is_valid_connection_secret};
