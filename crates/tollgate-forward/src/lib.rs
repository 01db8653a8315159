#![allow(clippy::missing_errors_doc, clippy::must_use_candidate)]

mod error;
mod gateway;
mod token;

pub use error::ForwardError;
pub use gateway::{ForwardResponse, ProxyGateway};
pub use token::{ForwardToken, ForwardTokenIssuer};
