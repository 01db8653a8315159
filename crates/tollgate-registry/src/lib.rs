#![allow(clippy::missing_errors_doc, clippy::must_use_candidate)]

pub mod candidate;
pub mod client;
pub mod error;
pub mod plans;
pub mod types;

pub use candidate::{Candidate, CandidateResolver, rank};
pub use client::RegistryClient;
pub use error::RegistryError;
pub use plans::PlanTable;
pub use types::{
    CheckoutMode, CheckoutSession, CheckoutSessionRequest, ConnectionPage, ConnectionRecord, ConnectionSubscription,
    CreditBalances, CreditBundleRecord, SubscriptionConfig, SubscriptionDetail,
};
