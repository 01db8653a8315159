//! Billing-session reconciliation for Tollgate
//!
//! [`BillingSessionManager`] answers "which connection and plan does this
//! user have", preferring the pointer cached on the user record and falling
//! back to a bounded scan of the registry. [`Checkout`] and
//! [`credits`] cover the checkout and credit read paths that share the same
//! registry client.

#![allow(clippy::missing_errors_doc, clippy::must_use_candidate)]

mod checkout;
pub mod credits;
mod error;
mod fallback;
mod session;

#[cfg(test)]
mod test_support;

pub use checkout::{Checkout, CreditBundleCheckout, ResolvedConnection, SubscriptionCheckout};
pub use credits::{CreditBundle, CreditBundles, CycleCreditBreakdown, CycleCredits};
pub use error::BillingError;
pub use fallback::FallbackPolicy;
pub use session::{BillingSession, BillingSessionManager, MAX_SCAN_PAGES, select_connection_id};
