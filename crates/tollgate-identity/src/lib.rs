//! Local identity for Tollgate
//!
//! User records live in a flat JSON file behind the [`UserStore`] trait.
//! Bearer sessions are held only in memory by [`SessionStore`] and do not
//! survive a restart.

#![allow(clippy::must_use_candidate)]

mod accounts;
mod error;
mod password;
mod session;
mod store;
mod user;

pub use accounts::Accounts;
pub use error::IdentityError;
pub use password::{hash_password, normalize_email, verify_password};
pub use session::{Authenticated, SessionStore};
pub use store::{FileUserStore, UserStore};
pub use user::{BillingRecord, NewUser, PublicUser, User};
