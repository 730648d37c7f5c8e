//! Offline session-token validation.
//!
//! The console never asks the server whether a token is still good. The
//! backend issues a JWT whose payload carries an `exp` claim, and everything
//! the client needs to know about validity is derived from that claim and
//! the wall clock. The signature is not checked here: the client has no key,
//! and the server re-verifies every request anyway.
//!
//! # Example
//!
//! ```ignore
//! use frontdesk::token::{TokenStatus, TokenValidator};
//!
//! let validator = TokenValidator::new(chrono::Duration::minutes(5));
//!
//! match validator.validate(token) {
//!     TokenStatus::Valid => { /* keep the session */ }
//!     TokenStatus::Expired | TokenStatus::Malformed => { /* fail closed */ }
//! }
//! ```

mod claims;
mod validator;

pub use claims::TokenClaims;
pub use validator::{TokenStatus, TokenValidator};
