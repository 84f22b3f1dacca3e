//! Token authentication core.
//!
//! - `claims` - `PayloadClaims` carried by every token
//! - `clock` - time source (system or manually driven)
//! - `codec` - `TokenCodec` trait and the HS256 JWT implementation
//! - `bearer` - `Authorization: Bearer` parsing shared by both gates

pub mod bearer;
pub mod claims;
pub mod clock;
pub mod codec;

pub use bearer::{authenticate, extract_bearer_token, AUTHORIZATION_HEADER};
pub use claims::PayloadClaims;
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{issue_pair, IssuedToken, JwtTokenCodec, TokenCodec, TokenError, TokenPair};
