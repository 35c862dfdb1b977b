//! # aiengines-auth
//!
//! Verification of the identity presented when a client opens a real-time
//! connection. Account management and login flows live upstream; this crate
//! only checks signatures and expiry on the tokens they issue.

pub mod jwt;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
