//! Response DTOs.

pub mod response;
