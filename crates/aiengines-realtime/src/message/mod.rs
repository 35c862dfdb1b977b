//! Wire protocol: envelopes, frame types, builders, validation, and routing.

pub mod builder;
pub mod envelope;
pub mod router;
pub mod types;
pub mod validator;

pub use envelope::Envelope;
pub use router::MessageRouter;
pub use types::InboundFrame;
