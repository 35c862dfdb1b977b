//! Connection lifecycle: handles, outbound queues, registry, sessions, and handshake auth.

pub mod authenticator;
pub mod handle;
pub mod outbound;
pub mod registry;
pub mod session;

pub use authenticator::{AuthenticatedConnection, WsAuthenticator};
pub use handle::{ConnectionHandle, ConnectionInfo, ConnectionState};
pub use outbound::{DeliveryError, OutboundReceiver, OutboundSender};
pub use registry::ConnectionRegistry;
pub use session::{ConnectionSession, SessionState};
