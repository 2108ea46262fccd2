//! Credential-holding relay between the client and the object platform.
mod error;
mod relay;
mod server;

pub use error::ProxyError;
pub use relay::{object_id_from_segment, router, ProxyState, RELAY_PREFIX};
pub use server::{serve, serve_on, shutdown_signal};
