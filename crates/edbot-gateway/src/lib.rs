//! HTTP chat surface for EdBot: session API, health, and a minimal web page.

mod error;
mod handlers;
mod router;
mod server;
mod sessions;

pub use error::GatewayError;
pub use server::GatewayServer;
