//! Configuration, persona prompts, conversation state, and the chat turn pipeline.

pub mod agent;
pub mod channel;
pub mod config;
pub mod context;
pub mod conversation;
pub mod error;
pub mod resources;
pub mod secret;
pub mod session;

pub use error::{ChatError, ErrorKind};
pub use agent::Agent;
pub use channel::{Channel, ChannelError, ChannelMessage};
pub use config::{Config, Variant};
pub use conversation::{Conversation, Turn, TurnRole};
pub use resources::Resources;
pub use secret::Secret;
pub use session::{ChatSession, TurnState};
