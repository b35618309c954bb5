//! Conversation sessions: configuration, bounded history, and the registry
//! that owns them.

mod manager;
mod registry;
mod types;

pub use manager::Session;
pub use registry::SessionRegistry;
pub use types::{HistoryMessage, HistoryRole, SessionConfig, SessionOptions, SessionSnapshot};
