pub mod errors;
pub mod events;
pub mod id;

pub use errors::{ChorusError, ConfigError};
pub use events::{Event, EventBus};
pub use id::{new_id, RunId, SessionId, WindowId};
