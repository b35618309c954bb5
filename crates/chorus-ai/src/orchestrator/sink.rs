//! Window delivery and lifecycle notification.

use chorus_common::{Event, EventBus, WindowId};
use tokio::sync::broadcast;
use tracing::trace;

/// Channel that carries serialized [`StreamEvent`](crate::StreamEvent)s.
pub const STREAM_CHANNEL: &str = "chat:stream";

/// Where push-mode output goes.
pub trait EventSink: Send + Sync {
    /// Deliver to every window.
    fn broadcast(&self, channel: &str, payload: serde_json::Value);
    /// Deliver to one window.
    fn send_to(&self, window: WindowId, channel: &str, payload: serde_json::Value);
    /// Publish an internal lifecycle notification.
    fn emit(&self, event: Event);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    All,
    Window(WindowId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowMessage {
    pub target: Target,
    pub channel: String,
    pub payload: serde_json::Value,
}

/// In-process sink backed by broadcast channels.
///
/// Window messages go out on one channel; each receiver filters by
/// [`Target`]. Lifecycle events go out on the common [`EventBus`].
pub struct ChannelSink {
    windows: broadcast::Sender<WindowMessage>,
    lifecycle: EventBus,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> Self {
        let (windows, _) = broadcast::channel(capacity);
        Self {
            windows,
            lifecycle: EventBus::new(capacity),
        }
    }

    pub fn subscribe_windows(&self) -> broadcast::Receiver<WindowMessage> {
        self.windows.subscribe()
    }

    pub fn subscribe_lifecycle(&self) -> broadcast::Receiver<Event> {
        self.lifecycle.subscribe()
    }

    fn deliver(&self, target: Target, channel: &str, payload: serde_json::Value) {
        let message = WindowMessage {
            target,
            channel: channel.to_string(),
            payload,
        };
        // No subscribers is not an error; nobody is listening yet.
        if self.windows.send(message).is_err() {
            trace!(channel, "window message dropped, no subscribers");
        }
    }
}

impl Default for ChannelSink {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventSink for ChannelSink {
    fn broadcast(&self, channel: &str, payload: serde_json::Value) {
        self.deliver(Target::All, channel, payload);
    }

    fn send_to(&self, window: WindowId, channel: &str, payload: serde_json::Value) {
        self.deliver(Target::Window(window), channel, payload);
    }

    fn emit(&self, event: Event) {
        self.lifecycle.publish(event);
    }
}
