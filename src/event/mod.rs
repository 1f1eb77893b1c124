mod bus;
mod events;
mod handlers;

pub use bus::{EventBus, SubscriptionId};
pub use events::EditorEvent;
pub use handlers::{EventRecorder, LoggingHandler};

/// Receives every event a surface emits, on the thread that made the change.
pub trait EventHandler: Send {
    fn handle_event(&mut self, event: &EditorEvent);
}
