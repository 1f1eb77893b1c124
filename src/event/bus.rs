use log::trace;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use crate::event::{EditorEvent, EventHandler};

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Fans surface events out to every subscribed handler, in subscription order.
///
/// Events emitted while a dispatch is running are queued and delivered after
/// it, so every handler sees events in the order they happened. Subscribing
/// or unsubscribing during a dispatch takes effect once it is over.
pub struct EventBus {
    handlers: RefCell<Vec<(SubscriptionId, Box<dyn EventHandler>)>>,
    queued: RefCell<VecDeque<EditorEvent>>,
    pending: RefCell<Vec<Pending>>,
    next_id: Cell<u64>,
}

enum Pending {
    Subscribe(SubscriptionId, Box<dyn EventHandler>),
    Unsubscribe(SubscriptionId),
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        // subscribers belong to one surface
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").field("handlers", &self.handler_count()).finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
            queued: RefCell::new(VecDeque::new()),
            pending: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    pub fn subscribe(&self, handler: Box<dyn EventHandler>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        match self.handlers.try_borrow_mut() {
            Ok(mut handlers) => handlers.push((id, handler)),
            Err(_) => {
                trace!("dispatch running, subscription {id:?} deferred");
                self.pending.borrow_mut().push(Pending::Subscribe(id, handler));
            }
        }
        id
    }

    /// Returns whether the subscription existed. During a dispatch the
    /// handler keeps receiving events until that dispatch is over.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let Ok(mut handlers) = self.handlers.try_borrow_mut() else {
            let mut pending = self.pending.borrow_mut();
            let before = pending.len();
            pending.retain(|p| !matches!(p, Pending::Subscribe(pending_id, _) if *pending_id == id));
            if pending.len() != before {
                return true;
            }
            pending.push(Pending::Unsubscribe(id));
            return id.0 < self.next_id.get();
        };
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        handlers.len() != before
    }

    pub fn emit(&self, event: EditorEvent) {
        let Ok(mut handlers) = self.handlers.try_borrow_mut() else {
            self.queued.borrow_mut().push_back(event);
            return;
        };
        trace!("emit {event:?} to {} handler(s)", handlers.len());
        let mut next = Some(event);
        while let Some(event) = next {
            for (_, handler) in handlers.iter_mut() {
                handler.handle_event(&event);
            }
            Self::apply_pending(&mut handlers, &mut self.pending.borrow_mut());
            next = self.queued.borrow_mut().pop_front();
        }
    }

    fn apply_pending(handlers: &mut Vec<(SubscriptionId, Box<dyn EventHandler>)>, pending: &mut Vec<Pending>) {
        for change in pending.drain(..) {
            match change {
                Pending::Subscribe(id, handler) => handlers.push((id, handler)),
                Pending::Unsubscribe(id) => handlers.retain(|(handler_id, _)| *handler_id != id),
            }
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.try_borrow().map(|handlers| handlers.len()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventRecorder;

    #[test]
    fn test_unsubscribed_handler_stops_receiving() {
        let bus = EventBus::new();
        let kept = EventRecorder::new();
        let dropped = EventRecorder::new();
        bus.subscribe(Box::new(kept.clone()));
        let id = bus.subscribe(Box::new(dropped.clone()));

        bus.emit(EditorEvent::Modified);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(EditorEvent::Modified);

        assert_eq!(kept.len(), 2);
        assert_eq!(dropped.len(), 1);
        assert_eq!(bus.handler_count(), 1);
    }

    #[test]
    fn test_subscribe_during_dispatch_takes_effect_afterwards() {
        let bus = EventBus::new();
        let late = EventRecorder::new();
        let id = {
            // hold the handler list as a running dispatch does
            let _dispatching = bus.handlers.borrow_mut();
            bus.subscribe(Box::new(late.clone()))
        };
        assert_eq!(bus.handler_count(), 0);

        // the dispatch that finds the deferred subscription does not reach it
        bus.emit(EditorEvent::Modified);
        assert_eq!(bus.handler_count(), 1);
        assert!(late.is_empty());

        bus.emit(EditorEvent::Modified);
        assert_eq!(late.len(), 1);
        assert!(bus.unsubscribe(id));
    }

    #[test]
    fn test_events_queued_during_dispatch_keep_their_order() {
        let bus = EventBus::new();
        let recorder = EventRecorder::new();
        bus.subscribe(Box::new(recorder.clone()));
        {
            let _dispatching = bus.handlers.borrow_mut();
            bus.emit(EditorEvent::ElementsAdded(Vec::new()));
            bus.emit(EditorEvent::ElementsRemoved(Vec::new()));
        }
        bus.emit(EditorEvent::Modified);
        assert_eq!(
            recorder.drain(),
            vec![EditorEvent::Modified, EditorEvent::ElementsAdded(Vec::new()), EditorEvent::ElementsRemoved(Vec::new())]
        );
    }
}
