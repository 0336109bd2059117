//! Synchronous position-change notification.

use alloc::boxed::Box;

use slotmap::{new_key_type, SlotMap};
use sp_ir::{SourceId, SourcePosition};

new_key_type! {
    /// Handle returned by `ListenerList::add`.
    pub struct ListenerId;
}

/// Receives every position change, inside the call that caused it.
pub trait PositionListener {
    fn on_position_changed(&mut self, source: SourceId, position: SourcePosition);
}

impl<F> PositionListener for F
where
    F: FnMut(SourceId, SourcePosition),
{
    fn on_position_changed(&mut self, source: SourceId, position: SourcePosition) {
        self(source, position)
    }
}

/// Registered listeners. Delivery order among them is unspecified.
#[derive(Default)]
pub struct ListenerList {
    listeners: SlotMap<ListenerId, Box<dyn PositionListener>>,
}

impl ListenerList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: Box<dyn PositionListener>) -> ListenerId {
        self.listeners.insert(listener)
    }

    /// Unregister; returns the listener if the handle was live.
    pub fn remove(&mut self, id: ListenerId) -> Option<Box<dyn PositionListener>> {
        self.listeners.remove(id)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl PositionListener for ListenerList {
    fn on_position_changed(&mut self, source: SourceId, position: SourcePosition) {
        for listener in self.listeners.values_mut() {
            listener.on_position_changed(source, position);
        }
    }
}
