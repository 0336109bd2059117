//! Lock-free hand-off of position events to another thread.
//!
//! The session side is a `PositionListener`; the consumer side is polled
//! by whatever forwards positions out of process (OSC, logging).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use sp_engine::PositionListener;
use sp_ir::{SourceId, SourcePosition};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionEvent {
    pub source: SourceId,
    pub position: SourcePosition,
}

/// Producer half. Pushing never blocks; a full buffer drops the event
/// and counts it.
pub struct EventSender {
    producer: HeapProd<PositionEvent>,
    dropped: Arc<AtomicU64>,
}

/// Consumer half.
pub struct EventReceiver {
    consumer: HeapCons<PositionEvent>,
    dropped: Arc<AtomicU64>,
}

/// Create a channel holding up to `capacity` undelivered events.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    let rb = HeapRb::<PositionEvent>::new(capacity.max(1));
    let (producer, consumer) = rb.split();
    let dropped = Arc::new(AtomicU64::new(0));
    (
        EventSender { producer, dropped: dropped.clone() },
        EventReceiver { consumer, dropped },
    )
}

impl PositionListener for EventSender {
    fn on_position_changed(&mut self, source: SourceId, position: SourcePosition) {
        if self.producer.try_push(PositionEvent { source, position }).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl EventReceiver {
    pub fn try_recv(&mut self) -> Option<PositionEvent> {
        self.consumer.try_pop()
    }

    /// Take everything currently queued.
    pub fn drain(&mut self) -> impl Iterator<Item = PositionEvent> + '_ {
        std::iter::from_fn(move || self.consumer.try_pop())
    }

    pub fn len(&self) -> usize {
        self.consumer.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }

    /// Events lost to a full buffer since the channel was created.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_in_order() {
        let (mut tx, mut rx) = event_channel(8);
        for id in 1..=3 {
            tx.on_position_changed(id, SourcePosition::default());
        }
        assert_eq!(rx.len(), 3);
        let ids: Vec<SourceId> = rx.drain().map(|e| e.source).collect();
        assert_eq!(ids, [1, 2, 3]);
        assert!(rx.is_empty());
        assert_eq!(rx.try_recv(), None);
    }

    #[test]
    fn overflow_is_counted_not_blocking() {
        let (mut tx, mut rx) = event_channel(2);
        for id in 0..5 {
            tx.on_position_changed(id, SourcePosition::default());
        }
        assert_eq!(rx.dropped(), 3);
        assert_eq!(rx.try_recv().map(|e| e.source), Some(0));
    }

    #[test]
    fn works_across_threads() {
        let (mut tx, mut rx) = event_channel(64);
        let handle = std::thread::spawn(move || {
            for id in 0..10 {
                tx.on_position_changed(id, SourcePosition::default());
            }
        });
        let _ = handle.join();
        assert_eq!(rx.drain().count(), 10);
    }
}
