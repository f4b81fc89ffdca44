use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::stop::StopFlag;

/// Identity comparison used by consumers to tell "a new item arrived" from
/// "the item I already handled is still sitting in the slot".
///
/// Two frames with identical pixel data are still distinct items, so the
/// comparison is by reference, not by value.
pub trait Identity {
    fn same_identity(&self, other: &Self) -> bool;
}

impl<T: ?Sized> Identity for Arc<T> {
    fn same_identity(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

/// Single-item, latest-wins handoff between one producer thread and one
/// consumer thread.
///
/// The slot holds at most one pending item. [`produce`](Self::produce)
/// always overwrites whatever is pending, so a slow consumer only ever sees
/// the newest item and a fast producer never blocks. Consumers park on a
/// condition variable and are released either by a fresh item or by the
/// shared stop flag.
///
/// The contract is exactly one producer and exactly one consumer per slot
/// instance; the slot does not defend against more.
pub struct PipelineSlot<T> {
    pending: Mutex<Option<T>>,
    available: Condvar,
    stop: StopFlag,
}

impl<T> PipelineSlot<T> {
    pub fn new(stop: StopFlag) -> Self {
        Self {
            pending: Mutex::new(None),
            available: Condvar::new(),
            stop,
        }
    }

    /// Publish `item`, replacing any unconsumed predecessor, and wake the
    /// consumer. Never blocks.
    ///
    /// The replaced item is dropped under the slot lock; if the consumer
    /// still holds its own reference, only the slot's share is released.
    pub fn produce(&self, item: T) {
        let mut pending = self.pending.lock();
        *pending = Some(item);
        self.available.notify_one();
    }

    /// Wake a consumer without publishing anything.
    ///
    /// Shutdown nudge: after the stop flag is set, a consumer may still be
    /// parked waiting for an item that will never come. Stage teardown calls
    /// this once so the wait predicate gets re-evaluated and the consumer
    /// observes the stop. Taking the lock first means the notify cannot slip
    /// between the consumer's predicate check and its park.
    pub fn wake(&self) {
        let _pending = self.pending.lock();
        self.available.notify_one();
    }

    /// Remove and return the pending item, if any.
    pub fn take(&self) -> Option<T> {
        self.pending.lock().take()
    }
}

impl<T: Identity + Clone> PipelineSlot<T> {
    /// Block until the slot holds an item that is not `last`, then return a
    /// clone of it. Returns `None` as soon as the stop flag is observed.
    ///
    /// The predicate is re-evaluated under the lock after every wakeup, so
    /// spurious wakeups and produce/wait races are harmless. The clone also
    /// happens under the lock: for reference-counted items that refcount
    /// bump is what keeps the item alive even if the producer overwrites
    /// the slot the instant the lock is released. Any slow processing of
    /// the returned item belongs in the caller, outside the lock, so the
    /// producer is never stalled by a slow consumer.
    pub fn wait_for_next(&self, last: Option<&T>) -> Option<T> {
        let mut pending = self.pending.lock();
        loop {
            if self.stop.is_set() {
                return None;
            }
            if let Some(current) = pending.as_ref() {
                let already_seen = matches!(last, Some(prev) if prev.same_identity(current));
                if !already_seen {
                    return Some(current.clone());
                }
            }
            self.available.wait(&mut pending);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use super::*;

    fn slot_pair() -> (Arc<PipelineSlot<Arc<u32>>>, StopFlag) {
        let stop = StopFlag::new();
        (Arc::new(PipelineSlot::new(stop.clone())), stop)
    }

    #[test]
    fn latest_wins_over_unconsumed_items() {
        let (slot, _stop) = slot_pair();
        for tag in 1..=50u32 {
            slot.produce(Arc::new(tag));
        }
        let seen = slot.wait_for_next(None).expect("item pending");
        assert_eq!(*seen, 50);
    }

    #[test]
    fn consumer_does_not_see_the_same_item_twice() {
        let (slot, stop) = slot_pair();
        let first = Arc::new(7u32);
        slot.produce(first.clone());

        let seen = slot.wait_for_next(None).expect("item pending");
        assert!(seen.same_identity(&first));

        // The slot still holds `first`; a consumer that already handled it
        // must keep blocking until the stop flag releases it.
        let waiter = {
            let slot = slot.clone();
            thread::spawn(move || slot.wait_for_next(Some(&seen)))
        };
        thread::sleep(Duration::from_millis(50));
        stop.trip();
        slot.wake();
        assert!(waiter.join().expect("waiter exits").is_none());
    }

    #[test]
    fn identical_payload_in_a_new_allocation_counts_as_new() {
        let (slot, _stop) = slot_pair();
        let first = Arc::new(7u32);
        slot.produce(first.clone());
        slot.produce(Arc::new(7u32));
        let seen = slot.wait_for_next(Some(&first)).expect("item pending");
        assert_eq!(*seen, 7);
        assert!(!seen.same_identity(&first));
    }

    #[test]
    fn produce_after_wait_begins_is_observed() {
        let (slot, _stop) = slot_pair();
        let waiter = {
            let slot = slot.clone();
            thread::spawn(move || slot.wait_for_next(None))
        };
        // Give the consumer time to park before the only produce happens.
        thread::sleep(Duration::from_millis(50));
        slot.produce(Arc::new(99u32));
        let seen = waiter.join().expect("waiter exits").expect("item");
        assert_eq!(*seen, 99);
    }

    #[test]
    fn item_survives_producer_dropping_its_reference() {
        let slot: PipelineSlot<Arc<Vec<u8>>> = PipelineSlot::new(StopFlag::new());
        {
            let local = Arc::new(vec![1u8, 2, 3, 4]);
            slot.produce(local);
            // producer-side reference gone here
        }
        let seen: Arc<Vec<u8>> = slot.wait_for_next(None).expect("item pending");
        assert_eq!(*seen, vec![1, 2, 3, 4]);
        assert_eq!(Arc::strong_count(&seen), 2); // consumer + slot
    }

    #[test]
    fn stop_releases_a_parked_consumer() {
        let (slot, stop) = slot_pair();
        let waiter = {
            let slot = slot.clone();
            thread::spawn(move || slot.wait_for_next(None))
        };
        thread::sleep(Duration::from_millis(50));
        stop.trip();
        slot.wake();
        assert!(waiter.join().expect("waiter exits").is_none());
    }

    #[test]
    fn take_drains_the_pending_item() {
        let (slot, _stop) = slot_pair();
        assert!(slot.take().is_none());
        slot.produce(Arc::new(3u32));
        assert_eq!(*slot.take().expect("pending"), 3);
        assert!(slot.take().is_none());
    }

    #[test]
    fn interleaved_produce_consume_makes_forward_progress() {
        let (slot, stop) = slot_pair();

        let producer = {
            let slot = slot.clone();
            let stop = stop.clone();
            thread::spawn(move || {
                let mut tag = 0u32;
                while !stop.is_set() {
                    tag += 1;
                    slot.produce(Arc::new(tag));
                }
                slot.wake();
                tag
            })
        };

        let consumer = {
            let slot = slot.clone();
            thread::spawn(move || {
                let mut last: Option<Arc<u32>> = None;
                let mut observed = Vec::new();
                while let Some(item) = slot.wait_for_next(last.as_ref()) {
                    observed.push(*item);
                    last = Some(item);
                }
                observed
            })
        };

        thread::sleep(Duration::from_millis(200));
        stop.trip();

        let produced = producer.join().expect("producer exits");
        let observed = consumer.join().expect("consumer exits");

        assert!(!observed.is_empty(), "consumer made no progress");
        assert!(observed.windows(2).all(|w| w[0] < w[1]));
        assert!(*observed.last().unwrap() <= produced);
    }
}
