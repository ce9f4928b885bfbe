use std::collections::BinaryHeap;

use super::event::{Event, SimEvent, SimTime};

/// Discrete-event scheduler for the quantum network simulation.
///
/// Single owner of the global clock (§5): there is no parallelism here,
/// every state transition happens inside a handler invoked from
/// `next_event`, and events emitted by a handler always run strictly after
/// that handler returns (they are pushed back onto the same heap with a
/// fresh, larger sequence number).
pub struct EventScheduler {
    event_queue: BinaryHeap<Event>,
    current_time: SimTime,
    next_sequence: u64,
}

impl EventScheduler {
    pub fn new() -> Self {
        EventScheduler {
            event_queue: BinaryHeap::new(),
            current_time: 0.0,
            next_sequence: 0,
        }
    }

    /// Schedule a new event at an absolute simulated time.
    ///
    /// Panics if `time` precedes the scheduler's current time -- per §5
    /// invariant 2 ("every scheduled event fires at a time >= the time of
    /// the event that scheduled it"), this should never happen in a
    /// correct handler.
    pub fn schedule_at(&mut self, time: SimTime, payload: SimEvent) {
        assert!(
            time >= self.current_time,
            "attempted to schedule an event in the past: {} < {}",
            time,
            self.current_time
        );
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.event_queue.push(Event::new(time, sequence, payload));
    }

    /// Schedule an event `delay` seconds from the current time.
    pub fn schedule_after(&mut self, delay: SimTime, payload: SimEvent) {
        self.schedule_at(self.current_time + delay, payload);
    }

    /// Pop and return the next event, advancing the current time.
    pub fn next_event(&mut self) -> Option<Event> {
        let event = self.event_queue.pop()?;
        self.current_time = event.time;
        Some(event)
    }

    pub fn current_time(&self) -> SimTime {
        self.current_time
    }

    pub fn has_events(&self) -> bool {
        !self.event_queue.is_empty()
    }

    /// Time of the next event without popping it.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.event_queue.peek().map(|e| e.time)
    }

    pub fn pending_events(&self) -> usize {
        self.event_queue.len()
    }
}

impl Default for EventScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::event::SignalType;

    fn sig(node: &str) -> SimEvent {
        SimEvent::SyncSignal {
            node: node.to_string(),
            phase: SignalType::External,
        }
    }

    #[test]
    fn test_event_ordering() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule_at(3.0, sig("c"));
        scheduler.schedule_at(1.0, sig("a"));
        scheduler.schedule_at(2.0, sig("b"));

        assert_eq!(scheduler.next_event().unwrap().time, 1.0);
        assert_eq!(scheduler.next_event().unwrap().time, 2.0);
        assert_eq!(scheduler.next_event().unwrap().time, 3.0);
    }

    #[test]
    fn test_fifo_within_tick() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule_at(1.0, sig("first"));
        scheduler.schedule_at(1.0, sig("second"));
        scheduler.schedule_at(1.0, sig("third"));

        for expected in ["first", "second", "third"] {
            let ev = scheduler.next_event().unwrap();
            match ev.payload {
                SimEvent::SyncSignal { node, .. } => assert_eq!(node, expected),
                _ => unreachable!(),
            }
        }
    }

    #[test]
    fn test_current_time() {
        let mut scheduler = EventScheduler::new();
        assert_eq!(scheduler.current_time(), 0.0);
        scheduler.schedule_at(5.0, sig("a"));
        scheduler.next_event();
        assert_eq!(scheduler.current_time(), 5.0);
    }

    #[test]
    #[should_panic(expected = "attempted to schedule an event in the past")]
    fn test_rejects_past_scheduling() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule_at(5.0, sig("a"));
        scheduler.next_event();
        scheduler.schedule_at(1.0, sig("b"));
    }
}
