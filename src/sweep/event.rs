use core::fmt;
use std::collections::BTreeMap;

use crate::utils::{point_order::PositionKey, types::SegmentIdx, vec2::Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventType {
    /// The sweep reaches the left endpoint of a segment
    Start,
    /// The sweep reaches the right endpoint of a segment
    End,
    /// The sweep reaches a point where segments meet
    Intersection,
}

/// An event point of the sweep.
///
/// Start and end events carry the segment they belong to, intersection events only their position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Event {
    pub kind: EventType,
    pub position: Vec2,
    pub segment: Option<SegmentIdx>,
}

impl Event {
    #[must_use]
    pub const fn start(position: Vec2, segment: SegmentIdx) -> Self {
        Self {
            kind: EventType::Start,
            position,
            segment: Some(segment),
        }
    }

    #[must_use]
    pub const fn end(position: Vec2, segment: SegmentIdx) -> Self {
        Self {
            kind: EventType::End,
            position,
            segment: Some(segment),
        }
    }

    #[must_use]
    pub const fn intersection(position: Vec2) -> Self {
        Self {
            kind: EventType::Intersection,
            position,
            segment: None,
        }
    }

    /// Two intersection events are the same if their positions are, other events if kind and segment are.
    fn is_same(&self, other: &Self) -> bool {
        match (self.kind, other.kind) {
            (EventType::Intersection, EventType::Intersection) => self.position == other.position,
            (EventType::Intersection, _) | (_, EventType::Intersection) => false,
            _ => self.kind == other.kind && self.segment == other.segment,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.segment {
            Some(segment) => write!(f, "{:?} {} of segment {}", self.kind, self.position, segment),
            None => write!(f, "{:?} {}", self.kind, self.position),
        }
    }
}

/// Pending events, grouped by position and ordered by x, then y.
///
/// Within one position end events come first, so a segment ending where another starts leaves the sweep before
/// the other enters it.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: BTreeMap<PositionKey, Vec<Event>>,
}

impl EventQueue {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            events: BTreeMap::new(),
        }
    }

    /// Adds an event, unless the same event is pending already.
    pub fn enqueue(&mut self, event: Event) {
        let events = self.events.entry(PositionKey(event.position)).or_default();

        if events.iter().any(|pending| pending.is_same(&event)) {
            return;
        }

        match event.kind {
            EventType::End => events.insert(0, event),
            _ => events.push(event),
        }
    }

    /// Removes and returns all events at the smallest position.
    pub fn dequeue(&mut self) -> Option<Vec<Event>> {
        self.events.pop_first().map(|(_, events)| events)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The number of distinct event positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// All pending events in queue order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> + '_ {
        self.events.values().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_order() {
        let mut queue = EventQueue::new();
        queue.enqueue(Event::start(Vec2::new(1.0, 0.0), 0));
        queue.enqueue(Event::start(Vec2::new(0.0, 5.0), 1));
        queue.enqueue(Event::end(Vec2::new(1.0, 0.0), 2));
        queue.enqueue(Event::intersection(Vec2::new(0.0, -1.0)));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.dequeue(), Some(vec![Event::intersection(Vec2::new(0.0, -1.0))]));
        assert_eq!(queue.dequeue(), Some(vec![Event::start(Vec2::new(0.0, 5.0), 1)]));
        assert_eq!(
            queue.dequeue(),
            Some(vec![
                Event::end(Vec2::new(1.0, 0.0), 2),
                Event::start(Vec2::new(1.0, 0.0), 0)
            ])
        );
        assert!(queue.is_empty());
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn test_duplicates_are_skipped() {
        let mut queue = EventQueue::new();
        queue.enqueue(Event::intersection(Vec2::new(2.0, 2.0)));
        queue.enqueue(Event::intersection(Vec2::new(2.0, 2.0 + 1e-14)));
        queue.enqueue(Event::start(Vec2::new(2.0, 2.0), 4));
        queue.enqueue(Event::start(Vec2::new(2.0, 2.0), 4));

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.iter().count(), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Event::end(Vec2::new(1.0, 2.0), 3).to_string(),
            "End (1; 2) of segment 3"
        );
    }
}
