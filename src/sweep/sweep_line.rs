use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
};

use log::warn;

use super::{
    event::{Event, EventQueue, EventType},
    EdgeIntersection, Intersection,
};
use crate::utils::{
    compare::{almost_equal, greater, less, TOLERANCE},
    point_order::{cmp_positions, PositionKey},
    segment::{closest_point_on_segment, segment_intersections, SegmentHit},
    types::{Segment2, SegmentIdx},
    vec2::Vec2,
};

/// A segment as seen by the sweep.
#[derive(Clone, Copy, Debug)]
struct SweepSegment {
    /// Endpoints in input order, intersection parameters refer to these.
    v0: Vec2,
    v1: Vec2,
    /// Endpoints in sweep order.
    left: Vec2,
    right: Vec2,
    /// `INFINITY` for vertical segments.
    slope: f64,
}

impl SweepSegment {
    fn new([v0, v1]: Segment2) -> Self {
        let (left, right) = match cmp_positions(v0, v1) {
            Ordering::Greater => (v1, v0),
            _ => (v0, v1),
        };

        let slope = if almost_equal(left.x, right.x, TOLERANCE) {
            f64::INFINITY
        } else {
            (right.y - left.y) / (right.x - left.x)
        };

        Self {
            v0,
            v1,
            left,
            right,
            slope,
        }
    }

    fn is_vertical(&self) -> bool {
        self.slope.is_infinite()
    }

    /// The y-coordinate where the sweep line at `x` meets the segment.
    ///
    /// A vertical segment meets the sweep line everywhere, it is taken at the current event height clamped to
    /// its extent.
    fn y_at(&self, x: f64, event_y: f64) -> f64 {
        if self.is_vertical() {
            let low = self.left.y.min(self.right.y);
            let high = self.left.y.max(self.right.y);
            event_y.clamp(low, high)
        } else {
            self.left.y + (x - self.left.x) * self.slope
        }
    }
}

/// State of a Bentley–Ottmann sweep from left to right over a segment set.
///
/// The status holds the active segments from bottom to top at the current sweep position. Intersections are
/// recorded once per position, further segments meeting at a known position join its record. Intersection events
/// only mark a position, the segments meeting there are taken from the status when the sweep gets there.
#[derive(Debug)]
pub struct SweepLine {
    segments: Vec<Option<SweepSegment>>,
    status: Vec<SegmentIdx>,
    queue: EventQueue,
    records: Vec<Intersection>,
    record_at: BTreeMap<PositionKey, usize>,
    edge_intersections: BTreeMap<SegmentIdx, Vec<EdgeIntersection>>,
    /// Pairs of segments that came closer than twice the tolerance, re-checked after the sweep.
    pending: BTreeSet<(SegmentIdx, SegmentIdx)>,
    position: f64,
    current: Vec2,
    draining: bool,
    tolerance: f64,
}

impl SweepLine {
    /// Sets up the sweep with start and end events for all segments.
    ///
    /// Segments of zero length or with non-finite coordinates take no part in the sweep.
    #[must_use]
    pub fn new(segments: &[Segment2], tolerance: f64) -> Self {
        let mut queue = EventQueue::new();
        let mut sweep_segments = Vec::with_capacity(segments.len());

        for (idx, &[v0, v1]) in segments.iter().enumerate() {
            if !v0.is_finite() || !v1.is_finite() || v0 == v1 {
                warn!("Segment {} from {} to {} is skipped", idx, v0, v1);
                sweep_segments.push(None);
                continue;
            }

            let segment = SweepSegment::new([v0, v1]);
            queue.enqueue(Event::start(segment.left, idx));
            queue.enqueue(Event::end(segment.right, idx));
            sweep_segments.push(Some(segment));
        }

        Self {
            segments: sweep_segments,
            status: Vec::new(),
            queue,
            records: Vec::new(),
            record_at: BTreeMap::new(),
            edge_intersections: BTreeMap::new(),
            pending: BTreeSet::new(),
            position: f64::MIN,
            current: Vec2::new(f64::MIN, f64::MIN),
            draining: false,
            tolerance: tolerance.max(0.0),
        }
    }

    /// Runs the sweep until the queue is empty, then re-checks the pairs found by the tolerant scan.
    pub fn process(&mut self) {
        let now = std::time::Instant::now();

        while let Some(events) = self.queue.dequeue() {
            self.handle_events(events);
        }

        self.draining = true;
        for (a, b) in std::mem::take(&mut self.pending) {
            self.check_intersection(a, b);
        }

        log::trace!(
            "Sweep over {} segments computed in {} µs",
            self.segments.len(),
            now.elapsed().as_micros()
        );
        log::debug!("Found {} intersections", self.records.len());
    }

    /// The intersection records, ordered by position.
    #[must_use]
    pub fn intersections(&self) -> Vec<Intersection> {
        self.record_at
            .values()
            .map(|&r| {
                let mut record = self.records[r].clone();
                record.segments.sort_unstable();
                record
            })
            .collect()
    }

    /// The intersections on each segment, ordered by their parameter along the segment.
    #[must_use]
    pub fn into_edge_intersections(self) -> BTreeMap<SegmentIdx, Vec<EdgeIntersection>> {
        let mut edge_intersections = self.edge_intersections;
        for intersections in edge_intersections.values_mut() {
            intersections.sort_by(|a, b| a.t.total_cmp(&b.t));
        }

        edge_intersections
    }

    /// Processes all events at one position.
    ///
    /// Every active segment through the event point leaves the status, whether an event names it or not. Those
    /// not ending here go back in together with the starting segments, ordered as behind the event point, and
    /// only then the new neighbors are checked. All segments meeting at the event point are checked pairwise.
    fn handle_events(&mut self, events: Vec<Event>) {
        let Some(first) = events.first() else {
            return;
        };

        self.position = first.position.x;
        self.current = first.position;

        let mut starting = Vec::new();
        let mut ending = Vec::new();
        for event in &events {
            match (event.kind, event.segment) {
                (EventType::Start, Some(s)) => {
                    self.look_for_tolerant_pairs(event, s);
                    starting.push(s);
                }
                (EventType::End, Some(s)) => {
                    self.look_for_tolerant_pairs(event, s);
                    ending.push(s);
                }
                (EventType::Intersection, _) => (),
                _ => warn!("Unexpected event {}", event),
            }
        }

        let (through, rest): (Vec<SegmentIdx>, Vec<SegmentIdx>) = self
            .status
            .iter()
            .partition(|&&s| ending.contains(&s) || self.passes_event_point(s));
        self.status = rest;

        let mut block: Vec<SegmentIdx> = through
            .iter()
            .chain(&starting)
            .copied()
            .filter(|s| !ending.contains(s))
            .collect();
        block.sort_by(|&a, &b| self.cmp_behind_event(a, b));

        let meeting: Vec<SegmentIdx> = through.into_iter().chain(starting).collect();
        for (k, &a) in meeting.iter().enumerate() {
            for &b in &meeting[k + 1..] {
                self.check_intersection(a, b);
            }
        }

        let i = self
            .status
            .partition_point(|&s| self.is_below_event_point(s));
        let len = block.len();
        let above = self.status.split_off(i);
        self.status.extend(block);
        self.status.extend(above);

        if i > 0 && i < self.status.len() {
            self.check_intersection(self.status[i - 1], self.status[i]);
        }
        if len > 0 && i + len < self.status.len() {
            self.check_intersection(self.status[i + len - 1], self.status[i + len]);
        }
    }

    /// Checks if the segment meets the sweep line at the height of the event point, within the tolerance.
    ///
    /// The tolerance is a distance across the segment, along the sweep line it grows with the slope.
    fn passes_event_point(&self, s: SegmentIdx) -> bool {
        let Some(segment) = self.segments[s] else {
            return false;
        };

        let y = segment.y_at(self.position, self.current.y);
        let scale = y.abs().max(self.current.y.abs()).max(1.0);
        let steepness = if segment.is_vertical() {
            1.0
        } else {
            segment.slope.abs().max(1.0)
        };

        (y - self.current.y).abs() <= self.tolerance.max(TOLERANCE * scale) * steepness
    }

    fn is_below_event_point(&self, s: SegmentIdx) -> bool {
        self.segments[s]
            .is_some_and(|segment| segment.y_at(self.position, self.current.y) < self.current.y)
    }

    /// Order of two segments through the event point just behind it, bottom to top.
    ///
    /// Behind a common point the segment with the smaller slope is below, vertical segments are on top. Collinear
    /// segments keep the order of their indices.
    fn cmp_behind_event(&self, a: SegmentIdx, b: SegmentIdx) -> Ordering {
        match (self.segments[a], self.segments[b]) {
            (Some(sa), Some(sb)) => sa.slope.total_cmp(&sb.slope).then_with(|| a.cmp(&b)),
            _ => a.cmp(&b),
        }
    }

    fn is_ahead(&self, p: Vec2) -> bool {
        greater(p.x, self.position, TOLERANCE)
            || (almost_equal(p.x, self.position, TOLERANCE)
                && greater(p.y, self.current.y, TOLERANCE))
    }

    fn check_intersection(&mut self, a: SegmentIdx, b: SegmentIdx) {
        if a == b {
            return;
        }

        let (Some(sa), Some(sb)) = (self.segments[a], self.segments[b]) else {
            return;
        };

        for hit in segment_intersections(sa.v0, sa.v1, sb.v0, sb.v1, self.tolerance) {
            self.record(a, b, hit);
        }
    }

    fn record(&mut self, a: SegmentIdx, b: SegmentIdx, hit: SegmentHit) {
        let key = PositionKey(hit.position);

        let r = match self.record_at.get(&key) {
            Some(&r) => r,
            None => {
                self.records.push(Intersection {
                    position: hit.position,
                    segments: Vec::new(),
                });
                let r = self.records.len() - 1;
                self.record_at.insert(key, r);

                if !self.draining && self.is_ahead(hit.position) {
                    self.queue.enqueue(Event::intersection(hit.position));
                }

                r
            }
        };

        let position = self.records[r].position;
        for (edge, other, t, s) in [(a, b, hit.t, hit.s), (b, a, hit.s, hit.t)] {
            if self.records[r].segments.contains(&edge) {
                continue;
            }

            self.records[r].segments.push(edge);
            self.edge_intersections
                .entry(edge)
                .or_default()
                .push(EdgeIntersection {
                    position,
                    edges: [edge, other],
                    t,
                    s,
                });
        }
    }

    /// Remembers every queued segment that comes closer than twice the tolerance to the segment of `event`.
    ///
    /// Exact neighborhood in the status misses almost parallel segments that nearly touch, these pairs are
    /// checked once the queue is drained.
    fn look_for_tolerant_pairs(&mut self, event: &Event, s: SegmentIdx) {
        if self.tolerance == 0.0 {
            return;
        }
        let Some(segment) = self.segments[s] else {
            return;
        };

        let threshold = 2.0 * self.tolerance;
        let close: Vec<SegmentIdx> = self
            .queue
            .iter()
            .filter(|queued| queued.kind != EventType::Intersection)
            .filter_map(|queued| Some((queued.position, queued.segment?)))
            .filter(|&(position, other)| {
                let Some(other_segment) = self.segments[other] else {
                    return false;
                };
                if other == s {
                    return false;
                }

                let (_, _, d0) = closest_point_on_segment(position, segment.v0, segment.v1);
                let (_, _, d1) =
                    closest_point_on_segment(event.position, other_segment.v0, other_segment.v1);

                less(d0, threshold, TOLERANCE) || less(d1, threshold, TOLERANCE)
            })
            .map(|(_, other)| other)
            .collect();

        for other in close {
            self.pending.insert((s.min(other), s.max(other)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64) -> Vec2 {
        Vec2::new(x, y)
    }

    #[test]
    fn test_sweep_segment() {
        let segment = SweepSegment::new([v(4.0, 4.0), v(0.0, 2.0)]);

        assert_eq!(segment.left, v(0.0, 2.0));
        assert_eq!(segment.right, v(4.0, 4.0));
        assert_eq!(segment.slope, 0.5);
        assert_eq!(segment.y_at(2.0, 0.0), 3.0);

        let vertical = SweepSegment::new([v(1.0, 3.0), v(1.0, -1.0)]);
        assert!(vertical.is_vertical());
        assert_eq!(vertical.left, v(1.0, -1.0));
        assert_eq!(vertical.y_at(1.0, 0.5), 0.5);
        assert_eq!(vertical.y_at(1.0, 7.0), 3.0);
    }

    #[test]
    fn test_order_behind_event_point() {
        let segments = [
            [v(0.0, 0.0), v(2.0, 2.0)],
            [v(0.0, 2.0), v(2.0, 0.0)],
            [v(1.0, 0.0), v(1.0, 2.0)],
            [v(3.0, 3.0), v(-1.0, -1.0)],
        ];
        let sweep = SweepLine::new(&segments, 0.0);

        // falling below rising below vertical, collinear ones by index
        assert_eq!(sweep.cmp_behind_event(1, 0), Ordering::Less);
        assert_eq!(sweep.cmp_behind_event(0, 2), Ordering::Less);
        assert_eq!(sweep.cmp_behind_event(0, 3), Ordering::Less);
        assert_eq!(sweep.cmp_behind_event(3, 0), Ordering::Greater);
    }

    #[test]
    fn test_segments_through_event_point_are_reordered() {
        // 0 and 7 overlap on the line y = x + 1, 1 crosses both at (-2.5, -1.5) while only one pair is recorded there
        let segments: Vec<Segment2> = [
            [(-7.0, -6.0), (4.0, 5.0)],
            [(-6.0, 2.0), (6.0, -10.0)],
            [(-1.0, -4.0), (8.0, -10.0)],
            [(-4.0, -4.0), (10.0, 4.0)],
            [(5.0, -9.0), (-10.0, 6.0)],
            [(-9.0, -1.0), (1.0, 10.0)],
            [(-4.0, 6.0), (6.0, -3.0)],
            [(5.0, 6.0), (-5.0, -4.0)],
            [(-5.0, 4.0), (7.0, -7.0)],
            [(-7.0, -4.0), (7.0, 9.0)],
        ]
        .into_iter()
        .map(|[p0, p1]| [Vec2::from(p0), Vec2::from(p1)])
        .collect();

        let mut sweep = SweepLine::new(&segments, 0.0);
        sweep.process();

        assert!(sweep.status.is_empty());
        let found: Vec<Vec2> = sweep.intersections().iter().map(|i| i.position).collect();
        assert_eq!(found, super::super::intersect_brute_force(&segments, 0.0));
        assert!(found.contains(&v(2.796116504854369, -0.11650485436893204)));
    }

    #[test]
    fn test_skips_degenerate_segments() {
        let segments = [
            [v(0.0, 0.0), v(0.0, 0.0)],
            [v(f64::NAN, 0.0), v(1.0, 1.0)],
            [v(0.0, 0.0), v(1.0, 1.0)],
        ];
        let sweep = SweepLine::new(&segments, 0.0);

        assert!(sweep.segments[0].is_none());
        assert!(sweep.segments[1].is_none());
        assert_eq!(sweep.queue.len(), 2);
    }

    #[test]
    fn test_records_merge_at_shared_position() {
        let segments = [
            [v(0.0, 0.0), v(2.0, 2.0)],
            [v(0.0, 2.0), v(2.0, 0.0)],
            [v(1.0, 0.0), v(1.0, 2.0)],
        ];
        let mut sweep = SweepLine::new(&segments, 0.0);
        sweep.process();

        let intersections = sweep.intersections();
        assert_eq!(intersections.len(), 1);
        assert_eq!(intersections[0].position, v(1.0, 1.0));
        assert_eq!(intersections[0].segments, vec![0, 1, 2]);

        let per_edge = sweep.into_edge_intersections();
        assert_eq!(per_edge.len(), 3);
        assert!(per_edge.values().all(|list| list.len() == 1));
        assert_eq!(per_edge[&2][0].t, 0.5);
    }
}
