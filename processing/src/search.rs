use std::collections::HashSet;

use fixedbitset::FixedBitSet;
use serde::{Deserialize, Serialize};

use crate::{
    graph::{RoadGraph, Segment, SegmentId},
    Error, Result,
};

/// Length window and result cap of one enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupBounds {
    /// Exclusive upper bound on the total length, in metres
    pub max_length: f64,
    /// Inclusive lower bound on the total length, in metres
    pub min_length: f64,
    pub max_groups: usize,
}

impl GroupBounds {
    pub fn new(max_length: f64, min_length: f64, max_groups: usize) -> Result<Self> {
        let bounds = GroupBounds {
            max_length,
            min_length,
            max_groups,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.max_length.is_finite() || self.max_length <= 0.0 {
            return Err(Error::InvalidBounds(format!(
                "max_length must be positive, got {}",
                self.max_length
            )));
        }
        if !self.min_length.is_finite() || self.min_length < 0.0 {
            return Err(Error::InvalidBounds(format!(
                "min_length must not be negative, got {}",
                self.min_length
            )));
        }
        if self.min_length >= self.max_length {
            return Err(Error::InvalidBounds(format!(
                "min_length {} must be below max_length {}",
                self.min_length, self.max_length
            )));
        }
        if self.max_groups == 0 {
            return Err(Error::InvalidBounds("max_groups must be positive".into()));
        }
        Ok(())
    }
}

/// A set of segments forming one simple path from the start segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadGroup {
    /// Member ids, ascending
    pub segments: Vec<SegmentId>,
    /// Total length of the members, in metres
    pub length: f64,
}

impl RoadGroup {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn contains(&self, id: SegmentId) -> bool {
        self.segments.binary_search(&id).is_ok()
    }
}

/// The branch currently being walked.
///
/// `totals[i]` is the length of `sequence[..=i]`, so popping restores the
/// previous total exactly instead of subtracting.
struct SearchPath {
    sequence: Vec<SegmentId>,
    totals: Vec<f64>,
    visited: FixedBitSet,
}

impl SearchPath {
    fn new(start: SegmentId, length: f64, segment_count: usize) -> Self {
        let mut visited = FixedBitSet::with_capacity(segment_count);
        visited.insert(start.0);
        SearchPath {
            sequence: vec![start],
            totals: vec![length],
            visited,
        }
    }

    fn tail(&self) -> SegmentId {
        self.sequence[self.sequence.len() - 1]
    }

    fn total_length(&self) -> f64 {
        self.totals[self.totals.len() - 1]
    }

    fn contains(&self, id: SegmentId) -> bool {
        self.visited.contains(id.0)
    }

    fn push(&mut self, id: SegmentId, length: f64) {
        let total = self.total_length() + length;
        self.sequence.push(id);
        self.totals.push(total);
        self.visited.insert(id.0);
    }

    fn pop(&mut self) {
        if let Some(id) = self.sequence.pop() {
            self.totals.pop();
            self.visited.set(id.0, false);
        }
    }

    /// Canonical, order independent form of the current branch.
    fn canonical(&self) -> Vec<SegmentId> {
        let mut ids = self.sequence.clone();
        ids.sort_unstable();
        ids
    }
}

struct ResultCollection {
    groups: Vec<RoadGroup>,
    seen: HashSet<Vec<SegmentId>>,
    max_groups: usize,
}

impl ResultCollection {
    fn new(max_groups: usize) -> Self {
        ResultCollection {
            groups: Vec::new(),
            seen: HashSet::new(),
            max_groups,
        }
    }

    fn is_full(&self) -> bool {
        self.groups.len() >= self.max_groups
    }

    fn record(&mut self, path: &SearchPath) {
        let segments = path.canonical();
        if self.seen.insert(segments.clone()) {
            self.groups.push(RoadGroup {
                segments,
                length: path.total_length(),
            });
        }
    }
}

/// Enumerates the distinct road groups reachable from `start`.
///
/// The walk is depth first, following [`RoadGraph::segments_touching`] order.
/// A branch is abandoned as soon as its length reaches `max_length`, every
/// branch with a length of at least `min_length` is recorded once per set of
/// segments, and the whole search stops when `max_groups` groups have been
/// recorded. Which groups survive the cap therefore depends on traversal
/// order: the earliest discovered ones are kept.
///
/// Any error from an adjacency query aborts the enumeration. The walk keeps
/// its own stack, so long branches do not grow the thread's call stack.
pub fn enumerate_groups(
    graph: &RoadGraph,
    start: SegmentId,
    bounds: GroupBounds,
) -> Result<Vec<RoadGroup>> {
    bounds.validate()?;
    let start_segment = graph.segment(start)?;

    let mut path = SearchPath::new(start, start_segment.length, graph.len());
    let mut results = ResultCollection::new(bounds.max_groups);
    backtrack(graph, &bounds, &mut path, &mut results)?;

    Ok(results.groups)
}

/// Neighbours of one segment on the current branch, and how far through
/// them the walk has got.
struct Frame<'g> {
    neighbours: Vec<&'g Segment>,
    next: usize,
}

impl<'g> Frame<'g> {
    fn next_unvisited(&mut self, path: &SearchPath) -> Option<&'g Segment> {
        while let Some(segment) = self.neighbours.get(self.next).copied() {
            self.next += 1;
            if !path.contains(segment.id) {
                return Some(segment);
            }
        }
        None
    }
}

/// Checks the cap and the length window for the branch that just grew and
/// records it. Returns the frame to expand it from, or `None` when the
/// branch ends here.
fn enter<'g>(
    graph: &'g RoadGraph,
    bounds: &GroupBounds,
    path: &SearchPath,
    results: &mut ResultCollection,
) -> Result<Option<Frame<'g>>> {
    if results.is_full() {
        return Ok(None);
    }

    let total_length = path.total_length();
    if total_length >= bounds.max_length {
        return Ok(None);
    }

    if total_length >= bounds.min_length {
        results.record(path);
    }

    Ok(Some(Frame {
        neighbours: graph.segments_touching(path.tail())?,
        next: 0,
    }))
}

/// Depth first walk on an explicit stack of frames, one per segment of the
/// branch that is still being expanded. Every `push` onto the path is paired
/// with a `pop`, either right away when the branch ends or when its frame is
/// exhausted.
fn backtrack(
    graph: &RoadGraph,
    bounds: &GroupBounds,
    path: &mut SearchPath,
    results: &mut ResultCollection,
) -> Result<()> {
    let mut frames = Vec::new();
    if let Some(frame) = enter(graph, bounds, path, results)? {
        frames.push(frame);
    }

    while let Some(frame) = frames.last_mut() {
        match frame.next_unvisited(path) {
            Some(next) => {
                path.push(next.id, next.length);
                match enter(graph, bounds, path, results)? {
                    Some(frame) => frames.push(frame),
                    None => path.pop(),
                }
            }
            None => {
                frames.pop();
                // The start segment's frame has no push of its own.
                if !frames.is_empty() {
                    path.pop();
                }
            }
        }
    }

    Ok(())
}
