use crate::{
    graph::{RoadGraph, Segment, SegmentId},
    Result,
};

/// The segment itself followed by the filtered segments touching it.
pub fn neighbours(graph: &RoadGraph, id: SegmentId) -> Result<(&Segment, Vec<&Segment>)> {
    let segment = graph.segment(id)?;
    let touching = graph.segments_touching(id)?;
    Ok((segment, touching))
}
