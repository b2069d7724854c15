//! Enumeration of bounded-length road groups.
//!
//! A road group is a simple path of touching road segments, grown from a start
//! segment, whose total length falls inside a caller supplied window. The
//! [`RoadGraph`] answers "which segments touch segment X" queries against a
//! type-filtered subset of the network and [`enumerate_groups`] walks those
//! answers depth first, backtracking after every branch.
//!
//! The remaining modules are the tooling around that core: reading and
//! projecting road files, rendering groups to SVG and the batch driver used by
//! the `road-groups` binary.

pub mod args;
pub mod graph;
pub mod math;
pub mod modes;
pub mod output;
pub mod parse;
pub mod progress;
pub mod search;

pub use graph::{RoadGraph, Segment, SegmentId, TypeFilter};
pub use search::{enumerate_groups, GroupBounds, RoadGroup};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Segment {0} not found")]
    NotFound(SegmentId),

    #[error("Invalid geometry for segment {id}: {reason}")]
    Geometry { id: SegmentId, reason: String },

    #[error("Projection error: {0}")]
    Projection(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::NotFound(SegmentId(7));
        assert_eq!(err.to_string(), "Segment 7 not found");

        let err = Error::Geometry {
            id: SegmentId(3),
            reason: "fewer than two coordinates".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid geometry for segment 3: fewer than two coordinates"
        );
    }
}
