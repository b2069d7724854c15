use std::{collections::HashSet, fmt};

use geo::{BoundingRect, Coord, LineString, Rect};
use kdtree::{distance::squared_euclidean, KdTree};
use serde::{Deserialize, Serialize};

use crate::{
    math::{half_diagonal, polyline_defect, polyline_length, rects_intersect, touches},
    parse::RoadData,
    Error, Result,
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SegmentId(pub usize);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Segment {
    pub id: SegmentId,
    /// Polyline in projected metres
    pub geometry: LineString<f64>,
    pub road_type: String,
    pub length: f64,
    /// `None` when the geometry is malformed
    bounds: Option<Rect<f64>>,
}

impl Segment {
    fn new(id: SegmentId, road: RoadData) -> Self {
        let geometry: LineString<f64> = road.coordinates.into_iter().map(Coord::from).collect();
        let valid = polyline_defect(&geometry).is_none();
        let bounds = if valid { geometry.bounding_rect() } else { None };
        let length = if valid { polyline_length(&geometry) } else { 0.0 };

        Segment {
            id,
            geometry,
            road_type: road.road_type,
            length,
            bounds,
        }
    }

    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.bounds
    }

    fn checked_bounds(&self) -> Result<Rect<f64>> {
        match self.bounds {
            Some(bounds) => Ok(bounds),
            None => Err(Error::Geometry {
                id: self.id,
                reason: polyline_defect(&self.geometry).unwrap_or_else(|| "no extent".into()),
            }),
        }
    }
}

/// Road types allowed to take part in adjacency. An empty filter allows all.
#[derive(Debug, Clone, Default)]
pub struct TypeFilter(HashSet<String>);

impl TypeFilter {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TypeFilter(types.into_iter().map(Into::into).collect())
    }

    pub fn allow_all() -> Self {
        TypeFilter::default()
    }

    pub fn allows(&self, road_type: &str) -> bool {
        self.0.is_empty() || self.0.contains(road_type)
    }
}

/// Immutable road network answering touching queries.
///
/// Segments passing the type filter with well formed geometry are indexed by
/// the centre of their bounding box. A query looks up every indexed centre
/// close enough for the boxes to overlap, then runs the exact predicate on
/// those candidates only.
pub struct RoadGraph {
    segments: Vec<Segment>,
    filter: TypeFilter,
    index: KdTree<f64, usize, [f64; 2]>,
    max_half_diagonal: f64,
}

impl RoadGraph {
    /// Segment ids are the positions in `roads`.
    pub fn new(roads: Vec<RoadData>, filter: TypeFilter) -> Result<Self> {
        let segments = roads
            .into_iter()
            .enumerate()
            .map(|(idx, road)| Segment::new(SegmentId(idx), road))
            .collect::<Vec<_>>();

        let mut index = KdTree::new(2);
        let mut max_half_diagonal: f64 = 0.0;
        for segment in segments.iter().filter(|s| filter.allows(&s.road_type)) {
            let Some(bounds) = segment.bounds else {
                continue;
            };
            let center = bounds.center();
            index
                .add([center.x, center.y], segment.id.0)
                .map_err(|e| Error::Geometry {
                    id: segment.id,
                    reason: format!("cannot index segment: {:?}", e),
                })?;
            max_half_diagonal = max_half_diagonal.max(half_diagonal(&bounds));
        }

        Ok(RoadGraph {
            segments,
            filter,
            index,
            max_half_diagonal,
        })
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment(&self, id: SegmentId) -> Result<&Segment> {
        self.segments.get(id.0).ok_or(Error::NotFound(id))
    }

    /// Ids of the segments passing the type filter, ascending.
    pub fn filtered_ids(&self) -> Vec<SegmentId> {
        self.segments
            .iter()
            .filter(|s| self.filter.allows(&s.road_type))
            .map(|s| s.id)
            .collect()
    }

    /// All filtered segments whose geometry touches the geometry of `id`,
    /// ordered by ascending id.
    pub fn segments_touching(&self, id: SegmentId) -> Result<Vec<&Segment>> {
        let segment = self.segment(id)?;
        let bounds = segment.checked_bounds()?;
        let center = bounds.center();

        let radius = half_diagonal(&bounds) + self.max_half_diagonal;
        let radius = radius * (1.0 + 1e-9) + 1e-9;

        let candidates = self
            .index
            .within(&[center.x, center.y], radius * radius, &squared_euclidean)
            .map_err(|e| Error::Geometry {
                id,
                reason: format!("spatial index query failed: {:?}", e),
            })?;

        let mut touching = candidates
            .into_iter()
            .map(|(_, idx)| &self.segments[*idx])
            .filter(|other| other.id != id)
            .filter(|other| {
                other
                    .bounds
                    .map_or(false, |other_bounds| rects_intersect(&bounds, &other_bounds))
            })
            .filter(|other| touches(&segment.geometry, &other.geometry))
            .collect::<Vec<_>>();
        touching.sort_by_key(|s| s.id);

        Ok(touching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Point;

    fn road(road_type: &str, coords: &[(f64, f64)]) -> RoadData {
        RoadData {
            road_type: road_type.into(),
            coordinates: coords.iter().map(|&(x, y)| Point { x, y }).collect(),
        }
    }

    fn ids(segments: Vec<&Segment>) -> Vec<usize> {
        segments.into_iter().map(|s| s.id.0).collect()
    }

    fn grid() -> RoadGraph {
        // 0 -- 1 -- 2 along y = 0, 3 hangs off the joint of 1 and 2,
        // 4 is a footway touching 0 and 5 crosses 1 without touching.
        let roads = vec![
            road("primary", &[(0.0, 0.0), (10.0, 0.0)]),
            road("primary", &[(10.0, 0.0), (20.0, 0.0)]),
            road("secondary", &[(20.0, 0.0), (30.0, 0.0)]),
            road("tertiary", &[(20.0, 0.0), (20.0, 10.0)]),
            road("footway", &[(0.0, 0.0), (0.0, -10.0)]),
            road("primary", &[(15.0, -5.0), (15.0, 5.0)]),
        ];
        RoadGraph::new(roads, TypeFilter::new(["primary", "secondary", "tertiary"])).unwrap()
    }

    #[test]
    fn test_segment_lengths() {
        let graph = grid();
        assert_eq!(graph.len(), 6);
        assert_eq!(graph.segment(SegmentId(0)).unwrap().length, 10.0);
        assert_eq!(graph.segment(SegmentId(5)).unwrap().length, 10.0);
    }

    #[test]
    fn test_length_follows_geometry() {
        let roads = vec![
            road("primary", &[(0.0, 0.0), (3.0, 4.0), (3.0, 10.0)]),
            road("primary", &[(5.0, 5.0)]),
        ];
        let graph = RoadGraph::new(roads, TypeFilter::allow_all()).unwrap();
        assert_eq!(graph.segment(SegmentId(0)).unwrap().length, 11.0);
        assert_eq!(graph.segment(SegmentId(1)).unwrap().length, 0.0);
    }

    #[test]
    fn test_segments_touching() {
        let graph = grid();
        assert_eq!(ids(graph.segments_touching(SegmentId(1)).unwrap()), vec![0, 2, 3]);
        assert_eq!(ids(graph.segments_touching(SegmentId(2)).unwrap()), vec![1, 3]);
        assert_eq!(ids(graph.segments_touching(SegmentId(5)).unwrap()), Vec::<usize>::new());
    }

    #[test]
    fn test_type_filter_excludes_neighbours() {
        let graph = grid();
        // The footway is not returned as a neighbour...
        assert_eq!(ids(graph.segments_touching(SegmentId(0)).unwrap()), vec![1]);
        // ...but can still be queried itself.
        assert_eq!(ids(graph.segments_touching(SegmentId(4)).unwrap()), vec![0]);
        assert_eq!(
            graph.filtered_ids(),
            vec![0, 1, 2, 3, 5].into_iter().map(SegmentId).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_touching_is_deterministic() {
        let graph = grid();
        let first = ids(graph.segments_touching(SegmentId(1)).unwrap());
        for _ in 0..5 {
            assert_eq!(ids(graph.segments_touching(SegmentId(1)).unwrap()), first);
        }
    }

    #[test]
    fn test_index_matches_full_scan() {
        let mut roads = Vec::new();
        for i in 0..20 {
            let x = i as f64 * 7.0;
            roads.push(road("primary", &[(x, 0.0), (x + 7.0, 0.0)]));
            roads.push(road("primary", &[(x, 0.0), (x, 50.0 + i as f64)]));
        }
        roads.push(road("primary", &[(-500.0, -500.0), (0.0, 0.0)]));
        let graph = RoadGraph::new(roads, TypeFilter::allow_all()).unwrap();

        for segment in graph.segments() {
            let expected = graph
                .segments()
                .iter()
                .filter(|o| o.id != segment.id && touches(&segment.geometry, &o.geometry))
                .map(|o| o.id.0)
                .collect::<Vec<_>>();
            assert_eq!(ids(graph.segments_touching(segment.id).unwrap()), expected);
        }
    }

    #[test]
    fn test_unknown_segment() {
        let graph = grid();
        let err = graph.segments_touching(SegmentId(42)).unwrap_err();
        assert!(matches!(err, Error::NotFound(SegmentId(42))));
    }

    #[test]
    fn test_malformed_geometry() {
        let roads = vec![
            road("primary", &[(0.0, 0.0), (10.0, 0.0)]),
            road("primary", &[(10.0, 0.0)]),
        ];
        let graph = RoadGraph::new(roads, TypeFilter::allow_all()).unwrap();
        let err = graph.segments_touching(SegmentId(1)).unwrap_err();
        assert!(matches!(err, Error::Geometry { id: SegmentId(1), .. }));
        // Malformed segments are never returned as neighbours.
        assert!(graph.segments_touching(SegmentId(0)).unwrap().is_empty());
    }
}
