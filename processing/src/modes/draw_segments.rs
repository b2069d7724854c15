use geo::Rect;

use crate::{
    graph::{RoadGraph, SegmentId},
    output::{union_rects, Canvas, CanvasSize, DrawOptions, RenderOptions},
    Result,
};

const BACKGROUND: &str = "white";
const NETWORK_COLOR: &str = "#b0b0b0";

/// Draws the given segments in the configured colour. The canvas covers the segments
/// themselves, or the whole network when the background is drawn.
pub fn draw_segments(graph: &RoadGraph, ids: &[SegmentId], opts: &RenderOptions) -> Result<Canvas> {
    let segments = ids
        .iter()
        .map(|id| graph.segment(*id))
        .collect::<Result<Vec<_>>>()?;

    let extent = if opts.draw_background {
        union_rects(graph.segments().iter().filter_map(|s| s.bounds()))
    } else {
        union_rects(segments.iter().filter_map(|s| s.bounds()))
    };
    let extent = extent.unwrap_or_else(|| Rect::new((0.0, 0.0), (1.0, 1.0)));

    let mut canvas = Canvas::new(CanvasSize::fit(opts.canvas_width, extent), BACKGROUND);

    if opts.draw_background {
        let network = DrawOptions {
            color: NETWORK_COLOR.into(),
            stroke: (opts.stroke / 2.0).max(0.5),
            ..Default::default()
        };
        for segment in graph.segments().iter().filter(|s| s.bounds().is_some()) {
            canvas.draw_polyline(&segment.geometry, &network);
        }
    }

    let path = DrawOptions {
        color: opts.color.clone(),
        stroke: opts.stroke,
        ..Default::default()
    };
    for segment in segments {
        canvas.draw_polyline(&segment.geometry, &path);
    }

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        graph::TypeFilter,
        parse::{Point, RoadData},
        Error,
    };

    fn graph() -> RoadGraph {
        let roads = [((0.0, 0.0), (10.0, 0.0)), ((10.0, 0.0), (10.0, 5.0))]
            .into_iter()
            .map(|(a, b)| RoadData {
                road_type: "primary".into(),
                coordinates: vec![Point { x: a.0, y: a.1 }, Point { x: b.0, y: b.1 }],
            })
            .collect();
        RoadGraph::new(roads, TypeFilter::allow_all()).unwrap()
    }

    #[test]
    fn test_draw_segments() {
        let graph = graph();
        let canvas = draw_segments(&graph, &[SegmentId(0)], &RenderOptions::default()).unwrap();
        assert_eq!(canvas.size.width, 1000);
        // A horizontal segment becomes a square canvas.
        assert_eq!(canvas.size.height, 1000);

        let svg = canvas.document.to_string();
        assert_eq!(svg.matches("<path").count(), 1);
    }

    #[test]
    fn test_draw_with_background() {
        let graph = graph();
        let opts = RenderOptions {
            draw_background: true,
            ..Default::default()
        };
        let canvas = draw_segments(&graph, &[SegmentId(1)], &opts).unwrap();
        let svg = canvas.document.to_string();
        assert_eq!(svg.matches("<path").count(), 3);
        assert!(svg.contains(NETWORK_COLOR));
    }

    #[test]
    fn test_draw_color() {
        let graph = graph();
        let opts = RenderOptions {
            color: "#ff0000".into(),
            ..Default::default()
        };
        let canvas = draw_segments(&graph, &[SegmentId(0)], &opts).unwrap();
        let svg = canvas.document.to_string();
        assert!(svg.contains("stroke=\"#ff0000\""));
        assert!(!svg.contains("stroke=\"black\""));
    }

    #[test]
    fn test_draw_unknown_segment() {
        let graph = graph();
        let result = draw_segments(&graph, &[SegmentId(9)], &RenderOptions::default());
        assert!(matches!(result, Err(Error::NotFound(SegmentId(9)))));
    }
}
