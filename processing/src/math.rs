use geo::{
    algorithm::line_intersection::{line_intersection, LineIntersection},
    Coord, EuclideanLength, LineString, Rect,
};

/// Returns a description of what is wrong with the polyline, if anything.
pub fn polyline_defect(line: &LineString<f64>) -> Option<String> {
    if line.0.len() < 2 {
        return Some(format!("{} coordinates, need at least 2", line.0.len()));
    }
    if let Some(coord) = line.0.iter().find(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Some(format!("non-finite coordinate ({}, {})", coord.x, coord.y));
    }
    if line.lines().all(|l| l.start == l.end) {
        return Some("all coordinates are identical".into());
    }
    None
}

pub fn polyline_length(line: &LineString<f64>) -> f64 {
    line.euclidean_length()
}

/// Linework "touches": the two polylines share at least one point and every
/// shared point is on the boundary of one of them. The boundary of an open
/// polyline is its two end points, a closed one has none.
pub fn touches(a: &LineString<f64>, b: &LineString<f64>) -> bool {
    let mut contact = false;

    for la in a.lines().filter(|l| l.start != l.end) {
        for lb in b.lines().filter(|l| l.start != l.end) {
            let point = match line_intersection(la, lb) {
                None => continue,
                Some(LineIntersection::SinglePoint {
                    intersection,
                    is_proper,
                }) => {
                    if is_proper {
                        return false;
                    }
                    intersection
                }
                Some(LineIntersection::Collinear { intersection }) => {
                    if intersection.start != intersection.end {
                        return false;
                    }
                    intersection.start
                }
            };

            if !on_boundary(a, point) && !on_boundary(b, point) {
                return false;
            }
            contact = true;
        }
    }

    contact
}

fn on_boundary(line: &LineString<f64>, coord: Coord<f64>) -> bool {
    if line.is_closed() {
        return false;
    }
    line.0.first() == Some(&coord) || line.0.last() == Some(&coord)
}

pub fn rects_intersect(a: &Rect<f64>, b: &Rect<f64>) -> bool {
    a.min().x <= b.max().x
        && b.min().x <= a.max().x
        && a.min().y <= b.max().y
        && b.min().y <= a.max().y
}

pub fn half_diagonal(rect: &Rect<f64>) -> f64 {
    rect.width().hypot(rect.height()) / 2.0
}
