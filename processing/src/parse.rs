use std::{fs::File, io::BufReader, path::Path};

use geo::Coord;
use proj4rs::Proj;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const WGS84_DEFINITION: &str = "+proj=longlat +a=6378137 +b=6378137 +no_defs +type=crs";
const WEB_MERCATOR_DEFINITION: &str =
    "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs +type=crs";

/// Projected coordinate, in metres.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl From<Point> for Coord<f64> {
    fn from(point: Point) -> Self {
        Coord {
            x: point.x,
            y: point.y,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawRoadData {
    #[serde(rename = "type")]
    pub road_type: String,
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadData {
    pub road_type: String,
    pub coordinates: Vec<Point>,
}

/// Reads a JSON array of roads. Unless `projected` is set the coordinates are
/// WGS84 `[longitude, latitude]` degrees and get projected to Web Mercator.
pub fn read_roads(path: impl AsRef<Path>, projected: bool) -> Result<Vec<RoadData>> {
    let reader = BufReader::new(File::open(path)?);
    let raw: Vec<RawRoadData> = serde_json::from_reader(reader)?;

    if projected {
        Ok(parse_road_data(raw))
    } else {
        project_road_data(raw, &WebMercator::new()?)
    }
}

pub(crate) fn parse_road_data(raw: Vec<RawRoadData>) -> Vec<RoadData> {
    raw.into_iter()
        .map(|raw| RoadData {
            road_type: raw.road_type,
            coordinates: raw
                .coordinates
                .into_iter()
                .map(|[x, y]| Point { x, y })
                .collect(),
        })
        .collect()
}

pub(crate) fn project_road_data(
    raw: Vec<RawRoadData>,
    projection: &WebMercator,
) -> Result<Vec<RoadData>> {
    raw.into_iter()
        .map(|raw| {
            let mut coords = raw
                .coordinates
                .iter()
                .map(|[lon, lat]| (*lon, *lat))
                .collect::<Vec<_>>();
            projection.project(&mut coords)?;

            Ok(RoadData {
                road_type: raw.road_type,
                coordinates: coords.into_iter().map(|(x, y)| Point { x, y }).collect(),
            })
        })
        .collect()
}

/// WGS84 longitude/latitude to spherical Web Mercator (EPSG:3857).
pub struct WebMercator {
    from: Proj,
    to: Proj,
}

impl WebMercator {
    pub fn new() -> Result<Self> {
        let from = Proj::from_proj_string(WGS84_DEFINITION)
            .map_err(|e| Error::Projection(e.to_string()))?;
        let to = Proj::from_proj_string(WEB_MERCATOR_DEFINITION)
            .map_err(|e| Error::Projection(e.to_string()))?;
        Ok(WebMercator { from, to })
    }

    /// Projects `(longitude, latitude)` degree pairs in place.
    pub fn project(&self, coords: &mut [(f64, f64)]) -> Result<()> {
        for (lon, lat) in coords.iter_mut() {
            *lon = lon.to_radians();
            *lat = lat.to_radians();
        }
        proj4rs::transform::transform(&self.from, &self.to, coords)
            .map_err(|e| Error::Projection(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_mercator() {
        let projection = WebMercator::new().unwrap();
        let mut coords = vec![(0.0, 0.0), (90.0, 0.0), (0.0, 45.0)];
        projection.project(&mut coords).unwrap();

        assert!(coords[0].0.abs() < 1e-6 && coords[0].1.abs() < 1e-6);
        assert!((coords[1].0 - 10_018_754.171394622).abs() < 1e-3);
        assert!(coords[1].1.abs() < 1e-6);
        assert!(coords[2].0.abs() < 1e-6);
        assert!((coords[2].1 - 5_621_521.486192066).abs() < 1e-2);
    }

    #[test]
    fn test_parse_projected() {
        let raw: Vec<RawRoadData> = serde_json::from_str(
            r#"[
                {"type": "primary", "coordinates": [[0, 0], [3, 4]]},
                {"type": "cycleway", "coordinates": [[3, 4], [3, 10]]}
            ]"#,
        )
        .unwrap();
        let roads = parse_road_data(raw);

        assert_eq!(roads.len(), 2);
        assert_eq!(roads[0].road_type, "primary");
        assert_eq!(roads[0].coordinates[1], Point { x: 3.0, y: 4.0 });
        assert_eq!(roads[1].road_type, "cycleway");
    }

    #[test]
    fn test_project_road_data() {
        let raw: Vec<RawRoadData> = serde_json::from_str(
            r#"[{"type": "primary", "coordinates": [[0, 0], [90, 0]]}]"#,
        )
        .unwrap();
        let roads = project_road_data(raw, &WebMercator::new().unwrap()).unwrap();
        assert!((roads[0].coordinates[1].x - 10_018_754.171394622).abs() < 1e-3);
    }
}
