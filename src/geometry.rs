//! Geodesic helpers for route geometry
//!
//! Thin wrappers over `geo` taking the crate's [`Point`]. Coordinates are
//! WGS84 degrees, distances are meters on the haversine sphere and bearings
//! are degrees clockwise from true north in `[0, 360)`.
//!
//! Projection onto a polyline finds the closest point of each segment in
//! coordinate space and ranks candidates by haversine distance.

use geo::{Bearing, Closest, ClosestPoint, Destination, Distance, Haversine, LineString};

use crate::types::Point;

fn to_geo(p: &Point) -> geo::Point<f64> {
    geo::Point::from(*p)
}

/// Haversine distance between two points in meters.
pub fn haversine(a: &Point, b: &Point) -> f64 {
    Haversine.distance(to_geo(a), to_geo(b))
}

/// Initial great-circle bearing from `from` to `to`.
pub fn bearing(from: &Point, to: &Point) -> f64 {
    normalize_bearing(Haversine.bearing(to_geo(from), to_geo(to)))
}

/// Point reached by travelling `distance_m` from `origin` along `bearing_deg`.
pub fn destination(origin: &Point, distance_m: f64, bearing_deg: f64) -> Point {
    Haversine
        .destination(to_geo(origin), bearing_deg, distance_m)
        .into()
}

/// Wrap any angle in degrees into `[0, 360)`.
pub fn normalize_bearing(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Total length of a polyline in meters.
pub fn line_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| haversine(&w[0], &w[1])).sum()
}

/// Result of projecting a position onto a polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct LineProjection {
    /// Nearest point on the polyline.
    pub point: Point,
    /// Index of the segment start point the projection falls on.
    pub segment_index: usize,
    /// Distance from the position to `point`, in meters.
    pub distance_m: f64,
    /// Distance along the polyline from its first point to `point`, in meters.
    pub distance_along_m: f64,
}

/// Project a position onto the nearest segment of a polyline.
///
/// Ties keep the earliest segment. Returns `None` for fewer than two points.
pub fn project_on_line(position: &Point, line: &[Point]) -> Option<LineProjection> {
    if line.len() < 2 {
        return None;
    }

    let target = to_geo(position);
    let path: LineString<f64> = line.iter().map(|p| geo::Coord::from(*p)).collect();

    let mut best: Option<LineProjection> = None;
    let mut along_m = 0.0;

    for (segment_index, segment) in path.lines().enumerate() {
        let start = segment.start_point();
        let nearest = match segment.closest_point(&target) {
            Closest::Intersection(p) | Closest::SinglePoint(p) => p,
            Closest::Indeterminate => start,
        };
        let distance_m = Haversine.distance(target, nearest);

        if best.as_ref().map_or(true, |prev| distance_m < prev.distance_m) {
            best = Some(LineProjection {
                point: nearest.into(),
                segment_index,
                distance_m,
                distance_along_m: along_m + Haversine.distance(start, nearest),
            });
        }

        along_m += Haversine.distance(start, segment.end_point());
    }

    best
}

/// Distance from a position to the nearest point of a polyline.
///
/// A single-point line measures to that point; an empty line yields `None`.
pub fn distance_to_line(position: &Point, line: &[Point]) -> Option<f64> {
    match line {
        [] => None,
        [only] => Some(haversine(position, only)),
        _ => project_on_line(position, line).map(|p| p.distance_m),
    }
}

/// The part of `line` from a projection to the line's last point.
///
/// The projected point becomes the first coordinate of the returned slice.
pub fn slice_from_projection(line: &[Point], projection: &LineProjection) -> Vec<Point> {
    std::iter::once(projection.point)
        .chain(
            line.iter()
                .skip(projection.segment_index + 1)
                .filter(|p| **p != projection.point)
                .copied(),
        )
        .collect()
}
