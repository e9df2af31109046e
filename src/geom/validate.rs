use ahash::AHashSet;
use geo::{
    line_intersection::{line_intersection, LineIntersection},
    orient::{Direction, Orient},
    Area, BoundingRect, Coord, Intersects, Line, LineString, MultiPolygon, Polygon, Rect, Relate,
};
use rstar::{RTree, RTreeObject, AABB};

use crate::{error::GeometryError, geom::bbox::envelope};

/// A validated, orientation-normalized geometry and its cached area.
#[derive(Debug, Clone)]
pub(crate) struct Prepared {
    pub(crate) geometry: MultiPolygon<f64>,
    pub(crate) area: f64,
}

/// Validate `geometry` and normalize it so exteriors wind counter-clockwise
/// and holes clockwise, which makes every polygon's signed area its true area.
///
/// With `allow_zero_area`, a geometry with no polygons or whose exterior
/// rings are all collinear is returned with `area == 0` instead of failing;
/// topology checks are skipped for it since it cannot hold any overlap.
pub(crate) fn prepare(geometry: &MultiPolygon<f64>, allow_zero_area: bool) -> Result<Prepared, GeometryError> {
    if geometry.0.is_empty() {
        return if allow_zero_area {
            Ok(Prepared { geometry: MultiPolygon(Vec::new()), area: 0.0 })
        } else {
            Err(GeometryError::Empty)
        };
    }

    let mut polygons = Vec::with_capacity(geometry.0.len());
    for (p, polygon) in geometry.0.iter().enumerate() {
        polygons.push(clean_polygon(p, polygon)?);
    }
    let normalized = MultiPolygon(polygons).orient(Direction::Default);

    if allow_zero_area && normalized.0.iter().all(|polygon| is_collinear(polygon.exterior())) {
        return Ok(Prepared { geometry: normalized, area: 0.0 });
    }

    let areas: Vec<f64> = normalized.0.iter().map(|polygon| polygon.signed_area()).collect();

    for (p, polygon) in normalized.0.iter().enumerate() {
        check_holes_inside(p, polygon)?;
        check_simple(p, polygon)?;
        check_holes_disjoint(p, polygon)?;
        if !(areas[p] > 0.0) {
            return Err(GeometryError::NonPositiveArea { polygon: p, area: areas[p] });
        }
    }

    // Overlapping parts would count the shared area twice.
    if let Some((_, second, at)) = first_overlap(&normalized.0) {
        return Err(GeometryError::SelfIntersection { polygon: second, x: at.x, y: at.y });
    }

    Ok(Prepared { area: areas.iter().sum(), geometry: normalized })
}

/// Reject non-finite coordinates, drop repeated vertices, close every ring
/// and make sure each ring still has at least three distinct vertices.
fn clean_polygon(p: usize, polygon: &Polygon<f64>) -> Result<Polygon<f64>, GeometryError> {
    let exterior = clean_ring(p, 0, polygon.exterior())?;
    let interiors = polygon.interiors().iter().enumerate()
        .map(|(r, ring)| clean_ring(p, r + 1, ring))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn clean_ring(p: usize, r: usize, ring: &LineString<f64>) -> Result<LineString<f64>, GeometryError> {
    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len() + 1);
    for &c in &ring.0 {
        if !(c.x.is_finite() && c.y.is_finite()) {
            return Err(GeometryError::NonFiniteCoordinate { polygon: p, x: c.x, y: c.y });
        }
        if coords.last() != Some(&c) { coords.push(c) }
    }
    // Ring closure is handled below; drop the explicit closing vertex for now.
    while coords.len() > 1 && coords.first() == coords.last() { coords.pop(); }

    // Normalize -0.0 so that it hashes like 0.0.
    let distinct = coords.iter()
        .map(|c| ((c.x + 0.0).to_bits(), (c.y + 0.0).to_bits()))
        .collect::<AHashSet<_>>()
        .len();
    if distinct < 3 {
        return Err(GeometryError::TooFewVertices { polygon: p, ring: r, distinct });
    }

    coords.push(coords[0]);
    Ok(LineString(coords))
}

/// True if every vertex of the ring lies on one line.
fn is_collinear(ring: &LineString<f64>) -> bool {
    let Some(&a) = ring.0.first() else { return true };
    let Some(&b) = ring.0.iter().find(|&&c| c != a) else { return true };
    ring.0.iter().all(|c| (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x) == 0.0)
}

/// Every hole must lie inside (or on) its exterior ring.
fn check_holes_inside(p: usize, polygon: &Polygon<f64>) -> Result<(), GeometryError> {
    if polygon.interiors().is_empty() { return Ok(()) }
    let shell = Polygon::new(polygon.exterior().clone(), Vec::new());
    for (r, hole) in polygon.interiors().iter().enumerate() {
        if !hole.0.iter().all(|c| shell.intersects(c)) {
            return Err(GeometryError::HoleOutsideShell { polygon: p, ring: r + 1 });
        }
    }
    Ok(())
}

/// No hole may lie inside or overlap another hole of the same polygon.
fn check_holes_disjoint(p: usize, polygon: &Polygon<f64>) -> Result<(), GeometryError> {
    if polygon.interiors().len() < 2 { return Ok(()) }
    let holes: Vec<Polygon<f64>> = polygon.interiors().iter()
        .map(|ring| Polygon::new(ring.clone(), Vec::new()))
        .collect();
    match first_overlap(&holes) {
        Some((first, second, _)) => Err(GeometryError::OverlappingHoles { polygon: p, ring: first + 1, other: second + 1 }),
        None => Ok(()),
    }
}

/// A polygon's bounding box in an R-tree, tagged with its position.
#[derive(Debug, Clone, Copy)]
struct Part {
    idx: usize,
    bbox: Rect<f64>,
}

impl RTreeObject for Part {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope { envelope(&self.bbox) }
}

/// First pair `(i, j)`, `i < j`, of polygons sharing interior area, with a
/// point near the overlap. Contact along an edge or at a point is allowed.
fn first_overlap(polygons: &[Polygon<f64>]) -> Option<(usize, usize, Coord<f64>)> {
    if polygons.len() < 2 { return None }
    let parts: Vec<Part> = polygons.iter().enumerate()
        .filter_map(|(idx, polygon)| polygon.bounding_rect().map(|bbox| Part { idx, bbox }))
        .collect();
    let rtree = RTree::bulk_load(parts.clone());

    for a in &parts {
        let hit = rtree.locate_in_envelope_intersecting(&a.envelope())
            .filter(|b| b.idx > a.idx)
            .filter(|b| {
                let im = polygons[a.idx].relate(&polygons[b.idx]);
                im.is_intersects() && !im.is_touches()
            })
            .min_by_key(|b| b.idx);
        if let Some(b) = hit {
            let at = Coord { x: a.bbox.min().x.max(b.bbox.min().x), y: a.bbox.min().y.max(b.bbox.min().y) };
            return Some((a.idx, b.idx, at));
        }
    }
    None
}

/// A ring segment in an R-tree, tagged with its ring and position.
#[derive(Debug, Clone, Copy)]
struct Segment {
    ring: usize,
    pos: usize,
    len: usize, // number of segments in the ring
    line: Line<f64>,
}

impl Segment {
    /// Consecutive segments of one ring share a vertex by construction.
    fn is_adjacent(&self, other: &Segment) -> bool {
        self.ring == other.ring && (
            (self.pos + 1) % self.len == other.pos || (other.pos + 1) % other.len == self.pos
        )
    }
}

impl RTreeObject for Segment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.line.start.into(), self.line.end.into())
    }
}

/// Reject polygons whose rings cross themselves or each other.
///
/// Allowed contacts are the shared vertex of consecutive segments and a hole
/// touching another ring at a single point. Everything else (a crossing, a
/// ring touching itself, two rings overlapping along an edge) is an error.
fn check_simple(p: usize, polygon: &Polygon<f64>) -> Result<(), GeometryError> {
    let segments: Vec<Segment> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .enumerate()
        .flat_map(|(ring, ls)| {
            let len = ls.0.len().saturating_sub(1);
            ls.lines().enumerate().map(move |(pos, line)| Segment { ring, pos, len, line })
        })
        .collect();

    let rtree = RTree::bulk_load(segments.clone());

    for a in &segments {
        for b in rtree.locate_in_envelope_intersecting(&a.envelope()) {
            if (b.ring, b.pos) <= (a.ring, a.pos) { continue } // check each unordered pair once

            let Some(hit) = line_intersection(a.line, b.line) else { continue };
            let bad = match hit {
                LineIntersection::Collinear { intersection } => Some(intersection.start),
                LineIntersection::SinglePoint { intersection, is_proper } => {
                    if a.is_adjacent(b) { None }
                    else if a.ring == b.ring || is_proper { Some(intersection) }
                    else { None }
                }
            };
            if let Some(at) = bad {
                return Err(GeometryError::SelfIntersection { polygon: p, x: at.x, y: at.y });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use geo::{polygon, Area};

    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Polygon<f64> {
        polygon![(x: x, y: y), (x: x + size, y: y), (x: x + size, y: y + size), (x: x, y: y + size)]
    }

    #[test]
    fn clockwise_square_is_reoriented() {
        let cw = polygon![(x: 0.0, y: 0.0), (x: 0.0, y: 2.0), (x: 2.0, y: 2.0), (x: 2.0, y: 0.0)];
        assert!(cw.signed_area() < 0.0);

        let prepared = prepare(&MultiPolygon(vec![cw]), false).unwrap();
        assert_eq!(prepared.area, 4.0);
        assert!(prepared.geometry.signed_area() > 0.0);
    }

    #[test]
    fn hole_is_subtracted() {
        let with_hole = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0)],
            interiors: [[(x: 1.0, y: 1.0), (x: 2.0, y: 1.0), (x: 2.0, y: 2.0), (x: 1.0, y: 2.0)]],
        );
        let prepared = prepare(&MultiPolygon(vec![with_hole]), false).unwrap();
        assert_eq!(prepared.area, 15.0);
    }

    #[test]
    fn repeated_vertices_are_dropped() {
        let dup = polygon![
            (x: 0.0, y: 0.0), (x: 0.0, y: 0.0), (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0),
        ];
        let prepared = prepare(&MultiPolygon(vec![dup]), false).unwrap();
        assert_eq!(prepared.geometry.0[0].exterior().0.len(), 5);
        assert_eq!(prepared.area, 1.0);
    }

    #[test]
    fn bow_tie_is_self_intersecting() {
        let bow_tie = polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 2.0), (x: 2.0, y: 0.0), (x: 0.0, y: 2.0)];
        let err = prepare(&MultiPolygon(vec![bow_tie]), false).unwrap_err();
        assert!(matches!(err, GeometryError::SelfIntersection { polygon: 0, .. }), "{err:?}");
    }

    #[test]
    fn ring_touching_itself_is_self_intersecting() {
        // The vertex (2, 0) is visited twice.
        let pinched = polygon![
            (x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 3.0, y: 1.0), (x: 4.0, y: 0.0),
            (x: 4.0, y: 2.0), (x: 2.0, y: 0.0), (x: 0.0, y: 2.0),
        ];
        let err = prepare(&MultiPolygon(vec![pinched]), false).unwrap_err();
        assert!(matches!(err, GeometryError::SelfIntersection { .. }), "{err:?}");
    }

    #[test]
    fn two_distinct_vertices_is_too_few() {
        let sliver = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 0.0)];
        let err = prepare(&MultiPolygon(vec![sliver]), true).unwrap_err();
        assert_eq!(err, GeometryError::TooFewVertices { polygon: 0, ring: 0, distinct: 2 });
    }

    #[test]
    fn nan_is_rejected() {
        let bad = polygon![(x: 0.0, y: 0.0), (x: f64::NAN, y: 0.0), (x: 1.0, y: 1.0)];
        let err = prepare(&MultiPolygon(vec![bad]), false).unwrap_err();
        assert!(matches!(err, GeometryError::NonFiniteCoordinate { polygon: 0, .. }));
    }

    #[test]
    fn collinear_ring_is_zero_area() {
        let flat = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 2.0, y: 0.0)];
        let mp = MultiPolygon(vec![flat]);

        let zone = prepare(&mp, true).unwrap();
        assert_eq!(zone.area, 0.0);

        assert!(prepare(&mp, false).is_err());
    }

    #[test]
    fn bow_tie_zone_is_not_degenerate() {
        let bow_tie = polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 2.0), (x: 2.0, y: 0.0), (x: 0.0, y: 2.0)];
        assert!(prepare(&MultiPolygon(vec![bow_tie]), true).is_err());
    }

    #[test]
    fn empty_geometry() {
        let empty = MultiPolygon::<f64>(Vec::new());
        assert_eq!(prepare(&empty, true).unwrap().area, 0.0);
        assert_eq!(prepare(&empty, false).unwrap_err(), GeometryError::Empty);
    }

    #[test]
    fn hole_outside_shell() {
        let stray = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0)],
            interiors: [[(x: 5.0, y: 5.0), (x: 6.0, y: 5.0), (x: 6.0, y: 6.0)]],
        );
        let err = prepare(&MultiPolygon(vec![stray]), false).unwrap_err();
        assert_eq!(err, GeometryError::HoleOutsideShell { polygon: 0, ring: 1 });
    }

    #[test]
    fn hole_crossing_shell() {
        let crossing = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0)],
            interiors: [[(x: 1.0, y: 1.0), (x: 3.0, y: 1.0), (x: 3.0, y: 5.0), (x: 1.0, y: 3.0)]],
        );
        assert!(prepare(&MultiPolygon(vec![crossing]), false).is_err());
    }

    #[test]
    fn hole_touching_shell_at_a_point_is_allowed() {
        let touching = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0)],
            interiors: [[(x: 0.0, y: 2.0), (x: 2.0, y: 1.0), (x: 2.0, y: 3.0)]],
        );
        let prepared = prepare(&MultiPolygon(vec![touching]), false).unwrap();
        assert_eq!(prepared.area, 14.0);
    }

    #[test]
    fn overlapping_parts_are_self_intersecting() {
        let parts = MultiPolygon(vec![square(0.0, 0.0, 2.0), square(1.0, 1.0, 2.0)]);
        let err = prepare(&parts, false).unwrap_err();
        assert!(matches!(err, GeometryError::SelfIntersection { polygon: 1, .. }), "{err:?}");
        assert!(prepare(&parts, true).is_err());
    }

    #[test]
    fn nested_part_is_self_intersecting() {
        let parts = MultiPolygon(vec![square(0.0, 0.0, 4.0), square(1.0, 1.0, 1.0)]);
        assert!(matches!(prepare(&parts, false), Err(GeometryError::SelfIntersection { .. })));
    }

    #[test]
    fn parts_sharing_an_edge_are_allowed() {
        let parts = MultiPolygon(vec![square(0.0, 0.0, 1.0), square(1.0, 0.0, 1.0), square(2.0, 1.0, 1.0)]);
        assert_eq!(prepare(&parts, false).unwrap().area, 3.0);
    }

    #[test]
    fn hole_inside_another_hole() {
        let nested = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            interiors: [
                [(x: 1.0, y: 1.0), (x: 9.0, y: 1.0), (x: 9.0, y: 9.0), (x: 1.0, y: 9.0)],
                [(x: 3.0, y: 3.0), (x: 5.0, y: 3.0), (x: 5.0, y: 5.0), (x: 3.0, y: 5.0)],
            ],
        );
        let err = prepare(&MultiPolygon(vec![nested]), false).unwrap_err();
        assert_eq!(err, GeometryError::OverlappingHoles { polygon: 0, ring: 1, other: 2 });
    }

    #[test]
    fn holes_touching_at_a_point_are_allowed() {
        let holes = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            interiors: [
                [(x: 1.0, y: 1.0), (x: 3.0, y: 1.0), (x: 3.0, y: 3.0), (x: 1.0, y: 3.0)],
                [(x: 3.0, y: 3.0), (x: 5.0, y: 4.0), (x: 4.0, y: 5.0)],
            ],
        );
        assert_eq!(prepare(&MultiPolygon(vec![holes]), false).unwrap().area, 94.5);
    }

    #[test]
    fn hole_covering_shell_is_non_positive() {
        let same = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)],
            interiors: [[(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)]],
        );
        assert!(prepare(&MultiPolygon(vec![same]), false).is_err());
    }
}
