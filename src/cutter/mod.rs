//! Turns an outer ring with holes into simple polygons without holes.
//!
//! Renderers downstream only understand single contours. Holes are opened by cutting
//! the outer area along axis-parallel lines running through them, see
//! [`cut_point`] for how the lines are chosen.

pub mod cut_point;


use std::collections::VecDeque;

use geo::{Area, BooleanOps, BoundingRect, Coord, LineString, MultiPolygon, Polygon, Rect};
use log::debug;

use crate::coords::round_coord;

pub use cut_point::{Axis, CutPoint};

/// Holes overlapping the outer area by less than this are ignored.
const MIN_OVERLAP_AREA: f64 = 1e-6;

struct Hole {
    polygon: Polygon<f64>,
    bounds: Rect<f64>,
}

/// An outer area together with the holes not yet cut out of it.
struct CutRegion {
    area: Polygon<f64>,
    bounds: Rect<f64>,
    /// Indices into the hole list of the current cut.
    holes: Vec<usize>,
    depth: usize,
}

#[derive(Debug, Default)]
pub struct CutOutput {
    /// Closed contours in high precision units.
    pub contours: Vec<LineString<i32>>,
    /// Some area was emitted without all of its holes after too many cuts.
    pub depth_exceeded: bool,
}

impl CutOutput {
    fn emit(&mut self, exterior: &LineString<f64>) {
        let mut points: Vec<Coord<i32>> = Vec::with_capacity(exterior.0.len());
        for &c in &exterior.0 {
            let c = round_coord(c);
            if points.last() != Some(&c) {
                points.push(c);
            }
        }
        if points.len() > 1 && points.first() != points.last() {
            points.push(points[0]);
        }
        if points.len() >= 4 {
            self.contours.push(LineString::new(points));
        }
    }
}

pub struct RingCutter {
    clip: Option<Rect<f64>>,
    max_depth: usize,
}

impl RingCutter {
    pub fn new(max_depth: usize) -> Self {
        Self { clip: None, max_depth }
    }

    /// Outer areas reaching beyond `clip` are clipped to it before holes are cut.
    pub fn with_clip(mut self, clip: Rect<f64>) -> Self {
        self.clip = Some(clip);
        self
    }

    /// Cuts `holes` out of `outer`.
    ///
    /// Without holes overlapping the outer area the exterior of `outer` is returned
    /// point for point.
    pub fn cut(&self, outer: &Polygon<f64>, holes: &[&Polygon<f64>]) -> CutOutput {
        let mut out = CutOutput::default();
        let Some(outer_bounds) = outer.bounding_rect() else {
            return out;
        };
        let outer_area = MultiPolygon::new(vec![outer.clone()]);

        let mut all: Vec<Hole> = holes
            .iter()
            .filter_map(|&h| {
                let bounds = h.bounding_rect()?;
                if !overlaps(&bounds, &outer_bounds) {
                    return None;
                }
                let overlap =
                    outer_area.intersection(&MultiPolygon::new(vec![h.clone()])).unsigned_area();
                (overlap > MIN_OVERLAP_AREA).then(|| Hole { polygon: h.clone(), bounds })
            })
            .collect();

        if all.is_empty() {
            out.contours.push(outer.exterior().0.iter().map(|&c| round_coord(c)).collect());
            return out;
        }

        let mut area = outer_area;
        if let Some(clip) = self.clip {
            if !within(&outer_bounds, &clip) {
                debug!("clipping outer area to {:?}", clip);
                area = area.intersection(&MultiPolygon::new(vec![clip.to_polygon()]));
            }
        }

        let indices: Vec<usize> = (0..all.len()).collect();
        let mut queue: VecDeque<CutRegion> =
            area.into_iter().filter_map(|p| region(p, &indices, &all, 0)).collect();

        let mut cuts = 0usize;
        while let Some(mut current) = queue.pop_front() {
            if current.holes.is_empty() {
                if current.area.interiors().is_empty() {
                    out.emit(current.area.exterior());
                    continue;
                }
                // the boolean operations left holes behind, cut them out as well
                let (exterior, interiors) = current.area.into_inner();
                for ring in interiors {
                    let polygon = Polygon::new(ring, vec![]);
                    if let Some(bounds) = polygon.bounding_rect() {
                        all.push(Hole { polygon, bounds });
                        current.holes.push(all.len() - 1);
                    }
                }
                current.area = Polygon::new(exterior, vec![]);
            }

            if current.depth > self.max_depth {
                out.depth_exceeded = true;
                out.emit(current.area.exterior());
                continue;
            }

            let rects: Vec<Rect<f64>> = current.holes.iter().map(|&i| all[i].bounds).collect();
            let Some(cut) = CutPoint::best(&current.bounds, &rects) else {
                out.emit(current.area.exterior());
                continue;
            };
            cuts += 1;

            let resolved: Vec<usize> = cut.holes.iter().map(|&k| current.holes[k]).collect();
            let remaining: Vec<usize> =
                current.holes.iter().copied().filter(|i| !resolved.contains(i)).collect();
            let rest = MultiPolygon::new(vec![current.area]).difference(&union(&all, &resolved));

            if rest.0.iter().all(|p| p.interiors().is_empty()) {
                for polygon in rest {
                    if remaining.is_empty() {
                        out.emit(polygon.exterior());
                    } else if let Some(r) = region(polygon, &remaining, &all, current.depth + 1) {
                        queue.push_back(r);
                    }
                }
                continue;
            }

            // a hole touching the boundary in single points stays closed, splitting at
            // the boundary would leave the region as it is
            let cut = if cut.at_boundary {
                let opened: Vec<Rect<f64>> = resolved.iter().map(|&i| all[i].bounds).collect();
                CutPoint::best_inside(&current.bounds, &opened).unwrap_or(cut)
            } else {
                cut
            };
            for half in cut.halves(&current.bounds) {
                let piece = rest.intersection(&MultiPolygon::new(vec![half.to_polygon()]));
                for polygon in piece {
                    if let Some(r) = region(polygon, &remaining, &all, current.depth + 1) {
                        queue.push_back(r);
                    }
                }
            }
        }
        debug!("{} holes cut out with {} cuts into {} contours", all.len(), cuts, out.contours.len());
        out
    }
}

fn region(area: Polygon<f64>, candidates: &[usize], all: &[Hole], depth: usize) -> Option<CutRegion> {
    let bounds = area.bounding_rect()?;
    if area.unsigned_area() <= MIN_OVERLAP_AREA {
        return None;
    }
    let holes = candidates.iter().copied().filter(|&i| overlaps(&all[i].bounds, &bounds)).collect();
    Some(CutRegion { area, bounds, holes, depth })
}

fn union(all: &[Hole], indices: &[usize]) -> MultiPolygon<f64> {
    let mut iter = indices.iter().map(|&i| MultiPolygon::new(vec![all[i].polygon.clone()]));
    let first = iter.next().unwrap_or_else(|| MultiPolygon::new(vec![]));
    iter.fold(first, |acc, hole| acc.union(&hole))
}

/// Bounding boxes overlapping with positive area.
fn overlaps(a: &Rect<f64>, b: &Rect<f64>) -> bool {
    a.min().x < b.max().x && b.min().x < a.max().x && a.min().y < b.max().y && b.min().y < a.max().y
}

fn within(inner: &Rect<f64>, outer: &Rect<f64>) -> bool {
    inner.min().x >= outer.min().x
        && inner.min().y >= outer.min().y
        && inner.max().x <= outer.max().x
        && inner.max().y <= outer.max().y
}
