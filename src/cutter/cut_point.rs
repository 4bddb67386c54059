//! Choosing where to split an area so that a group of holes opens up.

use std::cmp::Ordering;

use geo::{Coord, Rect};

/// Cuts prefer coordinates on a grid of `1 << COARSE_GRID_SHIFT` units so that
/// neighbouring areas are split along the same lines.
pub const COARSE_GRID_SHIFT: u32 = 12;

/// A half narrower than this fraction of the mean hole extent is a sliver.
pub const SLIVER_FRACTION: f64 = 0.25;

const ASPECT_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn range(self, rect: &Rect<f64>) -> (f64, f64) {
        match self {
            Axis::X => (rect.min().x, rect.max().x),
            Axis::Y => (rect.min().y, rect.max().y),
        }
    }

    pub fn other(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

/// A candidate cut line together with the holes it opens.
#[derive(Clone, Debug)]
pub struct CutPoint {
    pub axis: Axis,
    pub coord: f64,
    /// Indices into the hole list the cut point was computed from.
    pub holes: Vec<usize>,
    pub at_boundary: bool,
    bad: bool,
    min_aspect: f64,
    on_grid: bool,
    extent: f64,
}

impl CutPoint {
    /// The best cut over both axes for an area with bounds `area` and holes with
    /// bounds `holes`. `None` only when `holes` is empty.
    pub fn best(area: &Rect<f64>, holes: &[Rect<f64>]) -> Option<CutPoint> {
        Self::pick(area, holes, true)
    }

    /// Like [`CutPoint::best`], restricted to cuts running through the inside of the area.
    pub fn best_inside(area: &Rect<f64>, holes: &[Rect<f64>]) -> Option<CutPoint> {
        Self::pick(area, holes, false)
    }

    fn pick(area: &Rect<f64>, holes: &[Rect<f64>], boundary: bool) -> Option<CutPoint> {
        if holes.is_empty() {
            return None;
        }
        let mut best: Option<CutPoint> = None;
        for axis in [Axis::X, Axis::Y] {
            for candidate in candidates(axis, area, holes) {
                if candidate.at_boundary && !boundary {
                    continue;
                }
                if best.as_ref().map_or(true, |b| candidate.is_better_than(b)) {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    pub fn is_better_than(&self, other: &CutPoint) -> bool {
        self.rank(other) == Ordering::Greater
    }

    fn rank(&self, other: &CutPoint) -> Ordering {
        self.at_boundary
            .cmp(&other.at_boundary)
            .then((!self.bad).cmp(&!other.bad))
            .then_with(|| {
                if (self.min_aspect - other.min_aspect).abs() <= ASPECT_EPSILON {
                    Ordering::Equal
                } else {
                    self.min_aspect.total_cmp(&other.min_aspect)
                }
            })
            .then(self.on_grid.cmp(&other.on_grid))
            .then_with(|| self.extent.total_cmp(&other.extent))
            .then(self.holes.len().cmp(&other.holes.len()))
    }

    /// Two rectangles covering `area` on either side of the cut line.
    pub fn halves(&self, area: &Rect<f64>) -> [Rect<f64>; 2] {
        let (min, max) = (area.min(), area.max());
        let pad = 1.0;
        match self.axis {
            Axis::X => [
                Rect::new(
                    Coord { x: min.x - pad, y: min.y - pad },
                    Coord { x: self.coord, y: max.y + pad },
                ),
                Rect::new(
                    Coord { x: self.coord, y: min.y - pad },
                    Coord { x: max.x + pad, y: max.y + pad },
                ),
            ],
            Axis::Y => [
                Rect::new(
                    Coord { x: min.x - pad, y: min.y - pad },
                    Coord { x: max.x + pad, y: self.coord },
                ),
                Rect::new(
                    Coord { x: min.x - pad, y: self.coord },
                    Coord { x: max.x + pad, y: max.y + pad },
                ),
            ],
        }
    }
}

fn aspect(a: f64, b: f64) -> f64 {
    if a <= 0.0 || b <= 0.0 {
        0.0
    } else {
        a.min(b) / a.max(b)
    }
}

fn on_coarse_grid(c: f64) -> bool {
    c.fract() == 0.0 && (c as i64) % (1i64 << COARSE_GRID_SHIFT) == 0
}

/// All cut candidates on one axis: holes reaching the area boundary on either side,
/// and groups of holes whose ranges on the axis have a common overlap.
fn candidates(axis: Axis, area: &Rect<f64>, holes: &[Rect<f64>]) -> Vec<CutPoint> {
    let (lo, hi) = axis.range(area);
    let (olo, ohi) = axis.other().range(area);
    let frame = Frame {
        axis,
        lo,
        hi,
        other_extent: ohi - olo,
        mean_hole: holes
            .iter()
            .map(|h| {
                let (s, e) = axis.range(h);
                e - s
            })
            .sum::<f64>()
            / holes.len() as f64,
    };

    let mut out = Vec::new();
    let low: Vec<usize> = (0..holes.len()).filter(|&i| axis.range(&holes[i]).0 <= lo).collect();
    if !low.is_empty() {
        out.push(frame.boundary(lo, low));
    }
    let high: Vec<usize> = (0..holes.len()).filter(|&i| axis.range(&holes[i]).1 >= hi).collect();
    if !high.is_empty() {
        out.push(frame.boundary(hi, high));
    }

    let mut order: Vec<usize> = (0..holes.len()).collect();
    order.sort_by(|&a, &b| axis.range(&holes[a]).0.total_cmp(&axis.range(&holes[b]).0));

    let mut group: Vec<usize> = Vec::new();
    let (mut start, mut stop) = (f64::NEG_INFINITY, f64::INFINITY);
    for i in order {
        let (s, e) = axis.range(&holes[i]);
        if !group.is_empty() && s > stop {
            out.extend(frame.split(start, stop, std::mem::take(&mut group)));
            stop = f64::INFINITY;
        }
        group.push(i);
        start = s;
        stop = stop.min(e);
    }
    if !group.is_empty() {
        out.extend(frame.split(start, stop, group));
    }
    out
}

/// The area and hole statistics of one axis.
struct Frame {
    axis: Axis,
    lo: f64,
    hi: f64,
    other_extent: f64,
    mean_hole: f64,
}

impl Frame {
    fn boundary(&self, coord: f64, holes: Vec<usize>) -> CutPoint {
        CutPoint {
            axis: self.axis,
            coord,
            holes,
            at_boundary: true,
            bad: false,
            min_aspect: aspect(self.hi - self.lo, self.other_extent),
            on_grid: on_coarse_grid(coord),
            extent: self.hi - self.lo,
        }
    }

    /// A cut through the common overlap `[start, stop]` of a group of holes.
    fn split(&self, start: f64, stop: f64, holes: Vec<usize>) -> Option<CutPoint> {
        let a = start.max(self.lo);
        let b = stop.min(self.hi);
        let (coord, on_grid) = self.choose(a, b)?;
        let lower = coord - self.lo;
        let upper = self.hi - coord;
        Some(CutPoint {
            axis: self.axis,
            coord,
            holes,
            at_boundary: false,
            bad: lower.min(upper) < SLIVER_FRACTION * self.mean_hole,
            min_aspect: aspect(lower, self.other_extent).min(aspect(upper, self.other_extent)),
            on_grid,
            extent: self.hi - self.lo,
        })
    }

    /// The coordinate closest to the middle of `[a, b]` on the coarsest grid that has
    /// one strictly inside both the window and the area.
    fn choose(&self, a: f64, b: f64) -> Option<(f64, bool)> {
        let inside = |c: f64| {
            let in_window = if a < b { c > a && c < b } else { c == a };
            in_window && c > self.lo && c < self.hi
        };
        let mid = (a + b) / 2.0;
        for shift in (0..=COARSE_GRID_SHIFT).rev() {
            let step = (1u32 << shift) as f64;
            let c = (mid / step).round() * step;
            if inside(c) {
                return Some((c, shift == COARSE_GRID_SHIFT));
            }
        }
        // no whole unit strictly inside the window, cut along one of its ends
        for c in [a.ceil(), b.floor()] {
            if c >= a && c <= b && c > self.lo && c < self.hi {
                return Some((c, on_coarse_grid(c)));
            }
        }
        inside(mid).then_some((mid, false))
    }
}
