use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{Coord, EuclideanDistance, Line, Point, Rect};

use crate::coords::{round_coord, to_f64};
use crate::hierarchy::PreparedRing;
use crate::tile::TileBounds;

/// Dense "ring `row` strictly contains ring `col`" relation over the rings of one
/// relation, plus a matrix of entries that are already decided.
#[derive(Clone, Debug)]
pub struct ContainmentMatrix {
    size: usize,
    contains: Vec<bool>,
    finished: Vec<bool>,
}

impl ContainmentMatrix {
    pub fn new(size: usize) -> Self {
        let mut finished = vec![false; size * size];
        for i in 0..size {
            finished[i * size + i] = true;
        }
        Self { size, contains: vec![false; size * size], finished }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    fn idx(&self, row: usize, col: usize) -> usize {
        row * self.size + col
    }

    #[inline]
    pub fn contains(&self, outer: usize, inner: usize) -> bool {
        self.contains[self.idx(outer, inner)]
    }

    #[inline]
    pub fn is_finished(&self, row: usize, col: usize) -> bool {
        self.finished[self.idx(row, col)]
    }

    pub fn mark_finished(&mut self, row: usize, col: usize) {
        let i = self.idx(row, col);
        self.finished[i] = true;
    }

    /// Records `outer ⊃ inner` and propagates it transitively.
    pub fn mark(&mut self, outer: usize, inner: usize) {
        self.set(outer, inner);
        self.propagate(outer, inner);
    }

    fn set(&mut self, outer: usize, inner: usize) {
        if outer == inner {
            return;
        }
        let i = self.idx(outer, inner);
        self.contains[i] = true;
        self.finished[i] = true;
        // a ring containing another cannot be contained by it
        let j = self.idx(inner, outer);
        self.finished[j] = true;
    }

    /// `outer` gains everything `inner` contains, and every ring containing `outer`
    /// gains `inner` together with its contents.
    pub fn propagate(&mut self, outer: usize, inner: usize) {
        let below: Vec<usize> = (0..self.size).filter(|&k| self.contains(inner, k)).collect();
        let above: Vec<usize> = (0..self.size).filter(|&x| self.contains(x, outer)).collect();

        for &k in &below {
            self.set(outer, k);
        }
        for &x in &above {
            self.set(x, inner);
            for &k in &below {
                self.set(x, k);
            }
        }
    }

    /// Rings directly or indirectly contained by `outer`.
    pub fn children(&self, outer: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.size).filter(move |&k| self.contains(outer, k))
    }

    /// The members of `candidates` not contained by any other member.
    pub fn outermost(&self, candidates: &[usize]) -> Vec<usize> {
        candidates
            .iter()
            .copied()
            .filter(|&i| !candidates.iter().any(|&j| j != i && self.contains(j, i)))
            .collect()
    }
}

/// Coarse 3x3 partition of a bounding box, used to skip edge pairs that are far apart
/// before the exact intersection test.
struct BucketGrid {
    min: Coord<f64>,
    width: f64,
    height: f64,
}

impl BucketGrid {
    fn new(bounds: Rect<f64>) -> Self {
        Self { min: bounds.min(), width: bounds.width(), height: bounds.height() }
    }

    fn cell(v: f64, min: f64, extent: f64) -> u32 {
        if extent <= 0.0 {
            return 0;
        }
        ((v - min) / extent * 3.0).floor().clamp(0.0, 2.0) as u32
    }

    /// Bit mask of the cells touched by the bounding box of `line`.
    fn mask(&self, line: &Line<f64>) -> u16 {
        let (x0, x1) = (line.start.x.min(line.end.x), line.start.x.max(line.end.x));
        let (y0, y1) = (line.start.y.min(line.end.y), line.start.y.max(line.end.y));
        let (c0, c1) = (Self::cell(x0, self.min.x, self.width), Self::cell(x1, self.min.x, self.width));
        let (r0, r1) = (Self::cell(y0, self.min.y, self.height), Self::cell(y1, self.min.y, self.height));
        let mut mask = 0u16;
        for r in r0..=r1 {
            for c in c0..=c1 {
                mask |= 1 << (r * 3 + c);
            }
        }
        mask
    }
}

/// Where two rings cross each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Crossing {
    pub inside_tile: bool,
}

/// Decides whether one ring contains another.
pub struct ContainmentTester {
    tile: TileBounds,
    tolerance: f64,
}

impl ContainmentTester {
    pub fn new(tile: TileBounds, tolerance: f64) -> Self {
        Self { tile, tolerance }
    }

    /// Does `a` strictly contain `b`?
    ///
    /// Crossings found on the way are reported to `crossings`. Crossings outside the
    /// tile do not prevent containment, they are usually caused by clipped input data.
    pub fn contains(
        &self,
        a: &PreparedRing,
        b: &PreparedRing,
        crossings: &mut Vec<Crossing>,
    ) -> bool {
        if !a.ring.is_closed() {
            return false;
        }
        let (ab, bb) = (a.bounds, b.bounds);
        if bb.min().x < ab.min().x
            || bb.min().y < ab.min().y
            || bb.max().x > ab.max().x
            || bb.max().y > ab.max().y
        {
            return false;
        }

        let mut inside = false;
        for &c in &b.coords {
            match self.locate(a, c) {
                Some(CoordPos::Inside) => inside = true,
                Some(CoordPos::Outside) => return false,
                _ => {}
            }
        }
        if !inside {
            // every point lies on the boundary, the edges decide
            for w in b.coords.windows(2) {
                let mid = Coord {
                    x: (w[0].x as f64 + w[1].x as f64) / 2.0,
                    y: (w[0].y as f64 + w[1].y as f64) / 2.0,
                };
                match a.polygon.coordinate_position(&mid) {
                    CoordPos::Inside => inside = true,
                    CoordPos::Outside
                        if self.tile.contains(round_coord(mid)) && self.is_decisive(a, mid) =>
                    {
                        return false
                    }
                    _ => {}
                }
            }
            if !inside {
                return false;
            }
        }

        let mut contained = true;
        for crossing in self.crossings(a, b) {
            crossings.push(crossing);
            if crossing.inside_tile {
                contained = false;
            }
        }
        contained
    }

    /// Classifies a point of the inner candidate. `Outside` is only returned when the
    /// point is inside the tile and clearly away from the boundary of `a`.
    fn locate(&self, a: &PreparedRing, c: Coord<i32>) -> Option<CoordPos> {
        let p = to_f64(c);
        match a.polygon.coordinate_position(&p) {
            CoordPos::Outside => {
                if self.tile.contains(c) && self.is_decisive(a, p) {
                    Some(CoordPos::Outside)
                } else {
                    None
                }
            }
            pos => Some(pos),
        }
    }

    fn is_decisive(&self, a: &PreparedRing, p: Coord<f64>) -> bool {
        Point::from(p).euclidean_distance(a.polygon.exterior()) > self.tolerance
    }

    /// Proper crossings between the edges of two rings.
    ///
    /// Synthetic edges are ignored, and so are crossings of an edge whose end point lies
    /// within the tolerance of the other ring's boundary. A crossing counts as outside
    /// the tile when one of the two edges has both end points outside it.
    pub fn crossings(&self, a: &PreparedRing, b: &PreparedRing) -> Vec<Crossing> {
        let bounds = Rect::new(
            Coord {
                x: a.bounds.min().x.min(b.bounds.min().x) as f64,
                y: a.bounds.min().y.min(b.bounds.min().y) as f64,
            },
            Coord {
                x: a.bounds.max().x.max(b.bounds.max().x) as f64,
                y: a.bounds.max().y.max(b.bounds.max().y) as f64,
            },
        );
        let grid = BucketGrid::new(bounds);
        let edges_a = edges(a, &grid);
        let edges_b = edges(b, &grid);

        let mut found = Vec::new();
        for &(line_b, mask_b, artificial_b) in &edges_b {
            if artificial_b {
                continue;
            }
            for &(line_a, mask_a, artificial_a) in &edges_a {
                if artificial_a || mask_a & mask_b == 0 {
                    continue;
                }
                let Some(LineIntersection::SinglePoint { is_proper: true, .. }) =
                    line_intersection(line_a, line_b)
                else {
                    continue;
                };
                if self.touches(&line_b, a) || self.touches(&line_a, b) {
                    continue;
                }
                found.push(Crossing {
                    inside_tile: !self.outside_tile(&line_a) && !self.outside_tile(&line_b),
                });
            }
        }
        found
    }

    /// An end point of `line` is within the tolerance of the boundary of `ring`.
    fn touches(&self, line: &Line<f64>, ring: &PreparedRing) -> bool {
        [line.start, line.end].into_iter().any(|p| !self.is_decisive(ring, p))
    }

    fn outside_tile(&self, line: &Line<f64>) -> bool {
        !self.tile.inside(round_coord(line.start)) && !self.tile.inside(round_coord(line.end))
    }
}

fn edges(ring: &PreparedRing, grid: &BucketGrid) -> Vec<(Line<f64>, u16, bool)> {
    let points = ring.ring.points();
    points
        .windows(2)
        .zip(ring.coords.windows(2))
        .map(|(ids, cs)| {
            let line = Line::new(to_f64(cs[0]), to_f64(cs[1]));
            (line, grid.mask(&line), ring.ring.is_artificial_edge(ids[0], ids[1]))
        })
        .collect()
}
