//! Nesting of closed rings: which ring contains which, and which rings form an outer
//! polygon together with its holes.

pub mod containment;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, VecDeque};

use geo::{Area, Coord, Polygon, Rect};
use log::debug;
use rstar::{RTree, RTreeObject, AABB};

use crate::coords::CoordArena;
use crate::diagnostics::{Diagnostic, Diagnostics, UnresolvedCause};
use crate::element::{MemberWay, Role, WayId};
use crate::ring::Ring;
use crate::tile::TileBounds;

pub use containment::{ContainmentMatrix, ContainmentTester, Crossing};

/// A closed ring with everything the containment tests need, computed once.
#[derive(Clone, Debug)]
pub struct PreparedRing {
    pub ring: Ring,
    pub coords: Vec<Coord<i32>>,
    pub bounds: Rect<i32>,
    pub polygon: Polygon<f64>,
    pub area: f64,
}

impl PreparedRing {
    pub fn new(ring: Ring, arena: &CoordArena) -> Self {
        let coords: Vec<Coord<i32>> = ring.coords(arena).collect();
        let bounds = ring.bounds(arena);
        let polygon = ring.to_polygon(arena);
        let area = polygon.unsigned_area();
        Self { ring, coords, bounds, polygon, area }
    }

    pub fn role(&self) -> Role {
        self.ring.role()
    }
}

/// One pending unit of work of the hierarchy walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PolygonGroup {
    pub index: usize,
    pub outer: bool,
}

/// An outer ring and the rings directly nested in it.
#[derive(Clone, Debug, PartialEq)]
pub struct OuterGroup {
    pub outer: usize,
    pub holes: Vec<usize>,
    /// Area of the outer ring minus the areas of its holes.
    pub area: f64,
}

/// The containment matrix together with the crossings found while building it.
#[derive(Clone, Debug)]
pub struct Containment {
    pub matrix: ContainmentMatrix,
    /// Rings involved in any crossing.
    pub intersecting: Vec<bool>,
    /// Rings crossing their would-be container inside the tile, kept out of the walk.
    pub offending: Vec<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct Hierarchy {
    pub groups: Vec<OuterGroup>,
    /// Index into `groups` of the group with the largest area.
    pub largest: Option<usize>,
    /// Rings dropped as anomalies or never reached by the walk.
    pub excluded: Vec<usize>,
    pub no_outer: bool,
}

struct IndexedRing {
    index: usize,
    envelope: AABB<[i32; 2]>,
}

impl RTreeObject for IndexedRing {
    type Envelope = AABB<[i32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

pub struct HierarchyResolver<'a> {
    rings: &'a [PreparedRing],
    members: &'a [MemberWay],
    tester: ContainmentTester,
}

impl<'a> HierarchyResolver<'a> {
    pub fn new(
        rings: &'a [PreparedRing],
        members: &'a [MemberWay],
        tile: TileBounds,
        tolerance: f64,
    ) -> Self {
        Self { rings, members, tester: ContainmentTester::new(tile, tolerance) }
    }

    fn ways(&self, index: usize) -> Vec<WayId> {
        self.rings[index].ring.way_ids(self.members)
    }

    fn tree(&self) -> RTree<IndexedRing> {
        let items = self
            .rings
            .iter()
            .enumerate()
            .map(|(index, r)| IndexedRing {
                index,
                envelope: AABB::from_corners(
                    [r.bounds.min().x, r.bounds.min().y],
                    [r.bounds.max().x, r.bounds.max().y],
                ),
            })
            .collect();
        RTree::bulk_load(items)
    }

    /// Tests all ring pairs with intersecting bounding boxes. Pairs decided by
    /// propagation are not tested again.
    pub fn containment_matrix(&self, diagnostics: &mut Diagnostics) -> Containment {
        let mut matrix = ContainmentMatrix::new(self.rings.len());
        let tree = self.tree();
        let mut pairs: Vec<(usize, usize)> = tree
            .intersection_candidates_with_other_tree(&tree)
            .filter(|(a, b)| a.index != b.index)
            .map(|(a, b)| (a.index, b.index))
            .collect();
        pairs.sort_unstable();

        let mut crossing_pairs: BTreeMap<(usize, usize), bool> = BTreeMap::new();
        let mut crossings = Vec::new();
        let mut tested = 0usize;
        for (row, col) in pairs {
            if matrix.is_finished(row, col) {
                continue;
            }
            tested += 1;
            crossings.clear();
            if self.tester.contains(&self.rings[row], &self.rings[col], &mut crossings) {
                matrix.mark(row, col);
            }
            matrix.mark_finished(row, col);
            if !crossings.is_empty() {
                let inside = crossings.iter().any(|c| c.inside_tile);
                *crossing_pairs.entry((row, col)).or_insert(false) |= inside;
            }
        }
        debug!("tested {} ring pairs of {} rings", tested, self.rings.len());

        let mut intersecting = vec![false; self.rings.len()];
        let mut offending = vec![false; self.rings.len()];
        for ((outer, inner), inside_tile) in crossing_pairs {
            intersecting[outer] = true;
            intersecting[inner] = true;
            // the ring poking out of its container is the one that cannot be placed
            offending[inner] |= inside_tile;
            diagnostics.push(Diagnostic::IntersectingRings {
                first: self.ways(outer),
                second: self.ways(inner),
                inside_tile,
            });
        }
        Containment { matrix, intersecting, offending }
    }

    /// Builds the matrix and walks the hierarchy from the outermost rings inwards.
    pub fn resolve(&self, diagnostics: &mut Diagnostics) -> Hierarchy {
        let containment = self.containment_matrix(diagnostics);
        self.walk(&containment, diagnostics)
    }

    pub fn walk(&self, containment: &Containment, diagnostics: &mut Diagnostics) -> Hierarchy {
        let matrix = &containment.matrix;
        let n = self.rings.len();
        let mut hierarchy = Hierarchy::default();
        // rings nested only in excluded rings have no place left in the hierarchy
        let placeable = |i: usize| {
            let containers: Vec<usize> = (0..n).filter(|&j| matrix.contains(j, i)).collect();
            containers.is_empty() || containers.iter().any(|&j| !containment.offending[j])
        };
        let shadowed: Vec<bool> =
            (0..n).map(|i| !containment.offending[i] && !placeable(i)).collect();
        let mut unfinished: Vec<bool> =
            (0..n).map(|i| !containment.offending[i] && !shadowed[i]).collect();
        let mut removed = vec![false; n];

        let outermost = loop {
            let candidates: Vec<usize> = (0..n).filter(|&i| unfinished[i]).collect();
            let outermost = matrix.outermost(&candidates);
            let inner: Vec<usize> = outermost
                .iter()
                .copied()
                .filter(|&i| self.rings[i].role() == Role::Inner)
                .collect();
            if inner.is_empty() {
                break outermost;
            }
            for i in inner {
                diagnostics.push(Diagnostic::InnerWithoutOuter { ways: self.ways(i) });
                unfinished[i] = false;
                removed[i] = true;
            }
        };

        if outermost.is_empty() {
            diagnostics.push(Diagnostic::NoOuterRing);
            hierarchy.no_outer = true;
            hierarchy.excluded = (0..n).collect();
            return hierarchy;
        }

        let mut queue = VecDeque::new();
        for index in outermost {
            unfinished[index] = false;
            queue.push_back(PolygonGroup { index, outer: true });
        }

        let mut largest_area = f64::NEG_INFINITY;
        while let Some(group) = queue.pop_front() {
            let children: Vec<usize> =
                matrix.children(group.index).filter(|&c| unfinished[c]).collect();
            let holes = matrix.outermost(&children);

            let expected = if group.outer { Role::Inner } else { Role::Outer };
            for &hole in &holes {
                let role = self.rings[hole].role();
                if role != Role::Unset && role != expected {
                    // the geometry decides, the ring is still used as a hole
                    diagnostics.push(Diagnostic::NestedRole {
                        ways: self.ways(hole),
                        role,
                        parent: self.ways(group.index),
                    });
                }
                unfinished[hole] = false;
                queue.push_back(PolygonGroup { index: hole, outer: !group.outer });
            }

            if group.outer {
                let area = self.rings[group.index].area
                    - holes.iter().map(|&h| self.rings[h].area).sum::<f64>();
                if area > largest_area {
                    largest_area = area;
                    hierarchy.largest = Some(hierarchy.groups.len());
                }
                hierarchy.groups.push(OuterGroup { outer: group.index, holes, area });
            }
        }

        let unresolved: Vec<usize> =
            (0..n).filter(|&i| unfinished[i] || shadowed[i] || containment.offending[i]).collect();
        if !unresolved.is_empty() {
            let rings = unresolved
                .iter()
                .map(|&i| (self.ways(i), self.classify_unresolved(containment, i)))
                .collect();
            diagnostics.push(Diagnostic::UnresolvedRings { rings });
        }

        hierarchy.excluded = (0..n).filter(|&i| removed[i] || unresolved.contains(&i)).collect();
        hierarchy
    }

    /// The best guess why ring `index` could not be placed. A ring at an even nesting
    /// depth should be an outer ring, one at an odd depth an inner ring.
    fn classify_unresolved(&self, containment: &Containment, index: usize) -> UnresolvedCause {
        if containment.intersecting[index] {
            return UnresolvedCause::Intersecting;
        }
        let depth = (0..self.rings.len()).filter(|&j| containment.matrix.contains(j, index)).count();
        let expected = if depth % 2 == 0 { Role::Outer } else { Role::Inner };
        if self.rings[index].role().is_compatible(expected) {
            UnresolvedCause::WronglyNested
        } else {
            UnresolvedCause::WrongRole
        }
    }
}
