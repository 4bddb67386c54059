use crate::coords::CoordArena;
use crate::diagnostics::{Diagnostic, Diagnostics, UnresolvedCause};
use crate::element::{MemberWay, Role, WayId};
use crate::hierarchy::{ContainmentMatrix, ContainmentTester, HierarchyResolver, PreparedRing};
use crate::ring::Ring;
use crate::tile::TileBounds;

fn tile() -> TileBounds {
    TileBounds::new(0, 0, 100, 100).unwrap()
}

struct Fixture {
    arena: CoordArena,
    members: Vec<MemberWay>,
    rings: Vec<Ring>,
}

impl Fixture {
    fn new() -> Self {
        Self { arena: CoordArena::new(), members: Vec::new(), rings: Vec::new() }
    }

    fn ring(&mut self, role: Role, pts: &[(i32, i32)]) -> &mut Self {
        let mut ids: Vec<_> = pts.iter().map(|&(x, y)| self.arena.push_xy(x, y)).collect();
        ids.push(ids[0]);
        let id = self.members.len() as i64 + 1;
        let member = MemberWay::new(id, role, ids);
        self.rings.push(Ring::from_member(self.members.len(), &member));
        self.members.push(member);
        self
    }

    fn square(&mut self, role: Role, min: i32, max: i32) -> &mut Self {
        self.square_at(role, (min, min), (max, max))
    }

    fn square_at(&mut self, role: Role, min: (i32, i32), max: (i32, i32)) -> &mut Self {
        self.ring(role, &[min, (max.0, min.1), max, (min.0, max.1)])
    }

    fn prepared(&self) -> Vec<PreparedRing> {
        self.rings.iter().map(|r| PreparedRing::new(r.clone(), &self.arena)).collect()
    }
}

#[test]
fn test_matrix_propagates_in_either_order() {
    let mut m = ContainmentMatrix::new(3);
    m.mark(0, 1);
    m.mark(1, 2);
    assert!(m.contains(0, 2));

    let mut m = ContainmentMatrix::new(3);
    m.mark(1, 2);
    m.mark(0, 1);
    assert!(m.contains(0, 2));
    assert!(!m.contains(2, 0));
    assert!(m.is_finished(2, 0));
    assert_eq!(m.children(0).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(m.outermost(&[0, 1, 2]), vec![0]);
}

#[test]
fn test_matrix_is_irreflexive() {
    let mut m = ContainmentMatrix::new(2);
    m.mark(1, 1);
    assert!(!m.contains(1, 1));
    assert!(m.is_finished(0, 0));
}

#[test]
fn test_nested_squares_contain_one_way() {
    let mut f = Fixture::new();
    f.square(Role::Outer, 10, 90).square(Role::Inner, 30, 70);
    let rings = f.prepared();
    let tester = ContainmentTester::new(tile(), 4.0);
    let mut crossings = Vec::new();

    assert!(tester.contains(&rings[0], &rings[1], &mut crossings));
    assert!(!tester.contains(&rings[1], &rings[0], &mut crossings));
    assert!(crossings.is_empty());
}

#[test]
fn test_identical_rings_do_not_contain_each_other() {
    let mut f = Fixture::new();
    f.square(Role::Outer, 10, 90).square(Role::Outer, 10, 90);
    let rings = f.prepared();
    let tester = ContainmentTester::new(tile(), 4.0);
    let mut crossings = Vec::new();

    assert!(!tester.contains(&rings[0], &rings[1], &mut crossings));
    assert!(!tester.contains(&rings[1], &rings[0], &mut crossings));
}

#[test]
fn test_crossing_ring_is_reported_and_left_out() {
    let mut f = Fixture::new();
    // a U shape and a bar whose corners sit in both arms, its edges cross the notch
    f.ring(
        Role::Outer,
        &[(10, 10), (90, 10), (90, 90), (60, 90), (60, 40), (40, 40), (40, 90), (10, 90)],
    )
    .ring(Role::Outer, &[(20, 70), (80, 70), (80, 80), (20, 80)]);
    let rings = f.prepared();
    let mut diags = Diagnostics::new(1);
    let hierarchy = HierarchyResolver::new(&rings, &f.members, tile(), 4.0).resolve(&mut diags);

    let crossing: Vec<_> = diags
        .iter()
        .filter_map(|d| match d {
            Diagnostic::IntersectingRings { first, second, inside_tile } => {
                Some((first.clone(), second.clone(), *inside_tile))
            }
            _ => None,
        })
        .collect();
    assert_eq!(crossing, vec![(vec![WayId(1)], vec![WayId(2)], true)]);

    assert_eq!(hierarchy.groups.len(), 1);
    assert_eq!(hierarchy.groups[0].outer, 0);
    assert!(hierarchy.groups[0].holes.is_empty());
    assert_eq!(hierarchy.excluded, vec![1]);

    let unresolved: Vec<_> = diags
        .iter()
        .filter_map(|d| match d {
            Diagnostic::UnresolvedRings { rings } => Some(rings.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(unresolved, vec![vec![(vec![WayId(2)], UnresolvedCause::Intersecting)]]);
}

#[test]
fn test_outer_with_hole_and_island() {
    let mut f = Fixture::new();
    f.square(Role::Outer, 10, 90)
        .square(Role::Inner, 20, 80)
        .square(Role::Outer, 30, 70);
    let rings = f.prepared();
    let mut diags = Diagnostics::new(1);
    let hierarchy = HierarchyResolver::new(&rings, &f.members, tile(), 4.0).resolve(&mut diags);

    assert_eq!(hierarchy.groups.len(), 2);
    assert_eq!(hierarchy.groups[0].outer, 0);
    assert_eq!(hierarchy.groups[0].holes, vec![1]);
    assert_eq!(hierarchy.groups[1].outer, 2);
    assert!(hierarchy.groups[1].holes.is_empty());
    // 6400 - 3600 against 1600
    assert_eq!(hierarchy.largest, Some(0));
    assert!(hierarchy.excluded.is_empty());
    assert!(!diags.has_warnings());
}

#[test]
fn test_largest_group_by_net_area() {
    let mut f = Fixture::new();
    f.square(Role::Outer, 0, 60)
        .square(Role::Inner, 2, 58)
        .square(Role::Outer, 70, 95);
    let rings = f.prepared();
    let mut diags = Diagnostics::new(1);
    let hierarchy = HierarchyResolver::new(&rings, &f.members, tile(), 1.0).resolve(&mut diags);

    assert_eq!(hierarchy.groups.len(), 2);
    let largest = hierarchy.largest.map(|i| hierarchy.groups[i].outer);
    assert_eq!(largest, Some(2));
}

#[test]
fn test_inner_without_outer_is_dropped() {
    let mut f = Fixture::new();
    f.square(Role::Inner, 10, 40).square(Role::Outer, 50, 90);
    let rings = f.prepared();
    let mut diags = Diagnostics::new(1);
    let hierarchy = HierarchyResolver::new(&rings, &f.members, tile(), 4.0).resolve(&mut diags);

    assert_eq!(diags.count("inner-without-outer"), 1);
    assert_eq!(hierarchy.groups.len(), 1);
    assert_eq!(hierarchy.groups[0].outer, 1);
    assert_eq!(hierarchy.excluded, vec![0]);
}

#[test]
fn test_outer_inside_outer_is_used_as_hole() {
    let mut f = Fixture::new();
    f.square(Role::Outer, 10, 90).square(Role::Outer, 30, 70);
    let rings = f.prepared();
    let mut diags = Diagnostics::new(1);
    let hierarchy = HierarchyResolver::new(&rings, &f.members, tile(), 4.0).resolve(&mut diags);

    assert_eq!(hierarchy.groups.len(), 1);
    assert_eq!(hierarchy.groups[0].holes, vec![1]);
    assert_eq!(diags.count("nested-role"), 1);
    assert!(diags.has_warnings());
}

#[test]
fn test_only_inner_rings_means_no_outer() {
    let mut f = Fixture::new();
    f.square(Role::Inner, 10, 40).square(Role::Inner, 50, 90);
    let rings = f.prepared();
    let mut diags = Diagnostics::new(1);
    let hierarchy = HierarchyResolver::new(&rings, &f.members, tile(), 4.0).resolve(&mut diags);

    assert!(hierarchy.no_outer);
    assert!(hierarchy.groups.is_empty());
    assert_eq!(hierarchy.excluded, vec![0, 1]);
    assert_eq!(diags.count("no-outer-ring"), 1);
}

#[test]
fn test_crossings_outside_tile_do_not_prevent_containment() {
    let mut f = Fixture::new();
    // the outer ring has a notch beyond the western tile edge, the candidate runs through it
    f.ring(
        Role::Outer,
        &[(-40, 10), (90, 10), (90, 90), (-40, 90), (-40, 60), (-10, 60), (-10, 40), (-40, 40)],
    )
    .ring(Role::Inner, &[(-30, 20), (80, 20), (80, 80), (-30, 80), (-30, 50)]);
    let rings = f.prepared();
    let tester = ContainmentTester::new(tile(), 4.0);
    let mut crossings = Vec::new();

    assert!(tester.contains(&rings[0], &rings[1], &mut crossings));
    assert_eq!(crossings.len(), 2);
    assert!(crossings.iter().all(|c| !c.inside_tile));
}

#[test]
fn test_crossings_near_a_boundary_are_within_tolerance() {
    let mut f = Fixture::new();
    // the tip of the inner triangle lies 1.4 units beyond the hypotenuse
    f.ring(Role::Outer, &[(0, 0), (1000, 0), (0, 1000)])
        .ring(Role::Inner, &[(100, 100), (200, 100), (499, 503)]);
    let rings = f.prepared();
    let tile = TileBounds::new(-2000, -2000, 2000, 2000).unwrap();
    let mut crossings = Vec::new();

    assert!(ContainmentTester::new(tile, 4.0).contains(&rings[0], &rings[1], &mut crossings));
    assert!(crossings.is_empty());

    // with a tighter tolerance the tip is clearly outside
    assert!(!ContainmentTester::new(tile, 1.0).contains(&rings[0], &rings[1], &mut crossings));
    assert!(crossings.is_empty());
}

#[test]
fn test_edge_cutting_tile_corner_counts_as_outside() {
    let mut f = Fixture::new();
    // both rings cut off the south west corner of the tile, their diagonals cross
    // at (15, 5) inside the tile while every diagonal end point lies outside it
    f.ring(Role::Outer, &[(70, -50), (150, -50), (150, 150), (-50, 150), (-50, 70)])
        .ring(Role::Inner, &[(-30, 40), (60, -30), (130, -30), (130, 130), (-30, 130)]);
    let rings = f.prepared();
    let tester = ContainmentTester::new(tile(), 4.0);
    let mut crossings = Vec::new();

    assert!(tester.contains(&rings[0], &rings[1], &mut crossings));
    assert_eq!(crossings.len(), 2);
    assert!(crossings.iter().all(|c| !c.inside_tile));
}

#[test]
fn test_ring_on_boundary_decided_by_edge_midpoints() {
    let mut f = Fixture::new();
    let l_shape = [(10, 10), (90, 10), (90, 50), (50, 50), (50, 90), (10, 90)];
    f.square(Role::Outer, 10, 90)
        .ring(Role::Inner, &[(10, 10), (90, 10), (90, 90)])
        .ring(Role::Outer, &l_shape)
        .ring(Role::Inner, &[(10, 10), (90, 50), (50, 90)]);
    let rings = f.prepared();
    let tester = ContainmentTester::new(tile(), 4.0);
    let mut crossings = Vec::new();

    // three corners of the square, the diagonal runs through its inside
    assert!(tester.contains(&rings[0], &rings[1], &mut crossings));
    // three corners of the L, the edge between its arms leaves it
    assert!(!tester.contains(&rings[2], &rings[3], &mut crossings));
    assert!(crossings.is_empty());
}

#[test]
fn test_rings_inside_an_excluded_ring_are_classified() {
    let mut f = Fixture::new();
    // a U shape, a bar crossing its notch and two squares inside the bar over the notch
    f.ring(
        Role::Outer,
        &[(10, 10), (90, 10), (90, 90), (70, 90), (70, 40), (30, 40), (30, 90), (10, 90)],
    )
    .ring(Role::Outer, &[(20, 60), (80, 60), (80, 80), (20, 80)])
    .square_at(Role::Outer, (36, 64), (46, 76))
    .square_at(Role::Inner, (54, 64), (64, 76));
    let rings = f.prepared();
    let mut diags = Diagnostics::new(1);
    let hierarchy = HierarchyResolver::new(&rings, &f.members, tile(), 4.0).resolve(&mut diags);

    assert_eq!(hierarchy.groups.len(), 1);
    assert_eq!(hierarchy.groups[0].outer, 0);
    assert_eq!(hierarchy.excluded, vec![1, 2, 3]);

    let unresolved: Vec<_> = diags
        .iter()
        .filter_map(|d| match d {
            Diagnostic::UnresolvedRings { rings } => Some(rings.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        unresolved,
        vec![vec![
            (vec![WayId(2)], UnresolvedCause::Intersecting),
            // an outer ring inside an outer ring
            (vec![WayId(3)], UnresolvedCause::WrongRole),
            (vec![WayId(4)], UnresolvedCause::WronglyNested),
        ]]
    );
    assert_eq!(diags.count("inner-without-outer"), 0);
}
