pub mod builder;


use geo_types::{Coord, LineString, Polygon, Rect};
use smallvec::SmallVec;

use crate::coords::{CoordArena, CoordId};
use crate::element::{MemberWay, Role, WayId};

pub use builder::{BuiltRings, RingBuilder};

/// A chain of member ways, closed once its first and last handle are equal.
#[derive(Clone, Debug)]
pub struct Ring {
    points: Vec<CoordId>,
    /// Indices into the relation's member list, never empty.
    members: SmallVec<[usize; 4]>,
    role: Role,
    closed_artificially: bool,
    /// Synthetic edges added while closing or connecting, as unordered handle pairs.
    artificial_edges: SmallVec<[(CoordId, CoordId); 2]>,
}

impl Ring {
    pub fn from_member(index: usize, member: &MemberWay) -> Self {
        let mut members = SmallVec::new();
        members.push(index);
        Self {
            points: member.points.clone(),
            members,
            role: member.role,
            closed_artificially: false,
            artificial_edges: SmallVec::new(),
        }
    }

    pub fn points(&self) -> &[CoordId] {
        &self.points
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn first(&self) -> CoordId {
        self.points[0]
    }

    pub fn last(&self) -> CoordId {
        self.points[self.points.len() - 1]
    }

    pub fn is_closed(&self) -> bool {
        self.points.len() > 1 && self.first() == self.last()
    }

    pub fn is_closed_artificially(&self) -> bool {
        self.closed_artificially
    }

    /// A single member way that was already closed in the input.
    pub fn is_originally_closed(&self) -> bool {
        self.members.len() == 1 && !self.closed_artificially && self.is_closed()
    }

    pub fn is_artificial_edge(&self, a: CoordId, b: CoordId) -> bool {
        self.artificial_edges
            .iter()
            .any(|&(p, q)| (p == a && q == b) || (p == b && q == a))
    }

    pub fn way_ids(&self, members: &[MemberWay]) -> Vec<WayId> {
        self.members.iter().map(|&i| members[i].id).collect()
    }

    pub fn shares_endpoint(&self, other: &Ring) -> bool {
        self.first() == other.first()
            || self.first() == other.last()
            || self.last() == other.first()
            || self.last() == other.last()
    }

    /// Joining `other` would produce a closed chain.
    pub fn would_close_with(&self, other: &Ring) -> bool {
        (self.first() == other.first() && self.last() == other.last())
            || (self.first() == other.last() && self.last() == other.first())
    }

    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Joins `other` at a shared endpoint, reversing point order where needed.
    /// Returns `false` (and leaves `self` untouched) when there is no shared endpoint.
    pub fn join(&mut self, mut other: Ring) -> bool {
        if self.last() == other.last() {
            other.reverse();
        } else if self.first() == other.last() {
            self.reverse();
            other.reverse();
        } else if self.first() == other.first() {
            self.reverse();
        } else if self.last() != other.first() {
            return false;
        }
        self.points.extend_from_slice(&other.points[1..]);
        self.absorb(other);
        true
    }

    /// Appends all points of `other`, connected by a synthetic edge.
    pub fn append_artificial(&mut self, other: Ring) {
        self.artificial_edges.push((self.last(), other.first()));
        self.points.extend_from_slice(&other.points);
        self.absorb(other);
    }

    /// Adds a synthetic point at the end of the chain.
    pub fn push_artificial(&mut self, point: CoordId) {
        self.artificial_edges.push((self.last(), point));
        self.points.push(point);
    }

    pub fn close_artificially(&mut self) {
        if self.is_closed() {
            return;
        }
        self.artificial_edges.push((self.last(), self.first()));
        self.points.push(self.first());
        self.closed_artificially = true;
    }

    fn absorb(&mut self, other: Ring) {
        self.role = match (self.role, other.role) {
            (a, b) if a == b => a,
            (Role::Unset, b) => b,
            (a, Role::Unset) => a,
            // joined across roles, the result has no reliable role
            _ => Role::Unset,
        };
        self.closed_artificially |= other.closed_artificially;
        self.members.extend(other.members);
        self.artificial_edges.extend(other.artificial_edges);
    }

    pub fn coords<'a>(&'a self, arena: &'a CoordArena) -> impl Iterator<Item = Coord<i32>> + 'a {
        self.points.iter().map(move |&id| arena.position(id))
    }

    /// Bounding box of all points. Computed on every call, callers that need it often
    /// keep a copy.
    pub fn bounds(&self, arena: &CoordArena) -> Rect<i32> {
        let mut iter = self.coords(arena);
        let first = iter.next().unwrap_or(Coord { x: 0, y: 0 });
        let (mut min, mut max) = (first, first);
        for c in iter {
            min.x = min.x.min(c.x);
            min.y = min.y.min(c.y);
            max.x = max.x.max(c.x);
            max.y = max.y.max(c.y);
        }
        Rect::new(min, max)
    }

    pub fn to_line_string(&self, arena: &CoordArena) -> LineString<f64> {
        LineString::new(self.points.iter().map(|&id| arena.position_f64(id)).collect())
    }

    pub fn to_polygon(&self, arena: &CoordArena) -> Polygon<f64> {
        Polygon::new(self.to_line_string(arena), vec![])
    }
}
