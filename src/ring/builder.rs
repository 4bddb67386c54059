use std::collections::VecDeque;

use geo::algorithm::line_intersection::line_intersection;
use geo::{Coord, Line};
use log::debug;

use crate::config::ResolverConfig;
use crate::coords::{distance_meters, to_f64, CoordArena, CoordId};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::element::MemberWay;
use crate::ring::Ring;
use crate::tile::TileBounds;

/// Output of [`RingBuilder::build`].
#[derive(Debug, Default)]
pub struct BuiltRings {
    /// Closed rings with at least three distinct points.
    pub rings: Vec<Ring>,
    /// Chains that could not be closed, kept for rendering as lines.
    pub unclosed: Vec<Ring>,
}

/// A possible connection between two chain ends outside the tile.
struct Connection {
    first: (usize, bool),
    second: (usize, bool),
    bend: Option<Coord<i32>>,
    distance: f64,
}

/// Joins the member ways of one relation into closed rings.
pub struct RingBuilder<'a> {
    members: &'a [MemberWay],
    tile: TileBounds,
    config: &'a ResolverConfig,
}

impl<'a> RingBuilder<'a> {
    pub fn new(members: &'a [MemberWay], tile: TileBounds, config: &'a ResolverConfig) -> Self {
        Self { members, tile, config }
    }

    /// Runs joining, artificial closing and cross-tile reconnection.
    ///
    /// `arena` receives the corner points of reconnection paths.
    pub fn build(&self, arena: &mut CoordArena, diagnostics: &mut Diagnostics) -> BuiltRings {
        let mut rings = self.join_ways(diagnostics);
        self.close_ways(&mut rings, arena, diagnostics);
        while self.connect_unclosed(&mut rings, arena) {
            self.close_ways(&mut rings, arena, diagnostics);
        }

        let mut built = BuiltRings::default();
        for ring in rings {
            if !ring.is_closed() {
                built.unclosed.push(ring);
            } else if ring.points().len() >= 4 {
                built.rings.push(ring);
            } else {
                debug!("dropping degenerate ring of ways {:?}", ring.way_ids(self.members));
            }
        }

        if !built.unclosed.is_empty() {
            let ways = built
                .unclosed
                .iter()
                .flat_map(|r| r.way_ids(self.members))
                .collect();
            diagnostics.push(Diagnostic::UnclosedWays { ways });
        }
        built
    }

    /// Joins ways sharing an endpoint handle.
    ///
    /// Ways with compatible roles are always preferred. A way with the opposite role is
    /// only taken when nothing compatible is found and the join closes the chain. This
    /// is a heuristic for sloppy role tagging, not OSM semantics, and it is reported.
    pub fn join_ways(&self, diagnostics: &mut Diagnostics) -> Vec<Ring> {
        let mut done = Vec::new();
        let mut unclosed = VecDeque::new();
        for (i, member) in self.members.iter().enumerate() {
            if member.points.len() < 2 {
                continue;
            }
            let ring = Ring::from_member(i, member);
            if ring.is_closed() {
                done.push(ring);
            } else {
                unclosed.push_back(ring);
            }
        }

        while let Some(mut chain) = unclosed.pop_front() {
            while !chain.is_closed() {
                let mut compatible = None;
                let mut wrong_role = None;
                for (j, candidate) in unclosed.iter().enumerate() {
                    if !chain.shares_endpoint(candidate) {
                        continue;
                    }
                    if chain.role().is_compatible(candidate.role()) {
                        compatible = Some(j);
                        break;
                    }
                    if wrong_role.is_none() && chain.would_close_with(candidate) {
                        wrong_role = Some(j);
                    }
                }

                let index = match (compatible, wrong_role) {
                    (Some(j), _) => j,
                    (None, Some(j)) => {
                        let ways = chain.way_ids(self.members);
                        let candidate = self.members[unclosed[j].members()[0]].id;
                        diagnostics.push(Diagnostic::WrongRoleJoin { ways, candidate });
                        j
                    }
                    (None, None) => break,
                };
                match unclosed.remove(index) {
                    Some(candidate) => {
                        chain.join(candidate);
                    }
                    None => break,
                }
            }
            done.push(chain);
        }
        done
    }

    /// Closes open chains with a synthetic segment where that is harmless.
    pub fn close_ways(
        &self,
        rings: &mut [Ring],
        arena: &CoordArena,
        diagnostics: &mut Diagnostics,
    ) -> bool {
        let mut changed = false;
        for ring in rings.iter_mut() {
            if ring.is_closed() || ring.points().len() < 3 {
                continue;
            }
            let p1 = arena.position(ring.first());
            let p2 = arena.position(ring.last());

            let close = if self.tile.same_side_outside(p1, p2) {
                true
            } else {
                let closing = Line::new(to_f64(p1), to_f64(p2));
                let points = ring.points();
                // skip the first and last edge, they touch the closing line in its endpoints
                let crosses = points[1..points.len() - 1].windows(2).any(|w| {
                    let edge = Line::new(arena.position_f64(w[0]), arena.position_f64(w[1]));
                    line_intersection(closing, edge).is_some()
                });
                !crosses && self.config.allows_close(distance_meters(p1, p2))
            };

            if close {
                ring.close_artificially();
                diagnostics.push(Diagnostic::ArtificiallyClosed {
                    ways: ring.way_ids(self.members),
                });
                changed = true;
            }
        }
        changed
    }

    /// Connects the closest pair of chain ends lying outside the tile. Returns `true`
    /// when a connection was made.
    pub fn connect_unclosed(&self, rings: &mut Vec<Ring>, arena: &mut CoordArena) -> bool {
        let mut ends: Vec<(usize, bool, Coord<i32>)> = Vec::new();
        for (i, ring) in rings.iter().enumerate() {
            if ring.is_closed() {
                continue;
            }
            for (at_start, id) in [(true, ring.first()), (false, ring.last())] {
                let pos = arena.position(id);
                if !self.tile.inside(pos) {
                    ends.push((i, at_start, pos));
                }
            }
        }

        let mut best: Option<Connection> = None;
        for a in 0..ends.len() {
            for b in a + 1..ends.len() {
                let (ri, si, pi) = ends[a];
                let (rj, sj, pj) = ends[b];
                if ri == rj {
                    if rings[ri].points().len() < 3 {
                        continue;
                    }
                } else if !rings[ri].role().is_compatible(rings[rj].role()) {
                    continue;
                }

                let bend = if self.tile.segment_cuts(pi, pj) {
                    let corners = [Coord { x: pj.x, y: pi.y }, Coord { x: pi.x, y: pj.y }];
                    match corners.into_iter().find(|&c| {
                        !self.tile.segment_cuts(pi, c) && !self.tile.segment_cuts(c, pj)
                    }) {
                        Some(c) => Some(c),
                        // ends on opposite sides of the tile
                        None => continue,
                    }
                } else {
                    None
                };

                let distance = distance_meters(pi, pj);
                if best.as_ref().map_or(true, |c| distance < c.distance) {
                    best = Some(Connection { first: (ri, si), second: (rj, sj), bend, distance });
                }
            }
        }

        let Some(conn) = best else {
            return false;
        };
        let bend: Option<CoordId> = conn.bend.map(|c| arena.push(c));
        let (ri, first_at_start) = conn.first;
        let (rj, second_at_start) = conn.second;

        if ri == rj {
            let ring = &mut rings[ri];
            if let Some(id) = bend {
                ring.push_artificial(id);
            }
            ring.close_artificially();
            debug!("connected both ends of one chain outside the tile");
            return true;
        }

        // the chosen end of the first chain becomes its last point, the chosen end of the
        // second chain its first point
        let mut second = rings.remove(rj);
        let ri = if rj < ri { ri - 1 } else { ri };
        if !second_at_start {
            second.reverse();
        }
        let first = &mut rings[ri];
        if first_at_start {
            first.reverse();
        }
        if let Some(id) = bend {
            first.push_artificial(id);
        }
        first.append_artificial(second);
        debug!("connected two chains outside the tile");
        true
    }
}
