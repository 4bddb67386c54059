use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use geo::{Area, Centroid, Coord, LineString, Polygon};
use log::{debug, warn};

use crate::config::ResolverConfig;
use crate::coords::{round_coord, to_f64, CoordArena};
use crate::cutter::RingCutter;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::element::{MemberWay, Relation, Role, Tags, WayId};
use crate::error::{MultipolygonError, Result};
use crate::hierarchy::{HierarchyResolver, PreparedRing};
use crate::ring::RingBuilder;
use crate::tile::TileBounds;

/// Internal role marker of an output polygon, removed by [`OutputPolygon::emission_tags`].
pub const ROLE_TAG: &str = "mp:role";
/// Marks polygons created by the resolver.
pub const CREATED_TAG: &str = "mp:created";
/// `polygon` for resolved areas, `polyline` for outline duplicates.
pub const STYLE_FILTER_TAG: &str = "mp:style_filter";
/// Aggregate area of all outer polygons of the relation, in square high precision units.
pub const AREA_SIZE_TAG: &str = "mp:area_size";

// far above any real OSM id
static NEXT_SYNTHETIC_ID: AtomicU64 = AtomicU64::new(1 << 62);

/// A process wide unique id for a generated element.
pub fn next_synthetic_id() -> u64 {
    NEXT_SYNTHETIC_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Clone, Debug, PartialEq)]
pub struct OutputPolygon {
    pub points: LineString<i32>,
    pub tags: Tags,
}

impl OutputPolygon {
    pub fn role(&self) -> Role {
        self.tags.get(ROLE_TAG).map_or(Role::Unset, |r| Role::parse(r))
    }

    /// The tags to hand on, without internal markers.
    pub fn emission_tags(&self) -> Tags {
        let mut tags = self.tags.clone();
        tags.remove(ROLE_TAG);
        tags
    }

    pub fn area(&self) -> f64 {
        Polygon::new(self.points.0.iter().map(|&c| to_f64(c)).collect(), vec![]).unsigned_area()
    }
}

/// A member way rendered as a line.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputLine {
    pub way: WayId,
    pub points: LineString<i32>,
    pub tags: Tags,
}

/// Everything produced for one relation.
#[derive(Clone, Debug, Default)]
pub struct Resolution {
    pub relation: i64,
    /// Single contour polygons by synthetic id.
    pub polygons: BTreeMap<u64, OutputPolygon>,
    /// Outline copies of the member ways of outer rings.
    pub lines: Vec<OutputLine>,
    /// Member ways that did not end up in any polygon.
    pub fallback_lines: Vec<OutputLine>,
    /// Label position of the relation.
    pub center: Option<Coord<i32>>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Resolution {
    pub fn outer_polygons(&self) -> impl Iterator<Item = &OutputPolygon> {
        self.polygons.values().filter(|p| p.role() == Role::Outer)
    }
}

/// Resolves multipolygon relations of one tile.
///
/// ```
/// use osm_multipolygon::{CoordArena, MemberWay, MultipolygonResolver, Relation, ResolverConfig, Role, TileBounds};
///
/// let mut coords = CoordArena::new();
/// let p: Vec<_> = [(0, 0), (10, 0), (10, 10), (0, 10)]
///     .into_iter()
///     .map(|(x, y)| coords.push_xy(x, y))
///     .collect();
/// let mut relation = Relation::new(1, coords).with_tag("type", "multipolygon").with_tag("natural", "wood");
/// relation.add_member(MemberWay::new(10, Role::Outer, vec![p[0], p[1], p[2]]));
/// relation.add_member(MemberWay::new(11, Role::Outer, vec![p[2], p[3], p[0]]));
///
/// let tile = TileBounds::new(-100, -100, 100, 100).unwrap();
/// let resolver = MultipolygonResolver::new(ResolverConfig::default(), tile).unwrap();
/// let resolution = resolver.resolve(&relation).unwrap();
/// assert_eq!(resolution.polygons.len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct MultipolygonResolver {
    config: ResolverConfig,
    tile: TileBounds,
}

impl MultipolygonResolver {
    pub fn new(config: ResolverConfig, tile: TileBounds) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, tile })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn tile(&self) -> TileBounds {
        self.tile
    }

    pub fn resolve(&self, relation: &Relation) -> Result<Resolution> {
        check_handles(relation)?;
        let members = &relation.members;
        let label = relation.label.filter(|&id| relation.coords.contains(id));
        if label.is_none() && relation.label.is_some() {
            warn!("relation {}: label refers to an unknown coordinate", relation.id);
        }
        let mut diagnostics = Diagnostics::new(relation.id);
        let mut resolution = Resolution { relation: relation.id, ..Resolution::default() };
        let tags = inherited_tags(relation);

        // reconnection adds bend points, the caller's arena stays untouched
        let mut arena = relation.coords.clone();
        let built = RingBuilder::new(members, self.tile, &self.config)
            .build(&mut arena, &mut diagnostics);
        for ring in &built.unclosed {
            for &m in ring.members() {
                resolution.fallback_lines.push(line_of(&members[m], &arena, members[m].tags.clone()));
            }
        }

        let prepared: Vec<PreparedRing> =
            built.rings.into_iter().map(|r| PreparedRing::new(r, &arena)).collect();
        let hierarchy =
            HierarchyResolver::new(&prepared, members, self.tile, self.config.boundary_tolerance)
                .resolve(&mut diagnostics);

        if hierarchy.no_outer {
            resolution.fallback_lines = members
                .iter()
                .filter(|m| m.points.len() >= 2)
                .map(|m| line_of(m, &arena, m.tags.clone()))
                .collect();
            resolution.center = label.map(|id| arena.position(id));
            resolution.diagnostics = diagnostics.into_vec();
            return Ok(resolution);
        }

        let cutter = RingCutter::new(self.config.max_cut_depth)
            .with_clip(self.tile.clip_rect(self.config.clip_margin));
        let mut outer_ids = Vec::new();
        let mut total_area = 0.0;
        for group in &hierarchy.groups {
            let outer = &prepared[group.outer];
            let holes: Vec<&Polygon<f64>> =
                group.holes.iter().map(|&h| &prepared[h].polygon).collect();
            let output = cutter.cut(&outer.polygon, &holes);
            if output.depth_exceeded {
                diagnostics.push(Diagnostic::CutDepthExceeded {
                    ways: outer.ring.way_ids(members),
                });
            }
            for contour in output.contours {
                let mut polygon_tags = tags.clone();
                polygon_tags.insert(ROLE_TAG.to_string(), Role::Outer.as_str().to_string());
                polygon_tags.insert(CREATED_TAG.to_string(), "polygon".to_string());
                polygon_tags.insert(STYLE_FILTER_TAG.to_string(), "polygon".to_string());
                let polygon = OutputPolygon { points: contour, tags: polygon_tags };
                total_area += polygon.area();
                let id = next_synthetic_id();
                outer_ids.push(id);
                resolution.polygons.insert(id, polygon);
            }

            for &m in outer.ring.members() {
                let way = &members[m];
                let mut line_tags: Tags = tags
                    .iter()
                    .filter(|(k, v)| way.tags.get(*k) != Some(*v))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                line_tags.insert(STYLE_FILTER_TAG.to_string(), "polyline".to_string());
                resolution.lines.push(line_of(way, &arena, line_tags));
            }

            for &h in &group.holes {
                if let Some(polygon) = tagged_hole(&prepared[h], members, &tags) {
                    resolution.polygons.insert(next_synthetic_id(), polygon);
                }
            }
        }

        if self.config.compute_area_size {
            let value = format!("{:.0}", total_area);
            for id in &outer_ids {
                if let Some(p) = resolution.polygons.get_mut(id) {
                    p.tags.insert(AREA_SIZE_TAG.to_string(), value.clone());
                }
            }
        }

        resolution.center = match label {
            Some(id) => Some(arena.position(id)),
            None => hierarchy.largest.and_then(|i| {
                let group = &hierarchy.groups[i];
                let interiors =
                    group.holes.iter().map(|&h| prepared[h].polygon.exterior().clone()).collect();
                Polygon::new(prepared[group.outer].polygon.exterior().clone(), interiors)
                    .centroid()
                    .map(|p| round_coord(p.0))
            }),
        };

        debug!(
            "relation {}: {} rings, {} polygons, {} lines",
            relation.id,
            prepared.len(),
            resolution.polygons.len(),
            resolution.lines.len()
        );
        resolution.diagnostics = diagnostics.into_vec();
        Ok(resolution)
    }
}

/// A hole whose member ways carry tags of their own that differ from the relation's
/// is also a feature by itself, like a lake inside a wood.
fn tagged_hole(hole: &PreparedRing, members: &[MemberWay], inherited: &Tags) -> Option<OutputPolygon> {
    let mut tags = common_tags(hole.ring.members().iter().map(|&m| &members[m]))?;
    tags.retain(|k, v| inherited.get(k) != Some(&*v));
    if tags.is_empty() {
        return None;
    }
    tags.insert(ROLE_TAG.to_string(), Role::Inner.as_str().to_string());
    tags.insert(CREATED_TAG.to_string(), "polygon".to_string());
    tags.insert(STYLE_FILTER_TAG.to_string(), "polygon".to_string());
    let points: LineString<i32> = hole.coords.iter().copied().collect();
    Some(OutputPolygon { points, tags })
}

fn check_handles(relation: &Relation) -> Result<()> {
    for member in &relation.members {
        if let Some(index) = member.points.iter().position(|&id| !relation.coords.contains(id)) {
            return Err(MultipolygonError::UnknownCoordinate { way: member.id, index });
        }
    }
    Ok(())
}

/// The relation's own tags without `type`, or the tags all outer ways agree on when the
/// relation has none.
pub fn inherited_tags(relation: &Relation) -> Tags {
    let own: Tags = relation
        .tags
        .iter()
        .filter(|(k, _)| k.as_str() != "type")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if !own.is_empty() {
        return own;
    }
    common_tags(relation.members.iter().filter(|m| m.role == Role::Outer)).unwrap_or_default()
}

/// Tags present with the same value on every way, `None` without ways.
fn common_tags<'a>(mut ways: impl Iterator<Item = &'a MemberWay>) -> Option<Tags> {
    let mut common = ways.next()?.tags.clone();
    for way in ways {
        common.retain(|k, v| way.tags.get(k) == Some(&*v));
    }
    Some(common)
}

fn line_of(way: &MemberWay, arena: &CoordArena, tags: Tags) -> OutputLine {
    OutputLine {
        way: way.id,
        points: way.points.iter().map(|&id| arena.position(id)).collect(),
        tags,
    }
}
