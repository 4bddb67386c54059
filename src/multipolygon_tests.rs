#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use geo::Coord;

    use crate::multipolygon::{
        inherited_tags, AREA_SIZE_TAG, CREATED_TAG, ROLE_TAG, STYLE_FILTER_TAG,
    };
    use crate::{
        CoordArena, CoordId, MemberWay, MultipolygonError, MultipolygonResolver, Relation,
        ResolverConfig, Role, TileBounds,
    };

    fn resolver(config: ResolverConfig) -> MultipolygonResolver {
        let tile = TileBounds::new(-1000, -1000, 1000, 1000).unwrap();
        MultipolygonResolver::new(config, tile).unwrap()
    }

    fn ring(coords: &mut CoordArena, min: i32, max: i32) -> Vec<CoordId> {
        let p: Vec<CoordId> = [(min, min), (max, min), (max, max), (min, max)]
            .into_iter()
            .map(|(x, y)| coords.push_xy(x, y))
            .collect();
        vec![p[0], p[1], p[2], p[3], p[0]]
    }

    /// A wood made of two outer halves with a tagged lake as hole.
    fn wood_with_lake() -> Relation {
        let mut coords = CoordArena::new();
        let p: Vec<CoordId> = [(0, 0), (100, 0), (100, 100), (0, 100)]
            .into_iter()
            .map(|(x, y)| coords.push_xy(x, y))
            .collect();
        let lake = ring(&mut coords, 40, 60);
        let mut relation = Relation::new(7, coords)
            .with_tag("type", "multipolygon")
            .with_tag("landuse", "forest");
        relation.add_member(
            MemberWay::new(1, Role::Outer, vec![p[0], p[1], p[2]]).with_tag("landuse", "forest"),
        );
        relation.add_member(MemberWay::new(2, Role::Outer, vec![p[2], p[3], p[0]]));
        relation.add_member(MemberWay::new(3, Role::Inner, lake).with_tag("natural", "water"));
        relation
    }

    #[test]
    fn test_outer_from_two_halves() {
        let mut coords = CoordArena::new();
        let p: Vec<CoordId> = [(0, 0), (10, 0), (10, 10), (0, 10)]
            .into_iter()
            .map(|(x, y)| coords.push_xy(x, y))
            .collect();
        let mut relation = Relation::new(1, coords)
            .with_tag("type", "multipolygon")
            .with_tag("natural", "wood");
        relation.add_member(MemberWay::new(10, Role::Outer, vec![p[0], p[1], p[2]]));
        relation.add_member(MemberWay::new(11, Role::Outer, vec![p[2], p[3], p[0]]));

        let resolution = resolver(ResolverConfig::default()).resolve(&relation).unwrap();
        assert_eq!(resolution.polygons.len(), 1);
        let polygon = resolution.polygons.values().next().unwrap();
        assert_eq!(polygon.role(), Role::Outer);
        assert_relative_eq!(polygon.area(), 100.0);

        let tags = polygon.emission_tags();
        assert!(!tags.contains_key(ROLE_TAG));
        assert!(!tags.contains_key("type"));
        assert_eq!(tags.get("natural").map(String::as_str), Some("wood"));
        assert_eq!(tags.get(CREATED_TAG).map(String::as_str), Some("polygon"));
        assert_eq!(tags.get(STYLE_FILTER_TAG).map(String::as_str), Some("polygon"));

        assert_eq!(resolution.lines.len(), 2);
        assert!(resolution
            .lines
            .iter()
            .all(|l| l.tags.get(STYLE_FILTER_TAG).map(String::as_str) == Some("polyline")));
        assert_eq!(resolution.center, Some(Coord { x: 5, y: 5 }));
        assert!(resolution.fallback_lines.is_empty());
        assert!(resolution.diagnostics.is_empty());
    }

    #[test]
    fn test_hole_is_cut_out() {
        let resolution = resolver(ResolverConfig::default()).resolve(&wood_with_lake()).unwrap();
        let outer_area: f64 = resolution.outer_polygons().map(|p| p.area()).sum();
        assert_relative_eq!(outer_area, 10000.0 - 400.0, epsilon = 1e-6);
        assert!(resolution.outer_polygons().count() <= 2);
        assert_eq!(resolution.center, Some(Coord { x: 50, y: 50 }));
    }

    #[test]
    fn test_hole_sharing_a_node_with_outer() {
        let mut coords = CoordArena::new();
        let p: Vec<CoordId> = [(0, 0), (100, 0), (100, 50), (100, 100), (0, 100), (80, 40), (80, 60)]
            .into_iter()
            .map(|(x, y)| coords.push_xy(x, y))
            .collect();
        let mut relation = Relation::new(8, coords).with_tag("landuse", "meadow");
        relation.add_member(MemberWay::new(1, Role::Outer, vec![p[0], p[1], p[2], p[3], p[4], p[0]]));
        relation.add_member(MemberWay::new(2, Role::Inner, vec![p[2], p[5], p[6], p[2]]));

        let resolution = resolver(ResolverConfig::default()).resolve(&relation).unwrap();
        let outer_area: f64 = resolution.outer_polygons().map(|p| p.area()).sum();
        assert_relative_eq!(outer_area, 10000.0 - 200.0, epsilon = 1e-6);
        assert!(resolution.diagnostics.is_empty());
    }

    #[test]
    fn test_tagged_hole_becomes_inner_polygon() {
        let resolution = resolver(ResolverConfig::default()).resolve(&wood_with_lake()).unwrap();
        let inner: Vec<_> =
            resolution.polygons.values().filter(|p| p.role() == Role::Inner).collect();
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].tags.get("natural").map(String::as_str), Some("water"));
        assert_relative_eq!(inner[0].area(), 400.0);
    }

    #[test]
    fn test_line_tags_skip_identical_way_tags() {
        let resolution = resolver(ResolverConfig::default()).resolve(&wood_with_lake()).unwrap();
        let line = |id| resolution.lines.iter().find(|l| l.way.0 == id).unwrap();
        assert!(!line(1).tags.contains_key("landuse"));
        assert_eq!(line(2).tags.get("landuse").map(String::as_str), Some("forest"));
        assert!(resolution.lines.iter().all(|l| l.way.0 != 3));
    }

    #[test]
    fn test_tags_from_outer_ways_when_relation_has_none() {
        let mut coords = CoordArena::new();
        let a = ring(&mut coords, 0, 10);
        let b = ring(&mut coords, 20, 30);
        let mut relation = Relation::new(2, coords).with_tag("type", "multipolygon");
        relation.add_member(
            MemberWay::new(1, Role::Outer, a)
                .with_tag("building", "yes")
                .with_tag("name", "A"),
        );
        relation.add_member(
            MemberWay::new(2, Role::Outer, b)
                .with_tag("building", "yes")
                .with_tag("name", "B"),
        );

        let tags = inherited_tags(&relation);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags.get("building").map(String::as_str), Some("yes"));
    }

    #[test]
    fn test_area_size_on_outer_polygons() {
        let config = ResolverConfig::default().with_area_size(true);
        let resolution = resolver(config).resolve(&wood_with_lake()).unwrap();
        for polygon in resolution.outer_polygons() {
            assert_eq!(polygon.tags.get(AREA_SIZE_TAG).map(String::as_str), Some("9600"));
        }
        for polygon in resolution.polygons.values().filter(|p| p.role() == Role::Inner) {
            assert!(!polygon.tags.contains_key(AREA_SIZE_TAG));
        }
    }

    #[test]
    fn test_no_outer_falls_back_to_lines() {
        let mut coords = CoordArena::new();
        let p: Vec<CoordId> =
            [(10, 10), (50, 10), (50, 50)].into_iter().map(|(x, y)| coords.push_xy(x, y)).collect();
        let mut relation = Relation::new(3, coords).with_tag("natural", "water");
        relation.add_member(MemberWay::new(1, Role::Outer, vec![p[0], p[1]]));
        relation.add_member(MemberWay::new(2, Role::Inner, vec![p[1], p[2]]));

        let resolution = resolver(ResolverConfig::default()).resolve(&relation).unwrap();
        assert!(resolution.polygons.is_empty());
        assert_eq!(resolution.fallback_lines.len(), 2);
        let categories: Vec<_> = resolution.diagnostics.iter().map(|d| d.category()).collect();
        assert!(categories.contains(&"unclosed-ways"));
        assert!(categories.contains(&"no-outer-ring"));
        assert!(!categories.contains(&"wrong-role-join"));
    }

    #[test]
    fn test_label_member_is_center() {
        let mut relation = wood_with_lake();
        relation.label = Some(relation.coords.push_xy(20, 30));
        let resolution = resolver(ResolverConfig::default()).resolve(&relation).unwrap();
        assert_eq!(resolution.center, Some(Coord { x: 20, y: 30 }));
    }

    #[test]
    fn test_synthetic_ids_are_unique() {
        let r = resolver(ResolverConfig::default());
        let first = r.resolve(&wood_with_lake()).unwrap();
        let second = r.resolve(&wood_with_lake()).unwrap();
        for id in first.polygons.keys() {
            assert!(*id >= 1 << 62);
            assert!(!second.polygons.contains_key(id));
        }
    }

    #[test]
    fn test_unknown_coordinate_is_an_error() {
        let mut other = CoordArena::new();
        let stray: Vec<CoordId> = (0..5).map(|i| other.push_xy(i, i)).collect();
        let mut relation = Relation::new(4, CoordArena::new());
        relation.add_member(MemberWay::new(9, Role::Outer, stray));

        match resolver(ResolverConfig::default()).resolve(&relation) {
            Err(MultipolygonError::UnknownCoordinate { way, index }) => {
                assert_eq!(way.0, 9);
                assert_eq!(index, 0);
            }
            other => panic!("expected unknown coordinate, got {:?}", other.map(|r| r.relation)),
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let tile = TileBounds::new(0, 0, 10, 10).unwrap();
        let config = ResolverConfig::default().with_max_cut_depth(0);
        assert!(matches!(
            MultipolygonResolver::new(config, tile),
            Err(MultipolygonError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_caller_arena_is_untouched() {
        let mut coords = CoordArena::new();
        // an L shaped chain leaving the tile on two sides, closed with a bend corner
        let p: Vec<CoordId> = [(-1100, 500), (500, 500), (500, -1100)]
            .into_iter()
            .map(|(x, y)| coords.push_xy(x, y))
            .collect();
        let mut relation = Relation::new(5, coords).with_tag("natural", "wood");
        relation.add_member(MemberWay::new(1, Role::Outer, p));
        let before = relation.coords.len();

        let config = ResolverConfig::default().with_max_close_dist(0.01);
        let resolution = resolver(config).resolve(&relation).unwrap();
        assert_eq!(relation.coords.len(), before);
        assert_eq!(resolution.polygons.len(), 1);
    }
}
