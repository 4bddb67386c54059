//! GeoJSON rendering of a [`Resolution`], mainly for looking at results in a viewer.

use geo_types::{Coord, LineString};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};

use crate::coords::high_prec_to_degrees;
use crate::element::Tags;
use crate::multipolygon::{OutputLine, Resolution};

fn position(c: Coord<i32>) -> Vec<f64> {
    vec![high_prec_to_degrees(c.x), high_prec_to_degrees(c.y)]
}

fn positions(line: &LineString<i32>) -> Vec<Vec<f64>> {
    line.0.iter().map(|&c| position(c)).collect()
}

fn properties(tags: &Tags, kind: &str) -> JsonObject {
    let mut props: JsonObject =
        tags.iter().map(|(k, v)| (k.clone(), JsonValue::from(v.as_str()))).collect();
    props.insert("kind".to_string(), JsonValue::from(kind));
    props
}

fn feature(geometry: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geometry)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn line_feature(line: &OutputLine, kind: &str) -> Feature {
    let mut props = properties(&line.tags, kind);
    props.insert("way".to_string(), JsonValue::from(line.way.0));
    feature(Value::LineString(positions(&line.points)), props)
}

impl Resolution {
    /// Polygons, outline lines, fallback lines and the label point as one collection,
    /// coordinates in degrees. Diagnostics go into the `diagnostics` foreign member.
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let mut features = Vec::with_capacity(
            self.polygons.len() + self.lines.len() + self.fallback_lines.len() + 1,
        );
        for (id, polygon) in &self.polygons {
            let mut props = properties(&polygon.emission_tags(), "polygon");
            props.insert("id".to_string(), JsonValue::from(*id));
            props.insert("role".to_string(), JsonValue::from(polygon.role().as_str()));
            features.push(feature(Value::Polygon(vec![positions(&polygon.points)]), props));
        }
        features.extend(self.lines.iter().map(|l| line_feature(l, "outline")));
        features.extend(self.fallback_lines.iter().map(|l| line_feature(l, "fallback")));
        if let Some(center) = self.center {
            let mut props = JsonObject::new();
            props.insert("kind".to_string(), JsonValue::from("center"));
            features.push(feature(Value::Point(position(center)), props));
        }

        let mut foreign = JsonObject::new();
        foreign.insert("relation".to_string(), JsonValue::from(self.relation));
        foreign.insert(
            "diagnostics".to_string(),
            JsonValue::Array(
                self.diagnostics
                    .iter()
                    .map(|d| {
                        let mut entry = JsonObject::new();
                        entry.insert("category".to_string(), JsonValue::from(d.category()));
                        entry.insert("message".to_string(), JsonValue::from(d.to_string()));
                        JsonValue::Object(entry)
                    })
                    .collect(),
            ),
        );
        FeatureCollection { bbox: None, features, foreign_members: Some(foreign) }
    }
}

#[cfg(test)]
mod tests {
    use crate::{CoordArena, MemberWay, MultipolygonResolver, Relation, ResolverConfig, Role, TileBounds};

    #[test]
    fn test_feature_collection_contents() {
        let mut coords = CoordArena::new();
        let p: Vec<_> = [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]
            .into_iter()
            .map(|(lat, lon)| coords.push_degrees(lat, lon))
            .collect();
        let mut relation = Relation::new(99, coords).with_tag("natural", "scrub");
        relation.add_member(MemberWay::new(1, Role::Outer, vec![p[0], p[1], p[2], p[3], p[0]]));

        let tile = TileBounds::from_degrees(-2.0, -2.0, 2.0, 2.0).unwrap();
        let resolver = MultipolygonResolver::new(ResolverConfig::default(), tile).unwrap();
        let fc = resolver.resolve(&relation).unwrap().to_feature_collection();

        // polygon, outline and center
        assert_eq!(fc.features.len(), 3);
        let polygon = &fc.features[0];
        let props = polygon.properties.as_ref().unwrap();
        assert_eq!(props["natural"], "scrub");
        assert_eq!(props["kind"], "polygon");
        assert!(!props.contains_key("mp:role"));

        let json = serde_json::to_value(&fc).unwrap();
        assert_eq!(json["relation"], 99);
        assert!(json["diagnostics"].as_array().unwrap().is_empty());
        let first = &json["features"][0]["geometry"]["coordinates"][0][0];
        assert!((first[0].as_f64().unwrap()).abs() < 1e-6);
    }
}
