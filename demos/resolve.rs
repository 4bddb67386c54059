use clap::Parser;
use geojson::{GeoJson, Value};
use osm_multipolygon::coords::degrees_to_high_prec;
use osm_multipolygon::{
    CoordArena, CoordId, MemberWay, MultipolygonResolver, Relation, ResolverConfig, Role,
    TileBounds,
};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input GeoJSON file, one LineString feature per member way with `id` and `role`
    /// properties; every other string property is a way tag
    #[arg(short, long)]
    input: PathBuf,

    /// Output GeoJSON file (polygons, lines and diagnostics)
    #[arg(short, long)]
    output: PathBuf,

    /// Relation id
    #[arg(long, default_value_t = 1)]
    relation: i64,

    /// Relation tag as key=value, may be repeated
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Tile bounds in degrees as min_lat,min_lon,max_lat,max_lon. Defaults to the
    /// bounding box of the input.
    #[arg(long)]
    tile: Option<String>,

    /// Maximum length of a synthetic closing segment in metres
    #[arg(long, default_value_t = -1.0)]
    max_close_dist: f64,

    /// Add the aggregate area to outer polygons
    #[arg(long, default_value_t = false)]
    area_size: bool,
}

fn parse_tile(text: &str) -> Result<TileBounds, Box<dyn std::error::Error>> {
    let v: Vec<f64> = text.split(',').map(|s| s.trim().parse()).collect::<Result<_, _>>()?;
    if v.len() != 4 {
        return Err(format!("expected 4 values for --tile, got {}", v.len()).into());
    }
    Ok(TileBounds::from_degrees(v[0], v[1], v[2], v[3])?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    println!("Reading input from {:?}", args.input);
    let file = File::open(&args.input)?;
    let geojson: GeoJson = serde_json::from_reader(BufReader::new(file))?;
    let GeoJson::FeatureCollection(fc) = geojson else {
        return Err("input must be a FeatureCollection".into());
    };

    // shared endpoints become shared handles
    let mut coords = CoordArena::new();
    let mut known: HashMap<(i32, i32), CoordId> = HashMap::new();
    let mut members = Vec::new();
    for (n, feature) in fc.features.into_iter().enumerate() {
        let Some(Value::LineString(positions)) = feature.geometry.map(|g| g.value) else {
            continue;
        };
        let props = feature.properties.unwrap_or_default();
        let id = props.get("id").and_then(|v| v.as_i64()).unwrap_or(n as i64 + 1);
        let role = Role::parse(props.get("role").and_then(|v| v.as_str()).unwrap_or(""));
        let points = positions
            .iter()
            .map(|p| {
                let key = (degrees_to_high_prec(p[0]), degrees_to_high_prec(p[1]));
                *known.entry(key).or_insert_with(|| coords.push_xy(key.0, key.1))
            })
            .collect();

        let mut member = MemberWay::new(id, role, points);
        for (key, value) in &props {
            if key == "id" || key == "role" {
                continue;
            }
            if let Some(value) = value.as_str() {
                member = member.with_tag(key, value);
            }
        }
        members.push(member);
    }

    let tile = match &args.tile {
        Some(text) => parse_tile(text)?,
        None => {
            let xs = known.keys().map(|k| k.0);
            let ys = known.keys().map(|k| k.1);
            let (min_x, max_x) = (xs.clone().min().unwrap_or(0), xs.max().unwrap_or(0));
            let (min_y, max_y) = (ys.clone().min().unwrap_or(0), ys.max().unwrap_or(0));
            TileBounds::new(min_y - 1, min_x - 1, max_y + 1, max_x + 1)?
        }
    };

    let mut relation = Relation::new(args.relation, coords);
    for tag in &args.tags {
        let (key, value) = tag.split_once('=').ok_or("tags must be key=value")?;
        relation = relation.with_tag(key, value);
    }
    println!("Loaded {} member ways. Resolving...", members.len());
    for member in members {
        relation.add_member(member);
    }

    let config = ResolverConfig::default()
        .with_max_close_dist(args.max_close_dist)
        .with_area_size(args.area_size);
    let resolver = MultipolygonResolver::new(config, tile)?;
    let resolution = resolver.resolve(&relation)?;

    println!(
        "Found {} polygons, {} fallback lines.",
        resolution.polygons.len(),
        resolution.fallback_lines.len()
    );
    for diagnostic in &resolution.diagnostics {
        println!("  {}: {}", diagnostic.category(), diagnostic);
    }

    let file = File::create(&args.output)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &GeoJson::FeatureCollection(resolution.to_feature_collection()))?;

    println!("Wrote output to {:?}", args.output);

    Ok(())
}
