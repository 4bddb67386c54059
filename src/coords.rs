use geo::{HaversineDistance, Point};
use geo_types::Coord;

/// Bits used to represent a full turn (360 degrees) in high precision map units.
pub const HIGH_PREC_BITS: u32 = 30;

const UNITS_PER_DEGREE: f64 = (1u64 << HIGH_PREC_BITS) as f64 / 360.0;

pub fn degrees_to_high_prec(degrees: f64) -> i32 {
    (degrees * UNITS_PER_DEGREE).round() as i32
}

pub fn high_prec_to_degrees(units: i32) -> f64 {
    units as f64 / UNITS_PER_DEGREE
}

/// Exact conversion, every `i32` is representable as `f64`.
#[inline]
pub fn to_f64(c: Coord<i32>) -> Coord<f64> {
    Coord { x: c.x as f64, y: c.y as f64 }
}

#[inline]
pub fn round_coord(c: Coord<f64>) -> Coord<i32> {
    Coord { x: c.x.round() as i32, y: c.y.round() as i32 }
}

/// Great circle distance in metres between two high precision positions.
pub fn distance_meters(a: Coord<i32>, b: Coord<i32>) -> f64 {
    let pa = Point::new(high_prec_to_degrees(a.x), high_prec_to_degrees(a.y));
    let pb = Point::new(high_prec_to_degrees(b.x), high_prec_to_degrees(b.y));
    pa.haversine_distance(&pb)
}

/// Handle into a [`CoordArena`].
///
/// Two handles are the "same point" only when they are equal. Two distinct handles may
/// well share a position; joining ways never looks at positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordId(u32);

impl CoordId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Owner of all coordinates of one relation.
///
/// Positions are stored as `x` = longitude, `y` = latitude in high precision units.
#[derive(Clone, Debug, Default)]
pub struct CoordArena {
    positions: Vec<Coord<i32>>,
}

impl CoordArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { positions: Vec::with_capacity(capacity) }
    }

    pub fn push(&mut self, position: Coord<i32>) -> CoordId {
        let id = CoordId(self.positions.len() as u32);
        self.positions.push(position);
        id
    }

    /// Adds a position given as raw high precision `(x, y)` units.
    pub fn push_xy(&mut self, x: i32, y: i32) -> CoordId {
        self.push(Coord { x, y })
    }

    pub fn push_degrees(&mut self, lat: f64, lon: f64) -> CoordId {
        self.push(Coord {
            x: degrees_to_high_prec(lon),
            y: degrees_to_high_prec(lat),
        })
    }

    #[inline]
    pub fn contains(&self, id: CoordId) -> bool {
        id.index() < self.positions.len()
    }

    /// Position of a handle. Handles must come from this arena.
    #[inline]
    pub fn position(&self, id: CoordId) -> Coord<i32> {
        self.positions[id.index()]
    }

    #[inline]
    pub fn position_f64(&self, id: CoordId) -> Coord<f64> {
        to_f64(self.position(id))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
