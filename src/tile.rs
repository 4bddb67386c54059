use geo_types::{Coord, Rect};

use crate::coords::degrees_to_high_prec;
use crate::error::{MultipolygonError, Result};

const WEST: u8 = 1;
const EAST: u8 = 2;
const SOUTH: u8 = 4;
const NORTH: u8 = 8;

/// The bounding box of the tile a relation is resolved for, in high precision units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileBounds {
    min_lat: i32,
    min_lon: i32,
    max_lat: i32,
    max_lon: i32,
}

impl TileBounds {
    pub fn new(min_lat: i32, min_lon: i32, max_lat: i32, max_lon: i32) -> Result<Self> {
        if min_lat >= max_lat || min_lon >= max_lon {
            return Err(MultipolygonError::InvalidTileBounds(format!(
                "lat {}..{}, lon {}..{}",
                min_lat, max_lat, min_lon, max_lon
            )));
        }
        Ok(Self { min_lat, min_lon, max_lat, max_lon })
    }

    pub fn from_degrees(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Result<Self> {
        Self::new(
            degrees_to_high_prec(min_lat),
            degrees_to_high_prec(min_lon),
            degrees_to_high_prec(max_lat),
            degrees_to_high_prec(max_lon),
        )
    }

    pub fn min_lat(&self) -> i32 {
        self.min_lat
    }

    pub fn min_lon(&self) -> i32 {
        self.min_lon
    }

    pub fn max_lat(&self) -> i32 {
        self.max_lat
    }

    pub fn max_lon(&self) -> i32 {
        self.max_lon
    }

    /// Strictly inside the tile, points on the boundary are not inside.
    #[inline]
    pub fn inside(&self, c: Coord<i32>) -> bool {
        c.x > self.min_lon && c.x < self.max_lon && c.y > self.min_lat && c.y < self.max_lat
    }

    /// Inside the tile or on its boundary.
    #[inline]
    pub fn contains(&self, c: Coord<i32>) -> bool {
        c.x >= self.min_lon && c.x <= self.max_lon && c.y >= self.min_lat && c.y <= self.max_lat
    }

    fn sides(&self, c: Coord<i32>) -> u8 {
        let mut sides = 0;
        if c.x <= self.min_lon {
            sides |= WEST;
        }
        if c.x >= self.max_lon {
            sides |= EAST;
        }
        if c.y <= self.min_lat {
            sides |= SOUTH;
        }
        if c.y >= self.max_lat {
            sides |= NORTH;
        }
        sides
    }

    /// Both points lie outside (or on) the tile on a common side, so any line between them
    /// stays out of the tile.
    pub fn same_side_outside(&self, a: Coord<i32>, b: Coord<i32>) -> bool {
        self.sides(a) & self.sides(b) != 0
    }

    /// Does the segment `a`-`b` pass through the interior of the tile?
    ///
    /// Segments running along the boundary or touching a corner do not cut the tile.
    pub fn segment_cuts(&self, a: Coord<i32>, b: Coord<i32>) -> bool {
        let (x0, y0) = (a.x as f64, a.y as f64);
        let dx = b.x as f64 - x0;
        let dy = b.y as f64 - y0;

        let p = [-dx, dx, -dy, dy];
        let q = [
            x0 - self.min_lon as f64,
            self.max_lon as f64 - x0,
            y0 - self.min_lat as f64,
            self.max_lat as f64 - y0,
        ];

        let mut t0 = 0.0f64;
        let mut t1 = 1.0f64;
        for i in 0..4 {
            if p[i] == 0.0 {
                // parallel to this edge, on or beyond it
                if q[i] <= 0.0 {
                    return false;
                }
            } else {
                let r = q[i] / p[i];
                if p[i] < 0.0 {
                    t0 = t0.max(r);
                } else {
                    t1 = t1.min(r);
                }
            }
        }
        if t0 >= t1 {
            return false;
        }

        let t = (t0 + t1) / 2.0;
        let mx = x0 + t * dx;
        let my = y0 + t * dy;
        mx > self.min_lon as f64
            && mx < self.max_lon as f64
            && my > self.min_lat as f64
            && my < self.max_lat as f64
    }

    pub fn rect(&self) -> Rect<f64> {
        self.clip_rect(0)
    }

    /// The tile rectangle grown by `margin` units on every side.
    pub fn clip_rect(&self, margin: i32) -> Rect<f64> {
        let m = margin as f64;
        Rect::new(
            Coord { x: self.min_lon as f64 - m, y: self.min_lat as f64 - m },
            Coord { x: self.max_lon as f64 + m, y: self.max_lat as f64 + m },
        )
    }
}
