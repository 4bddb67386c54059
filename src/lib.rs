//! Resolves OpenStreetMap multipolygon relations into simple polygons.
//!
//! The member ways of a relation are joined into closed rings ([`ring`]), the rings are
//! nested into outer areas with holes ([`hierarchy`]) and every outer area is cut into
//! single contours without holes ([`cutter`]). Anomalies in the data never abort a
//! resolution, they are returned as [`Diagnostic`]s and logged through `log`.

pub mod batch;
pub mod config;
pub mod coords;
pub mod cutter;
pub mod diagnostics;
pub mod element;
pub mod error;
pub mod export;
pub mod hierarchy;
pub mod multipolygon;
pub mod ring;
pub mod tile;
pub mod utils;

#[cfg(test)]
mod multipolygon_tests;

pub use batch::BatchResolver;
pub use config::ResolverConfig;
pub use coords::{CoordArena, CoordId};
pub use diagnostics::{Diagnostic, Diagnostics, Severity, UnresolvedCause};
pub use element::{MemberWay, Relation, Role, Tags, WayId};
pub use error::{MultipolygonError, Result};
pub use multipolygon::{MultipolygonResolver, OutputLine, OutputPolygon, Resolution};
pub use tile::TileBounds;
