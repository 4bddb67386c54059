//! Structured anomaly reports.
//!
//! Nothing found while resolving a relation is fatal. Every anomaly becomes one
//! [`Diagnostic`], is forwarded to the `log` facade and returned with the result so
//! that callers can point a human at the offending OSM data.

use std::fmt;

use log::{info, warn};

use crate::element::{Role, WayId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
}

/// Best-effort guess why a ring was never reached by the hierarchy walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnresolvedCause {
    Intersecting,
    WrongRole,
    WronglyNested,
}

impl fmt::Display for UnresolvedCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnresolvedCause::Intersecting => "intersects another ring",
            UnresolvedCause::WrongRole => "probably has the wrong role",
            UnresolvedCause::WronglyNested => "is wrongly nested",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic {
    /// Ways that could not be joined or closed into a ring.
    UnclosedWays { ways: Vec<WayId> },
    /// A chain was closed with a synthetic segment.
    ArtificiallyClosed { ways: Vec<WayId> },
    /// A chain was joined with a way of the opposite role.
    WrongRoleJoin { ways: Vec<WayId>, candidate: WayId },
    IntersectingRings { first: Vec<WayId>, second: Vec<WayId>, inside_tile: bool },
    /// An `inner` ring that no other ring contains.
    InnerWithoutOuter { ways: Vec<WayId> },
    /// `outer` inside `outer` or `inner` inside `inner`.
    NestedRole { ways: Vec<WayId>, role: Role, parent: Vec<WayId> },
    NoOuterRing,
    UnresolvedRings { rings: Vec<(Vec<WayId>, UnresolvedCause)> },
    /// The cutter gave up splitting an area and emitted it approximately.
    CutDepthExceeded { ways: Vec<WayId> },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::ArtificiallyClosed { .. } => Severity::Info,
            // usually a side effect of data clipped at the tile border
            Diagnostic::IntersectingRings { inside_tile: false, .. } => Severity::Info,
            _ => Severity::Warning,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Diagnostic::UnclosedWays { .. } => "unclosed-ways",
            Diagnostic::ArtificiallyClosed { .. } => "artificially-closed",
            Diagnostic::WrongRoleJoin { .. } => "wrong-role-join",
            Diagnostic::IntersectingRings { .. } => "intersecting-rings",
            Diagnostic::InnerWithoutOuter { .. } => "inner-without-outer",
            Diagnostic::NestedRole { .. } => "nested-role",
            Diagnostic::NoOuterRing => "no-outer-ring",
            Diagnostic::UnresolvedRings { .. } => "unresolved-rings",
            Diagnostic::CutDepthExceeded { .. } => "cut-depth-exceeded",
        }
    }
}

struct Urls<'a>(&'a [WayId]);

impl fmt::Display for Urls<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, way) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&way.url())?;
        }
        Ok(())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnclosedWays { ways } => {
                write!(f, "cannot close ways: {}", Urls(ways))
            }
            Diagnostic::ArtificiallyClosed { ways } => {
                write!(f, "closed ring artificially: {}", Urls(ways))
            }
            Diagnostic::WrongRoleJoin { ways, candidate } => write!(
                f,
                "joined {} with way of different role {}",
                Urls(ways),
                candidate.url()
            ),
            Diagnostic::IntersectingRings { first, second, inside_tile } => write!(
                f,
                "rings intersect {}: [{}] and [{}]",
                if *inside_tile { "inside the tile" } else { "outside the tile" },
                Urls(first),
                Urls(second)
            ),
            Diagnostic::InnerWithoutOuter { ways } => {
                write!(f, "inner ring is not contained by any outer ring: {}", Urls(ways))
            }
            Diagnostic::NestedRole { ways, role, parent } => write!(
                f,
                "ring with role {} lies inside a ring with the same role [{}]: {}",
                role.as_str(),
                Urls(parent),
                Urls(ways)
            ),
            Diagnostic::NoOuterRing => f.write_str("relation has no outer ring"),
            Diagnostic::UnresolvedRings { rings } => {
                write!(f, "{} rings could not be placed in the hierarchy", rings.len())?;
                for (ways, cause) in rings {
                    write!(f, "; [{}] {}", Urls(ways), cause)?;
                }
                Ok(())
            }
            Diagnostic::CutDepthExceeded { ways } => {
                write!(f, "gave up cutting holes, emitting approximation: {}", Urls(ways))
            }
        }
    }
}

/// Collects the diagnostics of one relation.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    relation: i64,
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new(relation: i64) -> Self {
        Self { relation, entries: Vec::new() }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Info => info!("multipolygon {}: {}", self.relation, diagnostic),
            Severity::Warning => warn!("multipolygon {}: {}", self.relation, diagnostic),
        }
        self.entries.push(diagnostic);
    }

    pub fn relation(&self) -> i64 {
        self.relation
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn count(&self, category: &str) -> usize {
        self.entries.iter().filter(|d| d.category() == category).count()
    }

    pub fn has_warnings(&self) -> bool {
        self.entries.iter().any(|d| d.severity() == Severity::Warning)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_contains_urls() {
        let d = Diagnostic::UnclosedWays { ways: vec![WayId(1), WayId(22)] };
        let text = d.to_string();
        assert!(text.contains("https://www.openstreetmap.org/way/1"));
        assert!(text.contains("https://www.openstreetmap.org/way/22"));
    }

    #[test]
    fn test_collector_counts() {
        let mut diags = Diagnostics::new(5);
        diags.push(Diagnostic::ArtificiallyClosed { ways: vec![WayId(1)] });
        assert!(!diags.has_warnings());
        diags.push(Diagnostic::NoOuterRing);
        assert!(diags.has_warnings());
        assert_eq!(diags.count("no-outer-ring"), 1);
        assert_eq!(diags.len(), 2);
        assert_eq!(diags.relation(), 5);
    }
}
