use std::collections::BTreeMap;
use std::fmt;

use crate::coords::{CoordArena, CoordId};

pub type Tags = BTreeMap<String, String>;

/// Identity of an OSM way.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WayId(pub i64);

impl WayId {
    pub fn url(self) -> String {
        format!("https://www.openstreetmap.org/way/{}", self.0)
    }
}

impl fmt::Display for WayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a member way inside a multipolygon relation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Role {
    Outer,
    Inner,
    #[default]
    Unset,
}

impl Role {
    /// Parses an OSM role string. Anything but `outer`/`inner` counts as unset.
    pub fn parse(role: &str) -> Self {
        match role.trim() {
            "outer" => Role::Outer,
            "inner" => Role::Inner,
            _ => Role::Unset,
        }
    }

    /// Unset roles are compatible with everything.
    pub fn is_compatible(self, other: Role) -> bool {
        self == Role::Unset || other == Role::Unset || self == other
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Outer => "outer",
            Role::Inner => "inner",
            Role::Unset => "",
        }
    }
}

/// One way member of a relation.
#[derive(Clone, Debug)]
pub struct MemberWay {
    pub id: WayId,
    pub role: Role,
    pub points: Vec<CoordId>,
    pub tags: Tags,
}

impl MemberWay {
    pub fn new(id: i64, role: Role, points: Vec<CoordId>) -> Self {
        Self { id: WayId(id), role, points, tags: Tags::new() }
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    /// Closed in the input data, first and last point are the same handle.
    pub fn is_closed(&self) -> bool {
        self.points.len() > 1 && self.points.first() == self.points.last()
    }
}

/// A multipolygon relation together with the coordinates of all its members.
///
/// Each relation owns its arena, so relations can be resolved independently on
/// different threads.
#[derive(Clone, Debug, Default)]
pub struct Relation {
    pub id: i64,
    pub tags: Tags,
    pub members: Vec<MemberWay>,
    /// Position of a member node with role `label`, if any.
    pub label: Option<CoordId>,
    pub coords: CoordArena,
}

impl Relation {
    pub fn new(id: i64, coords: CoordArena) -> Self {
        Self { id, coords, ..Self::default() }
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    pub fn add_member(&mut self, member: MemberWay) {
        self.members.push(member);
    }
}
