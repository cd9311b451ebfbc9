// topology.rs - How the field edges behave during neighbour lookup

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    /// Edges are walls; anything past them counts as dead.
    Bounded,
    /// Edges wrap around to the opposite side ("infinite" field).
    #[default]
    Wrapping,
}

impl Topology {
    /// Map a neighbour coordinate `coord + delta` onto `0..len`.
    ///
    /// `delta` is one of -1, 0, 1 so a single wrap is always enough.
    /// Returns `None` when the cell lies outside the field and counts as dead.
    pub fn resolve(self, coord: usize, delta: isize, len: usize) -> Option<usize> {
        let target = coord as isize + delta;
        let len = len as isize;
        let target = match self {
            Topology::Wrapping if target < 0 => target + len,
            Topology::Wrapping if target >= len => target - len,
            _ => target,
        };
        (0..len).contains(&target).then_some(target as usize)
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Topology::Bounded => "bounded",
            Topology::Wrapping => "wrapping",
        })
    }
}

impl FromStr for Topology {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bounded" | "bound" => Ok(Topology::Bounded),
            "wrapping" | "wrap" | "infinity" | "infinite" => Ok(Topology::Wrapping),
            other => Err(format!("unknown topology: {other}")),
        }
    }
}
