//! Entitlement actions and the per-entity bitmask.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// One gated action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Entitlement {
    Create = 1,
    Read = 2,
    Update = 4,
    Delete = 8,
}

impl Entitlement {
    pub const ALL: [Entitlement; 4] = [Self::Create, Self::Read, Self::Update, Self::Delete];

    pub const fn bit(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Entitlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Entitlement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|e| e.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("unknown entitlement '{}'", s))
    }
}

bitflags! {
    /// Union of [`Entitlement`]s granted on one entity.
    ///
    /// On the wire this is a list of ints, one per action. Reading ORs the
    /// supplied ints together and drops bits outside the known actions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EntitlementSet: u8 {
        const CREATE = 1;
        const READ = 2;
        const UPDATE = 4;
        const DELETE = 8;
    }
}

impl EntitlementSet {
    /// Bitwise test for a single action.
    pub fn allows(self, action: Entitlement) -> bool {
        self.intersects(action.into())
    }

    pub fn actions(self) -> impl Iterator<Item = Entitlement> {
        Entitlement::ALL.into_iter().filter(move |e| self.allows(*e))
    }

    /// OR together raw wire values, masking unknown bits.
    pub fn from_wire<I: IntoIterator<Item = i64>>(values: I) -> Self {
        values
            .into_iter()
            .filter_map(|v| u8::try_from(v).ok())
            .fold(Self::empty(), |acc, v| acc | Self::from_bits_truncate(v))
    }

    pub fn to_wire(self) -> Vec<i64> {
        self.actions().map(|e| i64::from(e.bit())).collect()
    }
}

impl From<Entitlement> for EntitlementSet {
    fn from(action: Entitlement) -> Self {
        Self::from_bits_truncate(action.bit())
    }
}

impl FromIterator<Entitlement> for EntitlementSet {
    fn from_iter<I: IntoIterator<Item = Entitlement>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), |acc, e| acc | e.into())
    }
}

impl fmt::Display for EntitlementSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = self.actions().map(Entitlement::name).collect();
        f.write_str(&names.join(","))
    }
}

/// Parses `create,read`, `all`, `none` or a numeric mask.
impl FromStr for EntitlementSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            return Ok(Self::empty());
        }
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::all());
        }
        if let Ok(mask) = s.parse::<i64>() {
            return Ok(Self::from_wire([mask]));
        }
        s.split(',')
            .map(str::parse::<Entitlement>)
            .collect::<Result<Self, _>>()
    }
}

impl Serialize for EntitlementSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireEntitlements {
    List(Vec<i64>),
    Mask(i64),
}

impl<'de> Deserialize<'de> for EntitlementSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match WireEntitlements::deserialize(deserializer)? {
            WireEntitlements::List(values) => Self::from_wire(values),
            WireEntitlements::Mask(mask) => Self::from_wire([mask]),
        })
    }
}
