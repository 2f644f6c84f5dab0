//! Typed node properties.
//!
//! Each property id carries exactly one value kind. `Property` is a closed sum
//! type with one variant per id, so a mismatched (id, type) pair cannot be
//! constructed.

use crate::types::NodeId;
use serde::{Deserialize, Serialize};

/// Property identifiers. The discriminants are the ids written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PropId {
    Name = 0,
    NameSortKey = 1,
    Genre = 2,
    RealGenre = 5,
    Location = 13,
    Rating = 16,
    PlayCount = 17,
    LastPlayed = 18,
    LastPlayedStr = 19,
    AltLocations = 23,
    Priority = 30,
    Source = 31,
}

impl PropId {
    pub const ALL: [PropId; 12] = [
        PropId::Name,
        PropId::NameSortKey,
        PropId::Genre,
        PropId::RealGenre,
        PropId::Location,
        PropId::Rating,
        PropId::PlayCount,
        PropId::LastPlayed,
        PropId::LastPlayedStr,
        PropId::AltLocations,
        PropId::Priority,
        PropId::Source,
    ];

    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn from_u32(raw: u32) -> Option<PropId> {
        PropId::ALL.iter().copied().find(|p| p.as_u32() == raw)
    }

    /// The value kind this id stores.
    pub fn kind(self) -> ValueKind {
        match self {
            PropId::Name
            | PropId::NameSortKey
            | PropId::Genre
            | PropId::Location
            | PropId::LastPlayedStr
            | PropId::Source => ValueKind::String,
            PropId::Rating | PropId::PlayCount => ValueKind::Int,
            PropId::LastPlayed => ValueKind::Long,
            PropId::Priority => ValueKind::Bool,
            PropId::RealGenre => ValueKind::Node,
            PropId::AltLocations => ValueKind::List,
        }
    }
}

/// Value kinds, also used as the `value_type` tag in the XML snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Int,
    Long,
    Bool,
    Node,
    List,
}

impl ValueKind {
    pub fn tag(self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Int => "int",
            ValueKind::Long => "long",
            ValueKind::Bool => "bool",
            ValueKind::Node => "node",
            ValueKind::List => "list",
        }
    }

    pub fn from_tag(tag: &str) -> Option<ValueKind> {
        match tag {
            "string" => Some(ValueKind::String),
            "int" => Some(ValueKind::Int),
            "long" => Some(ValueKind::Long),
            "bool" => Some(ValueKind::Bool),
            "node" => Some(ValueKind::Node),
            "list" => Some(ValueKind::List),
            _ => None,
        }
    }
}

/// A property value bound to its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Property {
    Name(String),
    NameSortKey(String),
    Genre(String),
    /// Direct back-reference from a station to the genre node it sits under.
    RealGenre(NodeId),
    Location(String),
    Rating(i32),
    PlayCount(i32),
    /// Unix seconds; 0 means never.
    LastPlayed(i64),
    LastPlayedStr(String),
    AltLocations(Vec<String>),
    Priority(bool),
    Source(String),
}

impl Property {
    pub fn id(&self) -> PropId {
        match self {
            Property::Name(_) => PropId::Name,
            Property::NameSortKey(_) => PropId::NameSortKey,
            Property::Genre(_) => PropId::Genre,
            Property::RealGenre(_) => PropId::RealGenre,
            Property::Location(_) => PropId::Location,
            Property::Rating(_) => PropId::Rating,
            Property::PlayCount(_) => PropId::PlayCount,
            Property::LastPlayed(_) => PropId::LastPlayed,
            Property::LastPlayedStr(_) => PropId::LastPlayedStr,
            Property::AltLocations(_) => PropId::AltLocations,
            Property::Priority(_) => PropId::Priority,
            Property::Source(_) => PropId::Source,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Property::Name(s)
            | Property::NameSortKey(s)
            | Property::Genre(s)
            | Property::Location(s)
            | Property::LastPlayedStr(s)
            | Property::Source(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view; int and long properties both widen to i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Property::Rating(v) | Property::PlayCount(v) => Some(i64::from(*v)),
            Property::LastPlayed(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Property::Priority(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Property::RealGenre(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Property::AltLocations(list) => Some(list),
            _ => None,
        }
    }

    /// Builds a string-kind property for `id`. Returns `None` when `id` is not a
    /// string property.
    pub fn string(id: PropId, value: impl Into<String>) -> Option<Property> {
        let value = value.into();
        match id {
            PropId::Name => Some(Property::Name(value)),
            PropId::NameSortKey => Some(Property::NameSortKey(value)),
            PropId::Genre => Some(Property::Genre(value)),
            PropId::Location => Some(Property::Location(value)),
            PropId::LastPlayedStr => Some(Property::LastPlayedStr(value)),
            PropId::Source => Some(Property::Source(value)),
            _ => None,
        }
    }

    /// Builds an int- or long-kind property for `id`.
    pub fn integer(id: PropId, value: i64) -> Option<Property> {
        match id {
            PropId::Rating => i32::try_from(value).ok().map(Property::Rating),
            PropId::PlayCount => i32::try_from(value).ok().map(Property::PlayCount),
            PropId::LastPlayed => Some(Property::LastPlayed(value)),
            _ => None,
        }
    }
}
