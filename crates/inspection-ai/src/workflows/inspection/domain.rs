use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::normalizer::normalize_label;

/// Identifier of the property (lot, unit or building) an inspection row belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub String);

impl PropertyId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Standardized trade categories used for readiness aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trade {
    Appliances,
    CarpentryAndJoinery,
    Doors,
    Electrical,
    FlooringCarpets,
    FlooringTiles,
    FlooringTimber,
    Painting,
    Plumbing,
    Windows,
}

impl Trade {
    pub const fn ordered() -> [Self; 10] {
        [
            Self::Appliances,
            Self::CarpentryAndJoinery,
            Self::Doors,
            Self::Electrical,
            Self::FlooringCarpets,
            Self::FlooringTiles,
            Self::FlooringTimber,
            Self::Painting,
            Self::Plumbing,
            Self::Windows,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Appliances => "Appliances",
            Self::CarpentryAndJoinery => "Carpentry & Joinery",
            Self::Doors => "Doors",
            Self::Electrical => "Electrical",
            Self::FlooringCarpets => "Flooring - Carpets",
            Self::FlooringTiles => "Flooring - Tiles",
            Self::FlooringTimber => "Flooring - Timber",
            Self::Painting => "Painting",
            Self::Plumbing => "Plumbing",
            Self::Windows => "Windows",
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Appliances => "appliances",
            Self::CarpentryAndJoinery => "carpentry_and_joinery",
            Self::Doors => "doors",
            Self::Electrical => "electrical",
            Self::FlooringCarpets => "flooring_carpets",
            Self::FlooringTiles => "flooring_tiles",
            Self::FlooringTimber => "flooring_timber",
            Self::Painting => "painting",
            Self::Plumbing => "plumbing",
            Self::Windows => "windows",
        }
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raised when a trade name is not part of the canonical trade list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a canonical trade")]
pub struct UnknownTrade(pub String);

impl FromStr for Trade {
    type Err = UnknownTrade;

    /// Accepts either the display label ("Flooring - Tiles") or the key ("flooring_tiles").
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_label(value);
        Trade::ordered()
            .into_iter()
            .find(|trade| {
                normalized == trade.key() || normalized == normalize_label(trade.label())
            })
            .ok_or_else(|| UnknownTrade(value.trim().to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Major,
    Critical,
}

impl Severity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Minor => "Minor",
            Self::Major => "Major",
            Self::Critical => "Critical",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "minor" => Some(Self::Minor),
            "major" => Some(Self::Major),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// Whether the raw trade label of a record matched an active registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Resolved,
    Unresolved,
}

impl Resolution {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Resolved => "Resolved",
            Self::Unresolved => "Unresolved",
        }
    }
}

/// One validated inspection finding produced from a single CSV row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionRecord {
    pub line: u64,
    pub property_id: PropertyId,
    pub jurisdiction: Option<String>,
    pub raw_trade_label: String,
    pub canonical_trade: Option<Trade>,
    pub finding_code: String,
    pub severity: Severity,
    pub description: String,
    pub inspected_at: Option<NaiveDateTime>,
    pub resolution: Resolution,
}

impl InspectionRecord {
    pub fn is_resolved(&self) -> bool {
        self.resolution == Resolution::Resolved
    }
}

/// Roles recognized by the authentication gate in front of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Inspector,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" | "administrator" => Some(Self::Admin),
            "inspector" => Some(Self::Inspector),
            _ => None,
        }
    }

    pub const fn can_edit_mappings(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Already-authenticated caller, supplied by the gate rather than verified here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user: String,
    pub role: Role,
}
