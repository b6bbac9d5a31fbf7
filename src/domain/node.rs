//! Node Records
//!
//! Structured identity and position payloads for a single mesh node, plus the
//! record the registry stores for it.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::validation::ValidationError;

/// Scale between integer coordinate units and degrees
pub const COORDINATE_SCALE: f64 = 1e7;

// =============================================================================
// Node Number
// =============================================================================

/// Network-wide node identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeNum(pub u32);

impl NodeNum {
    pub const fn new(num: u32) -> Self {
        Self(num)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Renders in the mesh's `!xxxxxxxx` form
impl fmt::Display for NodeNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "!{:08x}", self.0)
    }
}

impl From<u32> for NodeNum {
    fn from(num: u32) -> Self {
        Self(num)
    }
}

impl From<NodeNum> for u32 {
    fn from(num: NodeNum) -> Self {
        num.0
    }
}

/// Accepts `!1a2b3c4d`, `0x1a2b3c4d`, or plain decimal
impl FromStr for NodeNum {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = if let Some(hex) = trimmed.strip_prefix('!') {
            u32::from_str_radix(hex, 16)
        } else if let Some(hex) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            u32::from_str_radix(hex, 16)
        } else {
            trimmed.parse::<u32>()
        };

        parsed.map(NodeNum).map_err(|_| ValidationError::MalformedNodeNum {
            input: s.to_string(),
        })
    }
}

// =============================================================================
// Identity
// =============================================================================

/// Human-facing identity a node announces about itself
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeIdentity {
    /// Hardware id string, conventionally `!` followed by hex
    pub id: String,
    pub long_name: String,
    pub short_name: String,
    /// Raw MAC address bytes (empty when not announced)
    pub macaddr: Vec<u8>,
    /// Hardware model name as reported by the decoder
    pub hw_model: String,
    /// Operator holds an amateur radio licence
    pub is_licensed: bool,
}

impl NodeIdentity {
    /// Create an identity carrying only an id
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// The id, if one was announced
    pub fn id(&self) -> Option<&str> {
        if self.id.is_empty() {
            None
        } else {
            Some(&self.id)
        }
    }

    /// Best name to show a user: long name, then short name, then id
    pub fn display_name(&self) -> Option<&str> {
        [&self.long_name, &self.short_name, &self.id]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
    }
}

// =============================================================================
// Position
// =============================================================================

/// Last-known location of a node
///
/// Coordinates are integers in units of 1e-7 degrees, matching the wire form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodePosition {
    pub latitude_i: Option<i32>,
    pub longitude_i: Option<i32>,
    /// Metres above mean sea level
    pub altitude: Option<i32>,
    /// Fix time, seconds since the Unix epoch
    pub time: Option<u32>,
}

impl NodePosition {
    /// Build a position from degrees, rounding to the integer wire units
    pub fn from_degrees(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude_i: Some((latitude * COORDINATE_SCALE).round() as i32),
            longitude_i: Some((longitude * COORDINATE_SCALE).round() as i32),
            ..Default::default()
        }
    }

    pub fn with_altitude(mut self, altitude: i32) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn with_time(mut self, time: u32) -> Self {
        self.time = Some(time);
        self
    }

    /// Latitude in degrees
    pub fn latitude(&self) -> Option<f64> {
        self.latitude_i.map(|v| f64::from(v) / COORDINATE_SCALE)
    }

    /// Longitude in degrees
    pub fn longitude(&self) -> Option<f64> {
        self.longitude_i.map(|v| f64::from(v) / COORDINATE_SCALE)
    }

    /// Fix time as a UTC timestamp
    pub fn fix_time(&self) -> Option<DateTime<Utc>> {
        self.time
            .and_then(|t| Utc.timestamp_opt(i64::from(t), 0).single())
    }

    /// Whether both coordinates are known
    pub fn has_fix(&self) -> bool {
        self.latitude_i.is_some() && self.longitude_i.is_some()
    }
}

// =============================================================================
// Node Record
// =============================================================================

/// Everything the registry knows about one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    /// Primary key
    pub number: NodeNum,
    /// `None` until an identity has been received
    #[serde(default)]
    pub identity: Option<NodeIdentity>,
    /// `None` until a position has been received
    #[serde(default)]
    pub position: Option<NodePosition>,
}

impl NodeRecord {
    /// A record with neither identity nor position
    pub fn new(number: impl Into<NodeNum>) -> Self {
        Self {
            number: number.into(),
            identity: None,
            position: None,
        }
    }

    pub fn with_identity(mut self, identity: NodeIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_position(mut self, position: NodePosition) -> Self {
        self.position = Some(position);
        self
    }

    /// The identity id, if an identity with a non-empty id is present
    pub fn identity_id(&self) -> Option<&str> {
        self.identity.as_ref().and_then(NodeIdentity::id)
    }

    /// Display name, falling back to the node number
    pub fn display_name(&self) -> String {
        self.identity
            .as_ref()
            .and_then(NodeIdentity::display_name)
            .map(str::to_string)
            .unwrap_or_else(|| self.number.to_string())
    }
}
