//! Core types for tracked vehicles.

use crate::error::FleetError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a tracked driver. Stable for the unit's lifetime.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverId(pub u64);

impl fmt::Debug for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DriverId({})", self.0)
    }
}

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Availability of a driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DriverStatus {
    #[default]
    Idle,
    Busy,
    Offline,
}

impl DriverStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverStatus::Idle => "idle",
            DriverStatus::Busy => "busy",
            DriverStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverStatus {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "idle" => Ok(DriverStatus::Idle),
            "busy" => Ok(DriverStatus::Busy),
            "offline" => Ok(DriverStatus::Offline),
            _ => Err(FleetError::UnknownStatus(s.to_string())),
        }
    }
}

/// Geographic position. Not range-checked.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Latest known state of one driver.
///
/// At most one record per id lives in the cache; a newer publish replaces
/// the whole record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    pub id: DriverId,
    pub name: String,
    pub status: DriverStatus,
    /// Serialized as top-level `latitude` / `longitude`.
    #[serde(flatten)]
    pub position: Position,
    /// Degrees.
    pub heading: f64,
    pub speed: f64,
    /// Time of the last mutation, ISO-8601 on the wire.
    pub updated_at: DateTime<Utc>,
}

impl LocationRecord {
    /// Whether every numeric field is finite. JSON has no NaN or infinity.
    pub fn is_finite(&self) -> bool {
        self.position.latitude.is_finite()
            && self.position.longitude.is_finite()
            && self.heading.is_finite()
            && self.speed.is_finite()
    }
}

/// Producer-side input to a publish.
///
/// Only the id and position are required. Missing fields take the same
/// defaults a driver app posting a bare coordinate would get.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdate {
    pub id: DriverId,
    #[serde(flatten)]
    pub position: Position,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<DriverStatus>,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
    /// Authoritative when present; the publish time is used otherwise.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl LocationUpdate {
    pub fn new(id: DriverId, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            position: Position::new(latitude, longitude),
            name: None,
            status: None,
            heading: None,
            speed: None,
            updated_at: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn status(mut self, status: DriverStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    /// Fill defaults and produce the record to store.
    ///
    /// `now` is only used when the producer did not supply a timestamp.
    pub fn into_record(self, now: DateTime<Utc>) -> LocationRecord {
        LocationRecord {
            id: self.id,
            name: self
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("Driver {}", self.id)),
            status: self.status.unwrap_or_default(),
            position: self.position,
            heading: self.heading.unwrap_or(0.0),
            speed: self.speed.unwrap_or(0.0),
            updated_at: self.updated_at.unwrap_or(now),
        }
    }
}

impl From<LocationRecord> for LocationUpdate {
    fn from(record: LocationRecord) -> Self {
        Self {
            id: record.id,
            position: record.position,
            name: Some(record.name),
            status: Some(record.status),
            heading: Some(record.heading),
            speed: Some(record.speed),
            updated_at: Some(record.updated_at),
        }
    }
}
