//! # Directory Records
//!
//! The three directory entities, their construction requests, and partial
//! updates. Field constraints are checked by the `validate` methods before
//! any store access.

use serde::{Deserialize, Serialize};

use crate::error::DirectoryError;
use crate::geo::GeoPoint;
use crate::identity::{ActivityId, BuildingId, OrganizationId};

/// Maximum activity name length, in characters.
pub const ACTIVITY_NAME_MAX_LEN: usize = 128;

/// Maximum building address length, in characters.
pub const ADDRESS_MAX_LEN: usize = 255;

/// Maximum organization name length, in characters.
pub const ORGANIZATION_NAME_MAX_LEN: usize = 255;

/// A physical building organizations are located in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Building {
    pub fn location(&self) -> GeoPoint {
        GeoPoint {
            lat: self.latitude,
            lon: self.longitude,
        }
    }
}

/// A node of the activity taxonomy.
///
/// Depth is deliberately absent: it is a function of the parent chain and
/// is computed by [`crate::hierarchy::depth`] whenever it is needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub name: String,
    pub parent_id: Option<ActivityId>,
}

/// An organization, located in exactly one building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    /// Stored and returned as given, order preserved.
    pub phones: Vec<String>,
    pub building_id: BuildingId,
}

/// An organization together with the ids of the activities it is tagged with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationDetails {
    #[serde(flatten)]
    pub organization: Organization,
    pub activity_ids: Vec<ActivityId>,
}

/// An organization joined to the coordinates of its building.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedOrganization {
    pub organization: Organization,
    pub location: GeoPoint,
}

// -- Construction requests ----------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBuilding {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl NewBuilding {
    pub fn validate(&self) -> Result<(), DirectoryError> {
        validate_text("address", &self.address, ADDRESS_MAX_LEN)?;
        GeoPoint::new(self.latitude, self.longitude)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewActivity {
    pub name: String,
    pub parent_id: Option<ActivityId>,
}

impl NewActivity {
    pub fn validate(&self) -> Result<(), DirectoryError> {
        validate_text("name", &self.name, ACTIVITY_NAME_MAX_LEN)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    pub building_id: BuildingId,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub activity_ids: Vec<ActivityId>,
}

impl NewOrganization {
    pub fn validate(&self) -> Result<(), DirectoryError> {
        validate_text("name", &self.name, ORGANIZATION_NAME_MAX_LEN)
    }
}

// -- Partial updates ----------------------------------------------------------
//
// `None` leaves a field unchanged. There is no way to clear an activity's
// parent through a patch; a root stays a root and a child stays a child.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingPatch {
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl BuildingPatch {
    pub fn validate(&self) -> Result<(), DirectoryError> {
        if let Some(address) = &self.address {
            validate_text("address", address, ADDRESS_MAX_LEN)?;
        }
        if let Some(lat) = self.latitude {
            GeoPoint::validate_latitude(lat)?;
        }
        if let Some(lon) = self.longitude {
            GeoPoint::validate_longitude(lon)?;
        }
        Ok(())
    }

    pub fn apply(self, building: &mut Building) {
        if let Some(address) = self.address {
            building.address = address;
        }
        if let Some(lat) = self.latitude {
            building.latitude = lat;
        }
        if let Some(lon) = self.longitude {
            building.longitude = lon;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityPatch {
    pub name: Option<String>,
    pub parent_id: Option<ActivityId>,
}

impl ActivityPatch {
    pub fn validate(&self) -> Result<(), DirectoryError> {
        if let Some(name) = &self.name {
            validate_text("name", name, ACTIVITY_NAME_MAX_LEN)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationPatch {
    pub name: Option<String>,
    pub building_id: Option<BuildingId>,
    pub phones: Option<Vec<String>>,
    /// When present, replaces the organization's whole activity set.
    pub activity_ids: Option<Vec<ActivityId>>,
}

impl OrganizationPatch {
    pub fn validate(&self) -> Result<(), DirectoryError> {
        if let Some(name) = &self.name {
            validate_text("name", name, ORGANIZATION_NAME_MAX_LEN)?;
        }
        Ok(())
    }
}

/// Reject blank values and values longer than `max_len` characters.
fn validate_text(field: &str, value: &str, max_len: usize) -> Result<(), DirectoryError> {
    if value.trim().is_empty() {
        return Err(DirectoryError::Validation(format!(
            "{field} must not be empty"
        )));
    }
    let len = value.chars().count();
    if len > max_len {
        return Err(DirectoryError::Validation(format!(
            "{field} must be at most {max_len} characters, got {len}"
        )));
    }
    Ok(())
}
