//! # Directory Identifiers
//!
//! Newtype wrappers for the surrogate keys of the three directory entities.
//! Keys are assigned by the store on insert and never change afterwards.

use serde::{Deserialize, Serialize};

/// Surrogate key of a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildingId(pub i64);

/// Surrogate key of an activity node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub i64);

/// Surrogate key of an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationId(pub i64);

macro_rules! impl_id {
    ($ty:ident) => {
        impl $ty {
            /// Access the raw key.
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

impl_id!(BuildingId);
impl_id!(ActivityId);
impl_id!(OrganizationId);
