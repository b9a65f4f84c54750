//! # secunda-core: Domain Core for the Secunda Directory
//!
//! This crate holds everything about the directory that does not depend on
//! a transport or a storage engine. The API crate depends on it; it depends
//! on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype identifiers.** `BuildingId`, `ActivityId`, `OrganizationId`
//!    are distinct types. An organization id cannot be passed where an
//!    activity id is expected.
//!
//! 2. **The activity tree is an adjacency list.** Every traversal (depth,
//!    nesting validation, subtree expansion) is an explicit iterative
//!    algorithm over ids, driven through the [`ActivityGraph`] lookup
//!    capability. Depth is computed on demand and never stored.
//!
//! 3. **Geometry is pure.** Great-circle distance, bounding rectangles and
//!    the radius prefilter live in [`geo`] and are shared by every storage
//!    backend, so all backends agree on which organizations qualify.
//!
//! 4. **One error taxonomy.** [`DirectoryError`] carries every failure the
//!    directory reports; the HTTP layer maps it to status codes.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `secunda-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod domain;
pub mod error;
pub mod filter;
pub mod geo;
pub mod hierarchy;
pub mod identity;

pub use domain::{
    Activity, ActivityPatch, Building, BuildingPatch, LocatedOrganization, NewActivity,
    NewBuilding, NewOrganization, Organization, OrganizationDetails, OrganizationPatch,
};
pub use error::{DirectoryError, EntityKind};
pub use filter::{OrganizationFilter, Page};
pub use geo::{BoundingBox, GeoPoint, RadiusQuery};
pub use hierarchy::{ActivityGraph, MAX_DEPTH};
pub use identity::{ActivityId, BuildingId, OrganizationId};
