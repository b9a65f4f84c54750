//! # Organization Filters and Pagination
//!
//! [`OrganizationFilter`] is the optional-predicate set for organization
//! lookups. Every present predicate is ANDed; absent predicates impose no
//! restriction. Stores translate it into a query; the `matches_*` helpers
//! are the reference semantics that the in-memory store evaluates directly.

use serde::{Deserialize, Serialize};

use crate::domain::Organization;
use crate::error::DirectoryError;
use crate::identity::{BuildingId, OrganizationId};

/// Default page size when the caller gives none.
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// Largest page a caller may request.
pub const MAX_PAGE_LIMIT: u32 = 1000;

/// Offset/limit window, applied after filtering over results ordered by
/// primary key ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub offset: u64,
    pub limit: u32,
}

impl Page {
    pub fn new(offset: u64, limit: u32) -> Result<Self, DirectoryError> {
        if limit > MAX_PAGE_LIMIT {
            return Err(DirectoryError::Validation(format!(
                "limit must be at most {MAX_PAGE_LIMIT}, got {limit}"
            )));
        }
        Ok(Self { offset, limit })
    }

    /// Slice an already ordered sequence down to this window.
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let offset = usize::try_from(self.offset).unwrap_or(usize::MAX);
        items
            .into_iter()
            .skip(offset)
            .take(self.limit as usize)
            .collect()
    }

    /// Offset as a signed SQL parameter.
    pub fn offset_i64(&self) -> i64 {
        i64::try_from(self.offset).unwrap_or(i64::MAX)
    }

    /// Limit as a signed SQL parameter.
    pub fn limit_i64(&self) -> i64 {
        i64::from(self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Optional predicates for organization lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationFilter {
    /// Exact organization id.
    pub organization_id: Option<OrganizationId>,
    /// Case-insensitive substring of the organization name.
    pub organization_name: Option<String>,
    /// Exact building id.
    pub building_id: Option<BuildingId>,
    /// Case-insensitive substring of the name of any tagged activity.
    pub activity_name: Option<String>,
}

impl OrganizationFilter {
    /// Text predicates, when given, must not be empty.
    pub fn validate(&self) -> Result<(), DirectoryError> {
        for (field, value) in [
            ("organization_name", &self.organization_name),
            ("activity_name", &self.activity_name),
        ] {
            if matches!(value, Some(v) if v.is_empty()) {
                return Err(DirectoryError::Validation(format!(
                    "{field} must not be empty when given"
                )));
            }
        }
        Ok(())
    }

    /// Evaluate the predicates that only look at the organization row.
    pub fn matches_organization(&self, org: &Organization) -> bool {
        if let Some(id) = self.organization_id {
            if org.id != id {
                return false;
            }
        }
        if let Some(building_id) = self.building_id {
            if org.building_id != building_id {
                return false;
            }
        }
        if let Some(name) = &self.organization_name {
            if !contains_ignore_case(&org.name, name) {
                return false;
            }
        }
        true
    }

    /// Evaluate the activity-name predicate against one activity name.
    /// Always true when no activity predicate is set.
    pub fn matches_activity_name(&self, activity_name: &str) -> bool {
        match &self.activity_name {
            Some(needle) => contains_ignore_case(activity_name, needle),
            None => true,
        }
    }
}

/// Case-insensitive substring test using Unicode lowercase mapping.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Case-insensitive equality using Unicode lowercase mapping.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
