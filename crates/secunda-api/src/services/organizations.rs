//! Organization CRUD and the four organization queries: filter, search by
//! activity subtree, radius and box.

use std::collections::BTreeSet;

use secunda_core::hierarchy::{self, MAX_DEPTH};
use secunda_core::{
    ActivityId, BoundingBox, DirectoryError, GeoPoint, NewOrganization, Organization,
    OrganizationDetails, OrganizationFilter, OrganizationId, OrganizationPatch, Page,
    RadiusQuery,
};

use crate::db::{Database, Repository};

#[derive(Debug, Clone)]
pub struct OrganizationService {
    db: Database,
}

impl OrganizationService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create an organization in an existing building, tagged with existing
    /// activities. Unknown ids fail with `NotFound`.
    pub async fn create(&self, new: NewOrganization) -> Result<OrganizationDetails, DirectoryError> {
        new.validate()?;
        let mut repo = self.db.begin().await?;

        if repo.get_building(new.building_id).await?.is_none() {
            return Err(DirectoryError::building_not_found(new.building_id));
        }
        let activity_ids = require_activities(repo.as_mut(), &new.activity_ids).await?;

        let organization = repo.insert_organization(&new).await?;
        repo.set_organization_activities(organization.id, &activity_ids)
            .await?;
        repo.commit().await?;

        tracing::info!(
            organization_id = %organization.id,
            building_id = %organization.building_id,
            activities = activity_ids.len(),
            "organization created"
        );
        Ok(OrganizationDetails {
            organization,
            activity_ids: activity_ids.into_iter().collect(),
        })
    }

    pub async fn get(&self, id: OrganizationId) -> Result<OrganizationDetails, DirectoryError> {
        let mut repo = self.db.begin().await?;
        let organization = repo
            .get_organization(id)
            .await?
            .ok_or_else(|| DirectoryError::organization_not_found(id))?;
        let activity_ids = repo.organization_activity_ids(id).await?;
        Ok(OrganizationDetails {
            organization,
            activity_ids,
        })
    }

    /// Apply a partial update. `activity_ids`, when present, replaces the
    /// whole association set.
    pub async fn update(
        &self,
        id: OrganizationId,
        patch: OrganizationPatch,
    ) -> Result<OrganizationDetails, DirectoryError> {
        patch.validate()?;
        let mut repo = self.db.begin().await?;

        let mut organization = repo
            .get_organization(id)
            .await?
            .ok_or_else(|| DirectoryError::organization_not_found(id))?;

        if let Some(building_id) = patch.building_id {
            if repo.get_building(building_id).await?.is_none() {
                return Err(DirectoryError::building_not_found(building_id));
            }
            organization.building_id = building_id;
        }
        if let Some(name) = patch.name {
            organization.name = name;
        }
        if let Some(phones) = patch.phones {
            organization.phones = phones;
        }
        repo.update_organization(&organization).await?;

        if let Some(requested) = patch.activity_ids {
            let activity_ids = require_activities(repo.as_mut(), &requested).await?;
            repo.set_organization_activities(id, &activity_ids).await?;
        }
        let activity_ids = repo.organization_activity_ids(id).await?;
        repo.commit().await?;

        tracing::info!(organization_id = %id, "organization updated");
        Ok(OrganizationDetails {
            organization,
            activity_ids,
        })
    }

    pub async fn delete(&self, id: OrganizationId) -> Result<(), DirectoryError> {
        let mut repo = self.db.begin().await?;
        if !repo.delete_organization(id).await? {
            return Err(DirectoryError::organization_not_found(id));
        }
        repo.commit().await?;

        tracing::info!(organization_id = %id, "organization deleted");
        Ok(())
    }

    /// Organizations matching every given predicate. An empty filter lists
    /// all organizations.
    pub async fn filter(
        &self,
        filter: &OrganizationFilter,
        page: Page,
    ) -> Result<Vec<Organization>, DirectoryError> {
        filter.validate()?;
        let mut repo = self.db.begin().await?;
        repo.filter_organizations(filter, page).await
    }

    /// Organizations tagged with an activity named `activity_name` (case
    /// insensitive, exact) or any of its descendants.
    ///
    /// No activity with that name yields an empty result.
    pub async fn search_by_activity_name(
        &self,
        activity_name: &str,
        page: Page,
    ) -> Result<Vec<Organization>, DirectoryError> {
        if activity_name.trim().is_empty() {
            return Err(DirectoryError::Validation(
                "activity_name must not be empty".into(),
            ));
        }
        let mut repo = self.db.begin().await?;

        let roots = repo.activity_ids_named(activity_name).await?;
        if roots.is_empty() {
            tracing::debug!(activity_name, "no activity with that name");
            return Ok(Vec::new());
        }
        let subtree = hierarchy::expand_subtree(repo.as_mut(), &roots, MAX_DEPTH).await?;
        tracing::debug!(
            activity_name,
            roots = roots.len(),
            subtree = subtree.len(),
            "expanded activity subtree"
        );
        repo.organizations_with_activities(&subtree, page).await
    }

    /// Organizations whose building lies within `radius_m` meters of the
    /// center, by great-circle distance.
    pub async fn nearby_radius(
        &self,
        center_lat: f64,
        center_lon: f64,
        radius_m: f64,
        page: Page,
    ) -> Result<Vec<Organization>, DirectoryError> {
        let query = RadiusQuery::new(GeoPoint::new(center_lat, center_lon)?, radius_m)?;
        let mut repo = self.db.begin().await?;

        let candidates = repo
            .organizations_in_box(&query.bounding_box(), None)
            .await?;
        let within = candidates
            .into_iter()
            .filter(|c| query.contains(c.location))
            .map(|c| c.organization);
        Ok(page.apply(within))
    }

    /// Organizations whose building lies inside the rectangle, bounds
    /// included.
    pub async fn nearby_box(
        &self,
        bbox: BoundingBox,
        page: Page,
    ) -> Result<Vec<Organization>, DirectoryError> {
        let mut repo = self.db.begin().await?;
        let located = repo.organizations_in_box(&bbox, Some(page)).await?;
        Ok(located.into_iter().map(|l| l.organization).collect())
    }
}

/// Deduplicate `ids` and check that each names an existing activity.
async fn require_activities(
    repo: &mut dyn Repository,
    ids: &[ActivityId],
) -> Result<BTreeSet<ActivityId>, DirectoryError> {
    let ids: BTreeSet<ActivityId> = ids.iter().copied().collect();
    for id in &ids {
        if repo.get_activity(*id).await?.is_none() {
            return Err(DirectoryError::activity_not_found(*id));
        }
    }
    Ok(ids)
}
