//! In-memory [`Repository`] used when no database is configured.
//!
//! A transaction holds the store's lock from [`MemoryDatabase::begin`]
//! until it commits or is dropped, so transactions run one at a time and
//! always start from the latest committed state. Writes go to a private
//! working copy; [`Repository::commit`] publishes it, dropping discards
//! it. The referential rules of the SQL schema (foreign keys, restrict,
//! cascade) are enforced here by hand so both backends report the same
//! errors.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use secunda_core::filter::eq_ignore_case;
use secunda_core::{
    Activity, ActivityGraph, ActivityId, BoundingBox, Building, BuildingId, DirectoryError,
    LocatedOrganization, NewActivity, NewBuilding, NewOrganization, Organization,
    OrganizationFilter, OrganizationId, Page,
};

use super::Repository;

#[derive(Debug, Clone, Default)]
struct Tables {
    buildings: BTreeMap<BuildingId, Building>,
    activities: BTreeMap<ActivityId, Activity>,
    organizations: BTreeMap<OrganizationId, Organization>,
    /// Association rows, ordered by organization then activity.
    links: BTreeSet<(OrganizationId, ActivityId)>,
    last_building_id: i64,
    last_activity_id: i64,
    last_organization_id: i64,
}

impl Tables {
    fn activity_ids_of(&self, org: OrganizationId) -> impl Iterator<Item = ActivityId> + '_ {
        self.links
            .range((org, ActivityId(i64::MIN))..=(org, ActivityId(i64::MAX)))
            .map(|(_, activity)| *activity)
    }

    fn require_building(&self, id: BuildingId) -> Result<(), DirectoryError> {
        if self.buildings.contains_key(&id) {
            Ok(())
        } else {
            Err(DirectoryError::ConstraintViolation(format!(
                "building {id} does not exist"
            )))
        }
    }

    fn require_activity(&self, id: ActivityId) -> Result<(), DirectoryError> {
        if self.activities.contains_key(&id) {
            Ok(())
        } else {
            Err(DirectoryError::ConstraintViolation(format!(
                "activity {id} does not exist"
            )))
        }
    }
}

/// Shared in-memory tables. Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryDatabase {
    /// Wait for exclusive access to the tables and open a transaction.
    pub async fn begin(&self) -> MemoryRepository {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let working = guard.clone();
        MemoryRepository {
            guard: Some(guard),
            working,
        }
    }
}

/// One transaction: the store lock plus a working copy of the tables.
///
/// The lock is released on commit or drop.
pub struct MemoryRepository {
    guard: Option<OwnedMutexGuard<Tables>>,
    working: Tables,
}

impl MemoryRepository {
    fn tables(&mut self) -> Result<&mut Tables, DirectoryError> {
        if self.guard.is_none() {
            return Err(DirectoryError::Unexpected(
                "transaction already committed".into(),
            ));
        }
        Ok(&mut self.working)
    }
}

#[async_trait]
impl ActivityGraph for MemoryRepository {
    async fn parent_of(
        &mut self,
        id: ActivityId,
    ) -> Result<Option<Option<ActivityId>>, DirectoryError> {
        Ok(self.tables()?.activities.get(&id).map(|a| a.parent_id))
    }

    async fn children_of(
        &mut self,
        parents: &[ActivityId],
    ) -> Result<Vec<ActivityId>, DirectoryError> {
        let parents: HashSet<ActivityId> = parents.iter().copied().collect();
        Ok(self
            .tables()?
            .activities
            .values()
            .filter(|a| a.parent_id.map_or(false, |p| parents.contains(&p)))
            .map(|a| a.id)
            .collect())
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn insert_building(&mut self, new: &NewBuilding) -> Result<Building, DirectoryError> {
        let t = self.tables()?;
        t.last_building_id += 1;
        let building = Building {
            id: BuildingId(t.last_building_id),
            address: new.address.clone(),
            latitude: new.latitude,
            longitude: new.longitude,
        };
        t.buildings.insert(building.id, building.clone());
        Ok(building)
    }

    async fn get_building(&mut self, id: BuildingId) -> Result<Option<Building>, DirectoryError> {
        Ok(self.tables()?.buildings.get(&id).cloned())
    }

    async fn list_buildings(&mut self, page: Page) -> Result<Vec<Building>, DirectoryError> {
        Ok(page.apply(self.tables()?.buildings.values().cloned()))
    }

    async fn update_building(&mut self, building: &Building) -> Result<(), DirectoryError> {
        let slot = self
            .tables()?
            .buildings
            .get_mut(&building.id)
            .ok_or_else(|| DirectoryError::building_not_found(building.id))?;
        *slot = building.clone();
        Ok(())
    }

    async fn delete_building(&mut self, id: BuildingId) -> Result<bool, DirectoryError> {
        let t = self.tables()?;
        if !t.buildings.contains_key(&id) {
            return Ok(false);
        }
        if t.organizations.values().any(|o| o.building_id == id) {
            return Err(DirectoryError::ConstraintViolation(format!(
                "building {id} is still referenced by organizations"
            )));
        }
        t.buildings.remove(&id);
        Ok(true)
    }

    async fn insert_activity(&mut self, new: &NewActivity) -> Result<Activity, DirectoryError> {
        let t = self.tables()?;
        if let Some(parent) = new.parent_id {
            t.require_activity(parent)?;
        }
        t.last_activity_id += 1;
        let activity = Activity {
            id: ActivityId(t.last_activity_id),
            name: new.name.clone(),
            parent_id: new.parent_id,
        };
        t.activities.insert(activity.id, activity.clone());
        Ok(activity)
    }

    async fn get_activity(&mut self, id: ActivityId) -> Result<Option<Activity>, DirectoryError> {
        Ok(self.tables()?.activities.get(&id).cloned())
    }

    async fn list_activities(&mut self, page: Page) -> Result<Vec<Activity>, DirectoryError> {
        Ok(page.apply(self.tables()?.activities.values().cloned()))
    }

    async fn update_activity(&mut self, activity: &Activity) -> Result<(), DirectoryError> {
        let t = self.tables()?;
        if let Some(parent) = activity.parent_id {
            t.require_activity(parent)?;
        }
        let slot = t
            .activities
            .get_mut(&activity.id)
            .ok_or_else(|| DirectoryError::activity_not_found(activity.id))?;
        *slot = activity.clone();
        Ok(())
    }

    async fn delete_activity(&mut self, id: ActivityId) -> Result<bool, DirectoryError> {
        if !self.tables()?.activities.contains_key(&id) {
            return Ok(false);
        }
        // Cascade: the node, every descendant, and their links.
        let doomed = secunda_core::hierarchy::expand_subtree(self, &[id], usize::MAX).await?;
        let t = self.tables()?;
        t.activities.retain(|k, _| !doomed.contains(k));
        t.links.retain(|(_, activity)| !doomed.contains(activity));
        Ok(true)
    }

    async fn activity_ids_named(&mut self, name: &str) -> Result<Vec<ActivityId>, DirectoryError> {
        Ok(self
            .tables()?
            .activities
            .values()
            .filter(|a| eq_ignore_case(&a.name, name))
            .map(|a| a.id)
            .collect())
    }

    async fn insert_organization(
        &mut self,
        new: &NewOrganization,
    ) -> Result<Organization, DirectoryError> {
        let t = self.tables()?;
        t.require_building(new.building_id)?;
        t.last_organization_id += 1;
        let org = Organization {
            id: OrganizationId(t.last_organization_id),
            name: new.name.clone(),
            phones: new.phones.clone(),
            building_id: new.building_id,
        };
        t.organizations.insert(org.id, org.clone());
        Ok(org)
    }

    async fn get_organization(
        &mut self,
        id: OrganizationId,
    ) -> Result<Option<Organization>, DirectoryError> {
        Ok(self.tables()?.organizations.get(&id).cloned())
    }

    async fn update_organization(&mut self, org: &Organization) -> Result<(), DirectoryError> {
        let t = self.tables()?;
        t.require_building(org.building_id)?;
        let slot = t
            .organizations
            .get_mut(&org.id)
            .ok_or_else(|| DirectoryError::organization_not_found(org.id))?;
        *slot = org.clone();
        Ok(())
    }

    async fn delete_organization(&mut self, id: OrganizationId) -> Result<bool, DirectoryError> {
        let t = self.tables()?;
        if t.organizations.remove(&id).is_none() {
            return Ok(false);
        }
        t.links.retain(|(org, _)| *org != id);
        Ok(true)
    }

    async fn organization_activity_ids(
        &mut self,
        id: OrganizationId,
    ) -> Result<Vec<ActivityId>, DirectoryError> {
        Ok(self.tables()?.activity_ids_of(id).collect())
    }

    async fn set_organization_activities(
        &mut self,
        id: OrganizationId,
        activity_ids: &BTreeSet<ActivityId>,
    ) -> Result<(), DirectoryError> {
        let t = self.tables()?;
        if !t.organizations.contains_key(&id) {
            return Err(DirectoryError::ConstraintViolation(format!(
                "organization {id} does not exist"
            )));
        }
        for activity in activity_ids {
            t.require_activity(*activity)?;
        }
        t.links.retain(|(org, _)| *org != id);
        t.links.extend(activity_ids.iter().map(|a| (id, *a)));
        Ok(())
    }

    async fn filter_organizations(
        &mut self,
        filter: &OrganizationFilter,
        page: Page,
    ) -> Result<Vec<Organization>, DirectoryError> {
        let t = &*self.tables()?;
        let matches = t.organizations.values().filter(|org| {
            filter.matches_organization(org)
                && (filter.activity_name.is_none()
                    || t.activity_ids_of(org.id).any(|a| {
                        t.activities
                            .get(&a)
                            .map_or(false, |activity| filter.matches_activity_name(&activity.name))
                    }))
        });
        Ok(page.apply(matches.cloned()))
    }

    async fn organizations_with_activities(
        &mut self,
        activity_ids: &BTreeSet<ActivityId>,
        page: Page,
    ) -> Result<Vec<Organization>, DirectoryError> {
        let t = &*self.tables()?;
        let matches = t
            .organizations
            .values()
            .filter(|org| t.activity_ids_of(org.id).any(|a| activity_ids.contains(&a)));
        Ok(page.apply(matches.cloned()))
    }

    async fn organizations_in_box(
        &mut self,
        bbox: &BoundingBox,
        page: Option<Page>,
    ) -> Result<Vec<LocatedOrganization>, DirectoryError> {
        let t = &*self.tables()?;
        let located = t.organizations.values().filter_map(|org| {
            let location = t.buildings.get(&org.building_id)?.location();
            bbox.contains(location).then(|| LocatedOrganization {
                organization: org.clone(),
                location,
            })
        });
        Ok(match page {
            Some(page) => page.apply(located),
            None => located.collect(),
        })
    }

    async fn commit(&mut self) -> Result<(), DirectoryError> {
        let mut guard = self.guard.take().ok_or_else(|| {
            DirectoryError::Unexpected("transaction already committed".into())
        })?;
        *guard = std::mem::take(&mut self.working);
        Ok(())
    }
}
