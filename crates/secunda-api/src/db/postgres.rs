//! Postgres-backed [`Repository`]: one instance wraps one transaction.

use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::{PgConnection, Postgres, Transaction};

use secunda_core::{
    Activity, ActivityGraph, ActivityId, BoundingBox, Building, BuildingId, DirectoryError,
    LocatedOrganization, NewActivity, NewBuilding, NewOrganization, Organization,
    OrganizationFilter, OrganizationId, Page,
};

use super::{activities, buildings, organizations, store_error, Repository};

/// Open transaction. Dropping it without [`Repository::commit`] rolls back.
pub struct PgRepository {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgRepository {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx: Some(tx) }
    }

    fn conn(&mut self) -> Result<&mut PgConnection, DirectoryError> {
        match self.tx.as_mut() {
            Some(tx) => Ok(&mut **tx),
            None => Err(DirectoryError::Unexpected(
                "transaction already committed".into(),
            )),
        }
    }
}

#[async_trait]
impl ActivityGraph for PgRepository {
    async fn parent_of(
        &mut self,
        id: ActivityId,
    ) -> Result<Option<Option<ActivityId>>, DirectoryError> {
        activities::parent_of(self.conn()?, id)
            .await
            .map_err(store_error)
    }

    async fn children_of(
        &mut self,
        parents: &[ActivityId],
    ) -> Result<Vec<ActivityId>, DirectoryError> {
        if parents.is_empty() {
            return Ok(Vec::new());
        }
        activities::children_of(self.conn()?, parents)
            .await
            .map_err(store_error)
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn insert_building(&mut self, new: &NewBuilding) -> Result<Building, DirectoryError> {
        buildings::insert(self.conn()?, new)
            .await
            .map_err(store_error)
    }

    async fn get_building(&mut self, id: BuildingId) -> Result<Option<Building>, DirectoryError> {
        buildings::get_by_id(self.conn()?, id)
            .await
            .map_err(store_error)
    }

    async fn list_buildings(&mut self, page: Page) -> Result<Vec<Building>, DirectoryError> {
        buildings::list(self.conn()?, page.limit_i64(), page.offset_i64())
            .await
            .map_err(store_error)
    }

    async fn update_building(&mut self, building: &Building) -> Result<(), DirectoryError> {
        match buildings::update(self.conn()?, building).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(DirectoryError::building_not_found(building.id)),
            Err(e) => Err(store_error(e)),
        }
    }

    async fn delete_building(&mut self, id: BuildingId) -> Result<bool, DirectoryError> {
        buildings::delete(self.conn()?, id)
            .await
            .map_err(|e| match store_error(e) {
                DirectoryError::ConstraintViolation(_) => DirectoryError::ConstraintViolation(
                    format!("building {id} is still referenced by organizations"),
                ),
                other => other,
            })
    }

    async fn insert_activity(&mut self, new: &NewActivity) -> Result<Activity, DirectoryError> {
        activities::insert(self.conn()?, new)
            .await
            .map_err(store_error)
    }

    async fn get_activity(&mut self, id: ActivityId) -> Result<Option<Activity>, DirectoryError> {
        activities::get_by_id(self.conn()?, id)
            .await
            .map_err(store_error)
    }

    async fn list_activities(&mut self, page: Page) -> Result<Vec<Activity>, DirectoryError> {
        activities::list(self.conn()?, page.limit_i64(), page.offset_i64())
            .await
            .map_err(store_error)
    }

    async fn update_activity(&mut self, activity: &Activity) -> Result<(), DirectoryError> {
        match activities::update(self.conn()?, activity).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(DirectoryError::activity_not_found(activity.id)),
            Err(e) => Err(store_error(e)),
        }
    }

    async fn delete_activity(&mut self, id: ActivityId) -> Result<bool, DirectoryError> {
        activities::delete(self.conn()?, id)
            .await
            .map_err(store_error)
    }

    async fn activity_ids_named(&mut self, name: &str) -> Result<Vec<ActivityId>, DirectoryError> {
        activities::ids_named(self.conn()?, name)
            .await
            .map_err(store_error)
    }

    async fn insert_organization(
        &mut self,
        new: &NewOrganization,
    ) -> Result<Organization, DirectoryError> {
        organizations::insert(self.conn()?, new)
            .await
            .map_err(store_error)
    }

    async fn get_organization(
        &mut self,
        id: OrganizationId,
    ) -> Result<Option<Organization>, DirectoryError> {
        organizations::get_by_id(self.conn()?, id)
            .await
            .map_err(store_error)
    }

    async fn update_organization(&mut self, org: &Organization) -> Result<(), DirectoryError> {
        match organizations::update(self.conn()?, org).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(DirectoryError::organization_not_found(org.id)),
            Err(e) => Err(store_error(e)),
        }
    }

    async fn delete_organization(&mut self, id: OrganizationId) -> Result<bool, DirectoryError> {
        organizations::delete(self.conn()?, id)
            .await
            .map_err(store_error)
    }

    async fn organization_activity_ids(
        &mut self,
        id: OrganizationId,
    ) -> Result<Vec<ActivityId>, DirectoryError> {
        organizations::activity_ids(self.conn()?, id)
            .await
            .map_err(store_error)
    }

    async fn set_organization_activities(
        &mut self,
        id: OrganizationId,
        activity_ids: &BTreeSet<ActivityId>,
    ) -> Result<(), DirectoryError> {
        organizations::set_activities(self.conn()?, id, activity_ids)
            .await
            .map_err(store_error)
    }

    async fn filter_organizations(
        &mut self,
        filter: &OrganizationFilter,
        page: Page,
    ) -> Result<Vec<Organization>, DirectoryError> {
        organizations::filter(self.conn()?, filter, page)
            .await
            .map_err(store_error)
    }

    async fn organizations_with_activities(
        &mut self,
        activity_ids: &BTreeSet<ActivityId>,
        page: Page,
    ) -> Result<Vec<Organization>, DirectoryError> {
        if activity_ids.is_empty() {
            return Ok(Vec::new());
        }
        organizations::with_activities(self.conn()?, activity_ids, page)
            .await
            .map_err(store_error)
    }

    async fn organizations_in_box(
        &mut self,
        bbox: &BoundingBox,
        page: Option<Page>,
    ) -> Result<Vec<LocatedOrganization>, DirectoryError> {
        organizations::in_box(self.conn()?, bbox, page)
            .await
            .map_err(store_error)
    }

    async fn commit(&mut self) -> Result<(), DirectoryError> {
        let tx = self.tx.take().ok_or_else(|| {
            DirectoryError::Unexpected("transaction already committed".into())
        })?;
        tx.commit().await.map_err(store_error)
    }
}
