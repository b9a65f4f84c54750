//! Building operations.

use secunda_core::{Building, BuildingId, BuildingPatch, DirectoryError, NewBuilding, Page};

use crate::db::Database;

#[derive(Debug, Clone)]
pub struct BuildingService {
    db: Database,
}

impl BuildingService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, new: NewBuilding) -> Result<Building, DirectoryError> {
        new.validate()?;
        let mut repo = self.db.begin().await?;
        let building = repo.insert_building(&new).await?;
        repo.commit().await?;

        tracing::info!(building_id = %building.id, "building created");
        Ok(building)
    }

    pub async fn get(&self, id: BuildingId) -> Result<Building, DirectoryError> {
        let mut repo = self.db.begin().await?;
        repo.get_building(id)
            .await?
            .ok_or_else(|| DirectoryError::building_not_found(id))
    }

    pub async fn list(&self, page: Page) -> Result<Vec<Building>, DirectoryError> {
        let mut repo = self.db.begin().await?;
        repo.list_buildings(page).await
    }

    pub async fn update(
        &self,
        id: BuildingId,
        patch: BuildingPatch,
    ) -> Result<Building, DirectoryError> {
        patch.validate()?;
        let mut repo = self.db.begin().await?;
        let mut building = repo
            .get_building(id)
            .await?
            .ok_or_else(|| DirectoryError::building_not_found(id))?;

        patch.apply(&mut building);
        repo.update_building(&building).await?;
        repo.commit().await?;

        tracing::info!(building_id = %id, "building updated");
        Ok(building)
    }

    /// Delete a building. Fails with `ConstraintViolation` while any
    /// organization is located in it.
    pub async fn delete(&self, id: BuildingId) -> Result<(), DirectoryError> {
        let mut repo = self.db.begin().await?;
        if !repo.delete_building(id).await? {
            return Err(DirectoryError::building_not_found(id));
        }
        repo.commit().await?;

        tracing::info!(building_id = %id, "building deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lenina() -> NewBuilding {
        NewBuilding {
            address: "г. Москва, ул. Ленина 1".into(),
            latitude: 55.7558,
            longitude: 37.6176,
        }
    }

    #[tokio::test]
    async fn create_get_update_delete() {
        let svc = BuildingService::new(Database::in_memory());
        let b = svc.create(lenina()).await.unwrap();
        assert_eq!(svc.get(b.id).await.unwrap(), b);

        let moved = svc
            .update(
                b.id,
                BuildingPatch {
                    address: Some("г. Москва, ул. Тверская 10".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.address, "г. Москва, ул. Тверская 10");
        assert_eq!(moved.latitude, b.latitude);

        svc.delete(b.id).await.unwrap();
        assert!(matches!(
            svc.get(b.id).await,
            Err(DirectoryError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn invalid_coordinates_never_reach_the_store() {
        let svc = BuildingService::new(Database::in_memory());
        let err = svc
            .create(NewBuilding {
                latitude: 120.0,
                ..lenina()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Validation(_)));
        assert!(svc.list(Page::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_is_ordered_and_paged() {
        let svc = BuildingService::new(Database::in_memory());
        for _ in 0..5 {
            svc.create(lenina()).await.unwrap();
        }
        let page = svc.list(Page::new(1, 2).unwrap()).await.unwrap();
        let ids: Vec<i64> = page.iter().map(|b| b.id.get()).collect();
        assert_eq!(ids, vec![2, 3]);
    }
}
