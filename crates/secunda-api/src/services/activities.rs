//! Activity tree operations. Every write goes through
//! [`hierarchy::validate_nesting`] before touching the store.

use secunda_core::hierarchy;
use secunda_core::{Activity, ActivityId, ActivityPatch, DirectoryError, NewActivity, Page};

use crate::db::Database;

#[derive(Debug, Clone)]
pub struct ActivityService {
    db: Database,
}

impl ActivityService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create an activity, as a root or under an existing parent of depth
    /// below the nesting bound.
    pub async fn create(&self, new: NewActivity) -> Result<Activity, DirectoryError> {
        new.validate()?;
        let mut repo = self.db.begin().await?;

        hierarchy::validate_nesting(&mut *repo, new.parent_id, None).await?;
        let activity = repo.insert_activity(&new).await?;
        repo.commit().await?;

        tracing::info!(
            activity_id = %activity.id,
            parent_id = ?activity.parent_id,
            "activity created"
        );
        Ok(activity)
    }

    pub async fn get(&self, id: ActivityId) -> Result<Activity, DirectoryError> {
        let mut repo = self.db.begin().await?;
        repo.get_activity(id)
            .await?
            .ok_or_else(|| DirectoryError::activity_not_found(id))
    }

    pub async fn list(&self, page: Page) -> Result<Vec<Activity>, DirectoryError> {
        let mut repo = self.db.begin().await?;
        repo.list_activities(page).await
    }

    /// Rename and/or reparent an activity.
    ///
    /// A new parent is checked with the node's whole subtree in mind, so a
    /// move can neither push a descendant past the nesting bound nor place
    /// a node under its own descendant.
    pub async fn update(
        &self,
        id: ActivityId,
        patch: ActivityPatch,
    ) -> Result<Activity, DirectoryError> {
        patch.validate()?;
        let mut repo = self.db.begin().await?;

        let mut activity = repo
            .get_activity(id)
            .await?
            .ok_or_else(|| DirectoryError::activity_not_found(id))?;

        if let Some(parent_id) = patch.parent_id {
            hierarchy::validate_nesting(&mut *repo, Some(parent_id), Some(id)).await?;
            activity.parent_id = Some(parent_id);
        }
        if let Some(name) = patch.name {
            activity.name = name;
        }

        repo.update_activity(&activity).await?;
        repo.commit().await?;

        tracing::info!(activity_id = %id, parent_id = ?activity.parent_id, "activity updated");
        Ok(activity)
    }

    /// Delete an activity together with its descendants and their
    /// organization links.
    pub async fn delete(&self, id: ActivityId) -> Result<(), DirectoryError> {
        let mut repo = self.db.begin().await?;
        if !repo.delete_activity(id).await? {
            return Err(DirectoryError::activity_not_found(id));
        }
        repo.commit().await?;

        tracing::info!(activity_id = %id, "activity deleted with its subtree");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ActivityService {
        ActivityService::new(Database::in_memory())
    }

    async fn create(svc: &ActivityService, name: &str, parent: Option<ActivityId>) -> Activity {
        svc.create(NewActivity {
            name: name.into(),
            parent_id: parent,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn three_levels_allowed_fourth_rejected() {
        let svc = service();
        let l1 = create(&svc, "L1", None).await;
        let l2 = create(&svc, "L2", Some(l1.id)).await;
        let l3 = create(&svc, "L3", Some(l2.id)).await;

        let err = svc
            .create(NewActivity {
                name: "L4".into(),
                parent_id: Some(l3.id),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DirectoryError::DepthExceeded { parent_depth: 3, .. }
        ));
        assert_eq!(svc.list(Page::default()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn unknown_parent_is_not_found() {
        let svc = service();
        let err = svc
            .create(NewActivity {
                name: "orphan".into(),
                parent_id: Some(ActivityId(404)),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound { id: 404, .. }));
    }

    #[tokio::test]
    async fn self_parent_update_is_rejected() {
        let svc = service();
        let root = create(&svc, "root", None).await;
        let err = svc
            .update(
                root.id,
                ActivityPatch {
                    name: None,
                    parent_id: Some(root.id),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::SelfParent(id) if id == root.id));
    }

    #[tokio::test]
    async fn rename_keeps_parent() {
        let svc = service();
        let root = create(&svc, "Еда", None).await;
        let child = create(&svc, "Мясо", Some(root.id)).await;
        let renamed = svc
            .update(
                child.id,
                ActivityPatch {
                    name: Some("Мясная продукция".into()),
                    parent_id: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Мясная продукция");
        assert_eq!(renamed.parent_id, Some(root.id));
        assert_eq!(svc.get(child.id).await.unwrap(), renamed);
    }

    #[tokio::test]
    async fn delete_removes_subtree() {
        let svc = service();
        let root = create(&svc, "root", None).await;
        let child = create(&svc, "child", Some(root.id)).await;
        svc.delete(root.id).await.unwrap();
        assert!(matches!(
            svc.get(child.id).await,
            Err(DirectoryError::NotFound { .. })
        ));
        assert!(svc.delete(root.id).await.is_err());
    }
}
