//! Activity persistence operations.
//!
//! Nesting depth is enforced by the service layer through
//! `secunda_core::hierarchy`, not in SQL. The schema only guarantees that
//! parents exist and that deleting a node cascades to its descendants.

use sqlx::PgConnection;

use secunda_core::{Activity, ActivityId, NewActivity};

/// Insert an activity and return it with its assigned id.
pub async fn insert(conn: &mut PgConnection, new: &NewActivity) -> Result<Activity, sqlx::Error> {
    let row = sqlx::query_as::<_, ActivityRow>(
        "INSERT INTO activity (name, parent_id) VALUES ($1, $2) RETURNING id, name, parent_id",
    )
    .bind(&new.name)
    .bind(new.parent_id.map(ActivityId::get))
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.into_record())
}

pub async fn get_by_id(
    conn: &mut PgConnection,
    id: ActivityId,
) -> Result<Option<Activity>, sqlx::Error> {
    let row = sqlx::query_as::<_, ActivityRow>(
        "SELECT id, name, parent_id FROM activity WHERE id = $1",
    )
    .bind(id.get())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(ActivityRow::into_record))
}

pub async fn list(
    conn: &mut PgConnection,
    limit: i64,
    offset: i64,
) -> Result<Vec<Activity>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ActivityRow>(
        "SELECT id, name, parent_id FROM activity ORDER BY id LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(ActivityRow::into_record).collect())
}

pub async fn update(conn: &mut PgConnection, activity: &Activity) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE activity SET name = $1, parent_id = $2 WHERE id = $3")
        .bind(&activity.name)
        .bind(activity.parent_id.map(ActivityId::get))
        .bind(activity.id.get())
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete an activity. Descendants and organization links go with it.
pub async fn delete(conn: &mut PgConnection, id: ActivityId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM activity WHERE id = $1")
        .bind(id.get())
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Parent link of one activity: `None` if the row is missing.
pub async fn parent_of(
    conn: &mut PgConnection,
    id: ActivityId,
) -> Result<Option<Option<ActivityId>>, sqlx::Error> {
    let row: Option<(Option<i64>,)> =
        sqlx::query_as("SELECT parent_id FROM activity WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&mut *conn)
            .await?;

    Ok(row.map(|(parent,)| parent.map(ActivityId)))
}

/// Ids of the direct children of any of `parents`.
pub async fn children_of(
    conn: &mut PgConnection,
    parents: &[ActivityId],
) -> Result<Vec<ActivityId>, sqlx::Error> {
    let parents: Vec<i64> = parents.iter().map(|id| id.get()).collect();
    let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM activity WHERE parent_id = ANY($1)")
        .bind(&parents)
        .fetch_all(&mut *conn)
        .await?;

    Ok(ids.into_iter().map(ActivityId).collect())
}

/// Ids of activities whose name equals `name`, ignoring case.
pub async fn ids_named(conn: &mut PgConnection, name: &str) -> Result<Vec<ActivityId>, sqlx::Error> {
    let ids: Vec<i64> =
        sqlx::query_scalar("SELECT id FROM activity WHERE LOWER(name) = LOWER($1) ORDER BY id")
            .bind(name)
            .fetch_all(&mut *conn)
            .await?;

    Ok(ids.into_iter().map(ActivityId).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct ActivityRow {
    id: i64,
    name: String,
    parent_id: Option<i64>,
}

impl ActivityRow {
    fn into_record(self) -> Activity {
        Activity {
            id: ActivityId(self.id),
            name: self.name,
            parent_id: self.parent_id.map(ActivityId),
        }
    }
}
