//! Organization persistence operations.
//!
//! Phones are stored as a JSONB array. Activity membership lives in the
//! `organization_activity` association table. Every query that returns
//! several organizations orders by `o.id` so pagination is stable.

use std::collections::BTreeSet;

use sqlx::types::Json;
use sqlx::{PgConnection, Postgres, QueryBuilder};

use secunda_core::{
    ActivityId, BoundingBox, BuildingId, GeoPoint, LocatedOrganization, NewOrganization,
    Organization, OrganizationFilter, OrganizationId, Page,
};

const SELECT_ORGANIZATION: &str = "SELECT o.id, o.name, o.phones, o.building_id FROM organization o";

/// Insert the organization row and return it with its assigned id.
pub async fn insert(
    conn: &mut PgConnection,
    new: &NewOrganization,
) -> Result<Organization, sqlx::Error> {
    let row = sqlx::query_as::<_, OrganizationRow>(
        "INSERT INTO organization (name, phones, building_id) VALUES ($1, $2, $3)
         RETURNING id, name, phones, building_id",
    )
    .bind(&new.name)
    .bind(Json(new.phones.clone()))
    .bind(new.building_id.get())
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.into_record())
}

pub async fn get_by_id(
    conn: &mut PgConnection,
    id: OrganizationId,
) -> Result<Option<Organization>, sqlx::Error> {
    let row = sqlx::query_as::<_, OrganizationRow>(&format!("{SELECT_ORGANIZATION} WHERE o.id = $1"))
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(OrganizationRow::into_record))
}

pub async fn update(conn: &mut PgConnection, org: &Organization) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE organization SET name = $1, phones = $2, building_id = $3 WHERE id = $4",
    )
    .bind(&org.name)
    .bind(Json(org.phones.clone()))
    .bind(org.building_id.get())
    .bind(org.id.get())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete(conn: &mut PgConnection, id: OrganizationId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM organization WHERE id = $1")
        .bind(id.get())
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Activity ids linked to one organization, ascending.
pub async fn activity_ids(
    conn: &mut PgConnection,
    id: OrganizationId,
) -> Result<Vec<ActivityId>, sqlx::Error> {
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT activity_id FROM organization_activity WHERE organization_id = $1 ORDER BY activity_id",
    )
    .bind(id.get())
    .fetch_all(&mut *conn)
    .await?;

    Ok(ids.into_iter().map(ActivityId).collect())
}

/// Replace the association set of one organization.
pub async fn set_activities(
    conn: &mut PgConnection,
    id: OrganizationId,
    activity_ids: &BTreeSet<ActivityId>,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM organization_activity WHERE organization_id = $1")
        .bind(id.get())
        .execute(&mut *conn)
        .await?;

    if activity_ids.is_empty() {
        return Ok(());
    }

    let ids: Vec<i64> = activity_ids.iter().map(|a| a.get()).collect();
    sqlx::query(
        "INSERT INTO organization_activity (organization_id, activity_id)
         SELECT $1, UNNEST($2::BIGINT[])
         ON CONFLICT DO NOTHING",
    )
    .bind(id.get())
    .bind(&ids)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Apply the optional predicates of `filter`, ANDed, with bound parameters.
pub async fn filter(
    conn: &mut PgConnection,
    filter: &OrganizationFilter,
    page: Page,
) -> Result<Vec<Organization>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(SELECT_ORGANIZATION);
    qb.push(" WHERE TRUE");

    if let Some(id) = filter.organization_id {
        qb.push(" AND o.id = ").push_bind(id.get());
    }
    if let Some(name) = &filter.organization_name {
        qb.push(" AND STRPOS(LOWER(o.name), LOWER(")
            .push_bind(name.clone())
            .push(")) > 0");
    }
    if let Some(building_id) = filter.building_id {
        qb.push(" AND o.building_id = ").push_bind(building_id.get());
    }
    if let Some(activity_name) = &filter.activity_name {
        qb.push(
            " AND EXISTS (SELECT 1 FROM organization_activity oa
               JOIN activity a ON a.id = oa.activity_id
               WHERE oa.organization_id = o.id AND STRPOS(LOWER(a.name), LOWER(",
        )
        .push_bind(activity_name.clone())
        .push(")) > 0)");
    }

    qb.push(" ORDER BY o.id LIMIT ")
        .push_bind(page.limit_i64())
        .push(" OFFSET ")
        .push_bind(page.offset_i64());

    let rows = qb
        .build_query_as::<OrganizationRow>()
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(OrganizationRow::into_record).collect())
}

/// Distinct organizations linked to any activity in `activity_ids`.
pub async fn with_activities(
    conn: &mut PgConnection,
    activity_ids: &BTreeSet<ActivityId>,
    page: Page,
) -> Result<Vec<Organization>, sqlx::Error> {
    let ids: Vec<i64> = activity_ids.iter().map(|a| a.get()).collect();
    let rows = sqlx::query_as::<_, OrganizationRow>(&format!(
        "{SELECT_ORGANIZATION}
         WHERE EXISTS (SELECT 1 FROM organization_activity oa
                       WHERE oa.organization_id = o.id AND oa.activity_id = ANY($1))
         ORDER BY o.id LIMIT $2 OFFSET $3"
    ))
    .bind(&ids)
    .bind(page.limit_i64())
    .bind(page.offset_i64())
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(OrganizationRow::into_record).collect())
}

/// Organizations whose building lies inside `bbox`, joined to the building
/// coordinates. A `NULL` limit means no limit.
pub async fn in_box(
    conn: &mut PgConnection,
    bbox: &BoundingBox,
    page: Option<Page>,
) -> Result<Vec<LocatedOrganization>, sqlx::Error> {
    let rows = sqlx::query_as::<_, LocatedRow>(
        "SELECT o.id, o.name, o.phones, o.building_id, b.latitude, b.longitude
         FROM organization o
         JOIN building b ON b.id = o.building_id
         WHERE b.latitude BETWEEN $1 AND $2
           AND b.longitude BETWEEN $3 AND $4
         ORDER BY o.id LIMIT $5 OFFSET $6",
    )
    .bind(bbox.lat_min)
    .bind(bbox.lat_max)
    .bind(bbox.lon_min)
    .bind(bbox.lon_max)
    .bind(page.map(|p| p.limit_i64()))
    .bind(page.map_or(0, |p| p.offset_i64()))
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(LocatedRow::into_record).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct OrganizationRow {
    id: i64,
    name: String,
    phones: Json<Vec<String>>,
    building_id: i64,
}

impl OrganizationRow {
    fn into_record(self) -> Organization {
        Organization {
            id: OrganizationId(self.id),
            name: self.name,
            phones: self.phones.0,
            building_id: BuildingId(self.building_id),
        }
    }
}

#[derive(sqlx::FromRow)]
struct LocatedRow {
    #[sqlx(flatten)]
    organization: OrganizationRow,
    latitude: f64,
    longitude: f64,
}

impl LocatedRow {
    fn into_record(self) -> LocatedOrganization {
        LocatedOrganization {
            organization: self.organization.into_record(),
            location: GeoPoint {
                lat: self.latitude,
                lon: self.longitude,
            },
        }
    }
}
