//! Building persistence operations.
//!
//! All functions take a `&mut PgConnection` (usually a transaction) and
//! operate on the `building` table.

use sqlx::PgConnection;

use secunda_core::{Building, BuildingId, NewBuilding};

const COLUMNS: &str = "id, address, latitude, longitude";

/// Insert a building and return it with its assigned id.
pub async fn insert(conn: &mut PgConnection, new: &NewBuilding) -> Result<Building, sqlx::Error> {
    let row = sqlx::query_as::<_, BuildingRow>(&format!(
        "INSERT INTO building (address, latitude, longitude) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
    ))
    .bind(&new.address)
    .bind(new.latitude)
    .bind(new.longitude)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.into_record())
}

/// Fetch a building by id.
pub async fn get_by_id(
    conn: &mut PgConnection,
    id: BuildingId,
) -> Result<Option<Building>, sqlx::Error> {
    let row = sqlx::query_as::<_, BuildingRow>(&format!(
        "SELECT {COLUMNS} FROM building WHERE id = $1"
    ))
    .bind(id.get())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(BuildingRow::into_record))
}

/// List buildings by id with pagination.
pub async fn list(
    conn: &mut PgConnection,
    limit: i64,
    offset: i64,
) -> Result<Vec<Building>, sqlx::Error> {
    let rows = sqlx::query_as::<_, BuildingRow>(&format!(
        "SELECT {COLUMNS} FROM building ORDER BY id LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(BuildingRow::into_record).collect())
}

/// Overwrite every mutable column of an existing building.
pub async fn update(conn: &mut PgConnection, building: &Building) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE building SET address = $1, latitude = $2, longitude = $3 WHERE id = $4",
    )
    .bind(&building.address)
    .bind(building.latitude)
    .bind(building.longitude)
    .bind(building.id.get())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a building. Referencing organizations make this fail with a
/// foreign-key violation.
pub async fn delete(conn: &mut PgConnection, id: BuildingId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM building WHERE id = $1")
        .bind(id.get())
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct BuildingRow {
    id: i64,
    address: String,
    latitude: f64,
    longitude: f64,
}

impl BuildingRow {
    fn into_record(self) -> Building {
        Building {
            id: BuildingId(self.id),
            address: self.address,
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}
