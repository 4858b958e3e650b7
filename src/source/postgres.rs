//! PostGIS-backed shape tables (`qs_admin0` ... `qs_neighborhood`).

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info};

use super::{LocationSource, RawLocationRow};
use crate::error::Result;
use crate::models::LocationType;

#[derive(Clone)]
pub struct PgSource {
    pool: PgPool,
}

impl PgSource {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        info!("Connecting to Postgres...");
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }
}

/// Projection for one shape table. Column names all come from
/// [`LocationType`], never from input.
pub(crate) fn select_row_sql(location_type: LocationType) -> Option<String> {
    let table = location_type.table()?;
    let name_column = location_type.name_column()?;
    let (gn_column, woe_column) = location_type.xref_columns();

    let mut columns = vec![
        format!("CAST({} AS TEXT) AS gn_id", gn_column),
        format!("CAST({} AS TEXT) AS woe_id", woe_column),
        "ST_AsText(ST_Centroid(geom)) AS centroid".to_string(),
        "ST_AsGeoJSON(geom) AS boundaries".to_string(),
        format!("CAST({} AS TEXT) AS name", name_column),
    ];
    if let Some(abbr_column) = location_type.abbr_column() {
        columns.push(format!("CAST({} AS TEXT) AS abbr", abbr_column));
    }
    if location_type == LocationType::Admin1 {
        columns.push("CAST(qs_iso_cc AS TEXT) AS country_code".to_string());
    }

    Some(format!(
        "SELECT {} FROM {} WHERE gid = $1 LIMIT 1",
        columns.join(", "),
        table
    ))
}

fn decode_row(
    location_type: LocationType,
    row: &PgRow,
) -> std::result::Result<RawLocationRow, sqlx::Error> {
    let abbr = if location_type.abbr_column().is_some() {
        row.try_get("abbr")?
    } else {
        None
    };
    let country_code = if location_type == LocationType::Admin1 {
        row.try_get("country_code")?
    } else {
        None
    };

    Ok(RawLocationRow {
        gn_id: row.try_get("gn_id")?,
        woe_id: row.try_get("woe_id")?,
        centroid: row.try_get("centroid")?,
        boundaries: row.try_get("boundaries")?,
        name: row.try_get("name")?,
        abbr,
        country_code,
    })
}

#[async_trait]
impl LocationSource for PgSource {
    async fn fetch(
        &self,
        location_type: LocationType,
        gid: i64,
    ) -> Result<Option<RawLocationRow>> {
        let Some(sql) = select_row_sql(location_type) else {
            debug!("No shape table for {}", location_type);
            return Ok(None);
        };

        let row = sqlx::query(&sql)
            .bind(gid)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(decode_row(location_type, &row)?)),
            None => Ok(None),
        }
    }

    async fn gids(&self, location_type: LocationType) -> Result<Vec<i64>> {
        let Some(table) = location_type.table() else {
            return Ok(Vec::new());
        };

        let sql = format!("SELECT CAST(gid AS BIGINT) AS gid FROM {} ORDER BY gid", table);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut gids = Vec::with_capacity(rows.len());
        for row in rows {
            gids.push(row.try_get::<i64, _>("gid")?);
        }
        Ok(gids)
    }
}
