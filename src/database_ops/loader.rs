use chrono::{DateTime, Utc};
use sqlx::{Any, QueryBuilder};
use tracing::{info, instrument};

use crate::error::{SyncError, SyncResult};
use crate::normalization::{FieldValue, NormalizedRecord};
use crate::util::db::Db;

/// Rows per INSERT statement; keeps bind counts well under driver limits.
const ROWS_PER_STATEMENT: usize = 500;

/// Storage type of a target column. Drives how a value is bound, never DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Varchar(u32),
    Float,
    DateTime,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnTypeMap {
    pub columns: &'static [(&'static str, ColumnType)],
}

impl ColumnTypeMap {
    pub const fn new(columns: &'static [(&'static str, ColumnType)]) -> Self {
        Self { columns }
    }
}

pub const PEOPLE_COLUMNS: ColumnTypeMap = ColumnTypeMap::new(&[
    ("name", ColumnType::Varchar(45)),
    ("height", ColumnType::Float),
    ("mass", ColumnType::Float),
    ("hair_color", ColumnType::Varchar(45)),
    ("skin_color", ColumnType::Varchar(45)),
    ("eye_color", ColumnType::Varchar(45)),
    ("birth_year", ColumnType::Varchar(45)),
    ("gender", ColumnType::Varchar(45)),
    ("homeworld", ColumnType::Varchar(45)),
    ("url", ColumnType::Varchar(45)),
    ("edited", ColumnType::DateTime),
]);

pub const PLANETS_COLUMNS: ColumnTypeMap = ColumnTypeMap::new(&[
    ("name", ColumnType::Varchar(45)),
    ("rotation_period", ColumnType::Float),
    ("orbital_period", ColumnType::Float),
    ("diameter", ColumnType::Float),
    ("climate", ColumnType::Varchar(45)),
    ("gravity", ColumnType::Varchar(45)),
    ("terrain", ColumnType::Varchar(45)),
    ("surface_water", ColumnType::Float),
    ("population", ColumnType::Float),
    ("url", ColumnType::Varchar(45)),
    ("edited", ColumnType::DateTime),
]);

#[derive(Debug, Clone, PartialEq)]
enum Bound {
    Text(Option<String>),
    Float(Option<f64>),
}

fn check_identifier(ident: &str) -> SyncResult<()> {
    if !ident.is_empty() && ident.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        Ok(())
    } else {
        Err(SyncError::Encode(format!("invalid identifier {ident:?}")))
    }
}

/// RFC 3339 text → `YYYY-MM-DD HH:MM:SS.ffffff` in UTC, accepted by DATETIME columns.
fn encode_datetime(column: &str, text: &str) -> SyncResult<String> {
    let parsed = DateTime::parse_from_rfc3339(text.trim()).map_err(|e| {
        SyncError::Encode(format!("column {column}: {text:?} is not a date-time: {e}"))
    })?;
    Ok(parsed
        .with_timezone(&Utc)
        .format("%Y-%m-%d %H:%M:%S%.6f")
        .to_string())
}

fn encode(column: &str, ty: ColumnType, value: Option<&FieldValue>) -> SyncResult<Bound> {
    let mismatch = |what: &str| {
        SyncError::Encode(format!("column {column}: {what} does not fit {ty:?}"))
    };
    Ok(match (ty, value) {
        (ColumnType::Varchar(_), None | Some(FieldValue::Null)) => Bound::Text(None),
        (ColumnType::Varchar(_), Some(FieldValue::Text(s))) => Bound::Text(Some(s.clone())),
        (ColumnType::Varchar(_), Some(FieldValue::Number(n))) => Bound::Text(Some(n.to_string())),
        (ColumnType::Float, None | Some(FieldValue::Null)) => Bound::Float(None),
        (ColumnType::Float, Some(FieldValue::Number(n))) => Bound::Float(Some(*n)),
        (ColumnType::Float, Some(FieldValue::Text(_))) => return Err(mismatch("text")),
        (ColumnType::DateTime, None | Some(FieldValue::Null)) => Bound::Text(None),
        (ColumnType::DateTime, Some(FieldValue::Text(s))) => {
            Bound::Text(Some(encode_datetime(column, s)?))
        }
        (ColumnType::DateTime, Some(FieldValue::Number(_))) => return Err(mismatch("number")),
    })
}

/// Appends normalized rows into tables that already exist.
#[derive(Clone)]
pub struct Loader {
    db: Db,
}

impl Loader {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Append every record to `table`; all rows land or none do.
    ///
    /// Returns the number of rows inserted. Nothing is deduplicated, so
    /// loading the same records twice doubles them.
    #[instrument(skip(self, records, columns), fields(rows = records.len()))]
    pub async fn load(
        &self,
        table: &str,
        records: &[NormalizedRecord],
        columns: &ColumnTypeMap,
    ) -> SyncResult<u64> {
        check_identifier(table)?;
        for (c, _) in columns.columns {
            check_identifier(c)?;
        }
        if records.is_empty() || columns.columns.is_empty() {
            return Ok(0);
        }

        let rows: Vec<Vec<Bound>> = records
            .iter()
            .map(|r| {
                columns
                    .columns
                    .iter()
                    .map(|(c, ty)| encode(c, *ty, r.get(c)))
                    .collect::<SyncResult<Vec<Bound>>>()
            })
            .collect::<SyncResult<_>>()?;

        let column_list = columns
            .columns
            .iter()
            .map(|(c, _)| *c)
            .collect::<Vec<_>>()
            .join(", ");

        let mut tx = self.db.pool.begin().await?;
        let mut inserted = 0u64;
        for chunk in rows.chunks(ROWS_PER_STATEMENT) {
            let mut qb: QueryBuilder<'_, Any> =
                QueryBuilder::new(format!("INSERT INTO {table} ({column_list}) "));
            qb.push_values(chunk, |mut b, row| {
                for v in row {
                    match v {
                        Bound::Text(s) => {
                            b.push_bind(s.clone());
                        }
                        Bound::Float(n) => {
                            b.push_bind(*n);
                        }
                    }
                }
            });
            let res = qb.build().persistent(false).execute(&mut *tx).await?;
            inserted += res.rows_affected();
        }
        tx.commit().await?;
        info!(table, inserted, "appended rows");
        Ok(inserted)
    }
}
