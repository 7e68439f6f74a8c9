//! Fetch → normalize → load for every configured collection.
//!
//! Both collections are fetched and normalized before the first write, so a
//! fetch or normalize failure leaves every table untouched. Each table is
//! then loaded in its own transaction; there is no transaction across tables.
use tracing::{error, info};

use crate::config::SyncConfig;
use crate::database_ops::loader::{ColumnTypeMap, Loader, PEOPLE_COLUMNS, PLANETS_COLUMNS};
use crate::error::SyncResult;
use crate::normalization::{self, FieldSpec, NormalizedRecord, PEOPLE, PLANETS};
use crate::swapi::{CollectionIndex, SwapiClient};
use crate::util::db::Db;

/// One collection and where its rows go.
#[derive(Debug, Clone, Copy)]
pub struct CollectionJob {
    pub collection: &'static str,
    pub table: &'static str,
    pub fields: FieldSpec,
    pub columns: ColumnTypeMap,
}

/// Load order is people, then planets.
pub const JOBS: [CollectionJob; 2] = [
    CollectionJob {
        collection: "people",
        table: "people",
        fields: PEOPLE,
        columns: PEOPLE_COLUMNS,
    },
    CollectionJob {
        collection: "planets",
        table: "planets",
        fields: PLANETS,
        columns: PLANETS_COLUMNS,
    },
];

#[derive(Debug, Clone)]
pub struct PreparedLoad {
    pub job: CollectionJob,
    pub rows: Vec<NormalizedRecord>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncSummary {
    /// (table, rows appended) in load order.
    pub loaded: Vec<(String, u64)>,
}

impl SyncSummary {
    pub fn rows_for(&self, table: &str) -> Option<u64> {
        self.loaded.iter().find(|(t, _)| t == table).map(|(_, n)| *n)
    }
}

pub async fn fetch_and_normalize(
    client: &SwapiClient,
    index: &CollectionIndex,
    job: &CollectionJob,
) -> SyncResult<Vec<NormalizedRecord>> {
    let raw = client.fetch(index, job.collection).await?;
    normalization::normalize(&raw, &job.fields)
}

/// Network half of a run: every job fetched and normalized, nothing written.
pub async fn prepare(client: &SwapiClient, jobs: &[CollectionJob]) -> SyncResult<Vec<PreparedLoad>> {
    let index = client.collection_index().await?;
    let mut prepared = Vec::with_capacity(jobs.len());
    for job in jobs {
        let rows = fetch_and_normalize(client, &index, job).await?;
        prepared.push(PreparedLoad { job: *job, rows });
    }
    Ok(prepared)
}

/// Database half of a run. Stops at the first failing table; tables loaded
/// before it keep their rows.
pub async fn load_all(db: &Db, prepared: &[PreparedLoad]) -> SyncResult<SyncSummary> {
    let loader = Loader::new(db.clone());
    let mut summary = SyncSummary::default();
    for p in prepared {
        let n = loader.load(p.job.table, &p.rows, &p.job.columns).await?;
        summary.loaded.push((p.job.table.to_string(), n));
    }
    Ok(summary)
}

pub async fn run(client: &SwapiClient, db: &Db) -> SyncResult<SyncSummary> {
    let prepared = prepare(client, &JOBS).await?;
    load_all(db, &prepared).await
}

/// Full run from configuration. The connection is opened only once the data
/// is in hand and is closed whether or not the load succeeds.
pub async fn run_from_config(cfg: &SyncConfig) -> SyncResult<SyncSummary> {
    let client = SwapiClient::new(&cfg.base_url, cfg.http_timeout)?;
    let prepared = prepare(&client, &JOBS).await?;
    let rows: usize = prepared.iter().map(|p| p.rows.len()).sum();
    info!(rows, "all collections normalized; loading");

    let db = Db::connect(&cfg.database_url).await?;
    let result = load_all(&db, &prepared).await;
    if let Err(e) = &result {
        error!(error = %e, "load failed; closing connection");
    }
    db.close().await;
    result
}
