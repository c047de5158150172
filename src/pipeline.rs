// End-to-end pipeline: files -> flattened sheet -> table -> records -> database
use std::io::Write;
use tracing::{info, warn};

use crate::airports::read_airport_codes;
use crate::config::Settings;
use crate::error::EtlError;
use crate::loader::{load_reservations, LoadSummary, MySqlStore, ReservationStore};
use crate::record::{map_records, PnrRecord};
use crate::table::PnrTable;
use crate::xml_flatten::flatten_file;

/// Everything read from disk, cleaned and ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedLoad {
    pub records: Vec<PnrRecord>,
    pub airports: Vec<String>,
    pub dropped: usize,
}

/// Read both input files and produce cleaned records and airport codes.
pub fn prepare(settings: &Settings) -> Result<PreparedLoad, EtlError> {
    let sheet = flatten_file(&settings.pnr_xml)?;
    let mut table = PnrTable::from_sheet(sheet)?;

    let dropped = table.drop_incomplete();
    if dropped > 0 {
        warn!(dropped, "dropped PNR records with missing fields");
    }

    let records = map_records(&table)?;
    let airports = read_airport_codes(&settings.airports)?;
    info!(
        records = records.len(),
        dropped,
        airports = airports.len(),
        "prepared load"
    );

    Ok(PreparedLoad {
        records,
        airports,
        dropped,
    })
}

/// Load prepared data into any store.
pub async fn load_with<S: ReservationStore + ?Sized>(
    store: &mut S,
    prepared: &PreparedLoad,
    settings: &Settings,
) -> Result<LoadSummary, EtlError> {
    load_reservations(
        store,
        &prepared.records,
        &prepared.airports,
        &settings.procedures,
    )
    .await
}

/// Prepare the input and load it into the configured MySQL database.
pub async fn run(settings: &Settings) -> Result<LoadSummary, EtlError> {
    let prepared = prepare(settings)?;

    let url = settings.database_url()?;
    let mut store =
        MySqlStore::connect(url, &settings.tables.pnr, &settings.tables.airports).await?;
    let summary = load_with(&mut store, &prepared, settings).await?;

    info!(
        pnr_rows = summary.pnr_rows,
        airport_rows = summary.airport_rows,
        procedures = summary.procedures_called,
        "load complete"
    );
    Ok(summary)
}

/// Write cleaned records as JSON lines, without touching the database.
pub fn write_dry_run<W: Write>(prepared: &PreparedLoad, out: &mut W) -> Result<(), EtlError> {
    for record in &prepared.records {
        let line = serde_json::to_string(record)
            .map_err(|e| EtlError::IoError(std::io::Error::other(e)))?;
        writeln!(out, "{}", line)?;
    }
    Ok(())
}
