// Database loading: PNR and airport inserts, then the derived-table procedures
use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::{MySql, Transaction};
use tracing::{debug, info};

use crate::error::EtlError;
use crate::record::{PnrField, PnrRecord};

/// Target of the load sequence.
///
/// Inserts happen between `begin` and `commit`; each procedure call commits
/// on its own.
#[async_trait]
pub trait ReservationStore: Send {
    async fn begin(&mut self) -> Result<(), EtlError>;

    async fn insert_pnr(&mut self, record: &PnrRecord) -> Result<(), EtlError>;

    async fn insert_airport(&mut self, code: &str) -> Result<(), EtlError>;

    async fn commit(&mut self) -> Result<(), EtlError>;

    async fn call_procedure(&mut self, name: &str) -> Result<(), EtlError>;

    async fn close(&mut self) -> Result<(), EtlError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub pnr_rows: usize,
    pub airport_rows: usize,
    pub procedures_called: usize,
}

/// Insert statement for the PNR table, columns in canonical field order.
pub fn pnr_insert_sql(table: &str) -> String {
    let columns: Vec<&str> = PnrField::ALL.iter().map(|f| f.column()).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {}({}) VALUES({})",
        table,
        columns.join(", "),
        placeholders
    )
}

pub fn airport_insert_sql(table: &str) -> String {
    format!("INSERT INTO {}(iata_code) VALUES(?)", table)
}

pub fn procedure_call_sql(name: &str) -> String {
    format!("CALL {}()", name)
}

/// Run the whole load against one store.
///
/// Records and airport codes are committed together; each procedure then
/// runs and commits in the given order. Any error aborts the sequence.
pub async fn load_reservations<S: ReservationStore + ?Sized>(
    store: &mut S,
    records: &[PnrRecord],
    airports: &[String],
    procedures: &[String],
) -> Result<LoadSummary, EtlError> {
    let mut summary = LoadSummary::default();

    store.begin().await?;
    for record in records {
        store.insert_pnr(record).await?;
        summary.pnr_rows += 1;
    }
    for code in airports {
        store.insert_airport(code).await?;
        summary.airport_rows += 1;
    }
    store.commit().await?;
    info!(
        pnr_rows = summary.pnr_rows,
        airport_rows = summary.airport_rows,
        "committed primary tables"
    );

    for procedure in procedures {
        store.call_procedure(procedure).await?;
        summary.procedures_called += 1;
        info!(procedure = %procedure, "stored procedure committed");
    }

    store.close().await?;
    Ok(summary)
}

/// MySQL store over a pool capped at a single connection.
pub struct MySqlStore {
    pool: MySqlPool,
    tx: Option<Transaction<'static, MySql>>,
    pnr_sql: String,
    airport_sql: String,
}

impl MySqlStore {
    pub async fn connect(
        url: &str,
        pnr_table: &str,
        airports_table: &str,
    ) -> Result<Self, EtlError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .map_err(|e| EtlError::DatabaseError(format!("Failed to connect: {}", e)))?;
        debug!("connected to database");

        Ok(Self {
            pool,
            tx: None,
            pnr_sql: pnr_insert_sql(pnr_table),
            airport_sql: airport_insert_sql(airports_table),
        })
    }
}

fn no_transaction() -> EtlError {
    EtlError::DatabaseError("no open transaction".to_string())
}

#[async_trait]
impl ReservationStore for MySqlStore {
    async fn begin(&mut self) -> Result<(), EtlError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| EtlError::DatabaseError(format!("Failed to begin transaction: {}", e)))?;
        self.tx = Some(tx);
        Ok(())
    }

    async fn insert_pnr(&mut self, record: &PnrRecord) -> Result<(), EtlError> {
        let tx = self.tx.as_mut().ok_or_else(no_transaction)?;

        let mut query = sqlx::query(&self.pnr_sql);
        for field in PnrField::ALL {
            query = query.bind(record.get(field));
        }

        query
            .execute(&mut **tx)
            .await
            .map_err(|e| EtlError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    async fn insert_airport(&mut self, code: &str) -> Result<(), EtlError> {
        let tx = self.tx.as_mut().ok_or_else(no_transaction)?;

        sqlx::query(&self.airport_sql)
            .bind(code)
            .execute(&mut **tx)
            .await
            .map_err(|e| EtlError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), EtlError> {
        if let Some(tx) = self.tx.take() {
            tx.commit()
                .await
                .map_err(|e| EtlError::DatabaseError(format!("Failed to commit: {}", e)))?;
        }
        Ok(())
    }

    async fn call_procedure(&mut self, name: &str) -> Result<(), EtlError> {
        self.begin().await?;
        let sql = procedure_call_sql(name);
        let tx = self.tx.as_mut().ok_or_else(no_transaction)?;

        sqlx::query(&sql)
            .execute(&mut **tx)
            .await
            .map_err(|e| EtlError::DatabaseError(format!("{} failed: {}", name, e)))?;
        self.commit().await
    }

    async fn close(&mut self) -> Result<(), EtlError> {
        self.pool.close().await;
        debug!("database connection closed");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Op {
        Begin,
        Pnr(PnrRecord),
        Airport(String),
        Commit,
        Call(String),
        Close,
    }

    /// Records every operation; optionally fails on the n-th PNR insert.
    #[derive(Default)]
    pub(crate) struct RecordingStore {
        pub ops: Vec<Op>,
        pub fail_on_pnr: Option<usize>,
        pnr_seen: usize,
    }

    #[async_trait]
    impl ReservationStore for RecordingStore {
        async fn begin(&mut self) -> Result<(), EtlError> {
            self.ops.push(Op::Begin);
            Ok(())
        }

        async fn insert_pnr(&mut self, record: &PnrRecord) -> Result<(), EtlError> {
            if self.fail_on_pnr == Some(self.pnr_seen) {
                return Err(EtlError::DatabaseError("constraint violation".to_string()));
            }
            self.pnr_seen += 1;
            self.ops.push(Op::Pnr(record.clone()));
            Ok(())
        }

        async fn insert_airport(&mut self, code: &str) -> Result<(), EtlError> {
            self.ops.push(Op::Airport(code.to_string()));
            Ok(())
        }

        async fn commit(&mut self) -> Result<(), EtlError> {
            self.ops.push(Op::Commit);
            Ok(())
        }

        async fn call_procedure(&mut self, name: &str) -> Result<(), EtlError> {
            self.ops.push(Op::Call(name.to_string()));
            self.ops.push(Op::Commit);
            Ok(())
        }

        async fn close(&mut self) -> Result<(), EtlError> {
            self.ops.push(Op::Close);
            Ok(())
        }
    }

    fn record(first_name: &str, class: &str) -> PnrRecord {
        PnrRecord {
            first_name: first_name.to_string(),
            last_name: "Hopper".to_string(),
            address: "12 Navy Yard Rd".to_string(),
            age: "45".to_string(),
            origin: "JFK".to_string(),
            destination: "LAX".to_string(),
            travel_date: "2021-05-03".to_string(),
            class: class.to_string(),
            booking_time: "2021-04-01 09:15:00".to_string(),
            num_passengers: "2".to_string(),
        }
    }

    fn procedures() -> Vec<String> {
        vec!["run_setup_inserts".to_string(), "reserve_seats".to_string()]
    }

    #[tokio::test]
    async fn test_load_sequence_order() {
        let mut store = RecordingStore::default();
        let records = vec![record("Grace", "Economy"), record("Alan", "Business")];
        let airports = vec!["JFK".to_string(), "LAX".to_string(), "".to_string()];

        let summary = load_reservations(&mut store, &records, &airports, &procedures())
            .await
            .unwrap();

        assert_eq!(
            store.ops,
            vec![
                Op::Begin,
                Op::Pnr(records[0].clone()),
                Op::Pnr(records[1].clone()),
                Op::Airport("JFK".to_string()),
                Op::Airport("LAX".to_string()),
                Op::Airport("".to_string()),
                Op::Commit,
                Op::Call("run_setup_inserts".to_string()),
                Op::Commit,
                Op::Call("reserve_seats".to_string()),
                Op::Commit,
                Op::Close,
            ]
        );
        assert_eq!(
            summary,
            LoadSummary {
                pnr_rows: 2,
                airport_rows: 3,
                procedures_called: 2,
            }
        );
    }

    #[tokio::test]
    async fn test_failed_insert_aborts_before_commit() {
        let mut store = RecordingStore {
            fail_on_pnr: Some(1),
            ..Default::default()
        };
        let records = vec![record("Grace", "Economy"), record("Alan", "Business")];

        let result =
            load_reservations(&mut store, &records, &["JFK".to_string()], &procedures()).await;

        assert!(matches!(result, Err(EtlError::DatabaseError(_))));
        assert!(!store.ops.contains(&Op::Commit));
        assert!(!store.ops.iter().any(|op| matches!(op, Op::Call(_))));
        assert!(!store.ops.contains(&Op::Close));
    }

    #[tokio::test]
    async fn test_empty_load_still_runs_procedures() {
        let mut store = RecordingStore::default();

        let summary = load_reservations(&mut store, &[], &[], &procedures())
            .await
            .unwrap();

        assert_eq!(summary.procedures_called, 2);
        assert_eq!(store.ops.first(), Some(&Op::Begin));
        assert_eq!(store.ops.last(), Some(&Op::Close));
    }

    #[test]
    fn test_pnr_insert_sql() {
        assert_eq!(
            pnr_insert_sql("Pnr"),
            "INSERT INTO Pnr(first_name, last_name, address, age, origin, destination, \
             travel_date, class, booking_time, num_passengers) \
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
    }

    #[test]
    fn test_class_is_bound_in_the_class_slot() {
        let record = record("Grace", "Business");
        let class_slot = PnrField::ALL
            .iter()
            .position(|f| f.column() == "class")
            .unwrap();
        let bound: Vec<&str> = PnrField::ALL.iter().map(|f| record.get(*f)).collect();

        assert_eq!(class_slot, 7);
        assert_eq!(bound[class_slot], "Business");
    }

    #[test]
    fn test_airport_and_procedure_sql() {
        assert_eq!(
            airport_insert_sql("project_one.Airports"),
            "INSERT INTO project_one.Airports(iata_code) VALUES(?)"
        );
        assert_eq!(procedure_call_sql("reserve_seats"), "CALL reserve_seats()");
    }
}
