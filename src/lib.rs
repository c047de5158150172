// PNR loader: flatten the PNR spreadsheet XML, clean it, and load it into MySQL

pub mod airports;
pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod pipeline;
pub mod record;
pub mod table;
pub mod xml_flatten;

// Re-export key types for convenience
pub use config::Settings;
pub use error::EtlError;
pub use loader::{load_reservations, LoadSummary, MySqlStore, ReservationStore};
pub use pipeline::{prepare, run, PreparedLoad};
pub use record::{PnrField, PnrRecord};
pub use table::PnrTable;
pub use xml_flatten::{flatten_file, flatten_str, FlattenedSheet, Row};
