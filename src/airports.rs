// Airport code list reader
use std::path::Path;
use tracing::debug;

use crate::error::EtlError;

/// Split file contents on '\n'. A trailing newline yields a final empty code.
pub fn parse_airport_codes(contents: &str) -> Vec<String> {
    contents.split('\n').map(str::to_string).collect()
}

/// Read a UTF-8 file of airport codes, one per line, in file order.
pub fn read_airport_codes(path: impl AsRef<Path>) -> Result<Vec<String>, EtlError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;
    let codes = parse_airport_codes(&contents);
    debug!(path = %path.display(), codes = codes.len(), "read airport codes");
    Ok(codes)
}

// Sample file path (the actual file is stored in the samples directory)
pub const SAMPLE_AIRPORTS_PATH: &str = "samples/iata.txt";
