// XML flattening: Row/Data elements into a header plus data rows
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::path::Path;
use tracing::debug;

use crate::error::EtlError;

/// One flattened row: the text of each Data element, in document order.
pub type Row = Vec<String>;

const ROW_TAG: &[u8] = b"Row";
const DATA_TAG: &[u8] = b"Data";

/// Output of flattening a document.
///
/// `header` holds the values of the first Row element; `rows` holds every
/// Row after it. A document without Row elements gives an empty header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenedSheet {
    pub header: Row,
    pub rows: Vec<Row>,
}

// Accumulates cells for the Row element currently open
#[derive(Default)]
struct RowBuilder {
    cells: Row,
    // Row elements nested inside the open Row
    row_depth: usize,
    // Data elements open inside the current cell
    data_depth: usize,
}

impl RowBuilder {
    fn open_cell(&mut self) {
        if self.data_depth == 0 {
            self.cells.push(String::new());
        }
        self.data_depth += 1;
    }

    fn close_cell(&mut self) {
        self.data_depth = self.data_depth.saturating_sub(1);
    }

    fn push_text(&mut self, text: &str) {
        if self.data_depth == 0 {
            return;
        }
        if let Some(cell) = self.cells.last_mut() {
            cell.push_str(text);
        }
    }
}

impl FlattenedSheet {
    fn accept_row(&mut self, position: usize, cells: Row) {
        if position == 0 {
            self.header = cells;
        } else {
            self.rows.push(cells);
        }
    }
}

/// Read and flatten an XML file.
pub fn flatten_file(path: impl AsRef<Path>) -> Result<FlattenedSheet, EtlError> {
    let path = path.as_ref();
    let xml = std::fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = xml.len(), "read PNR document");
    flatten_str(&xml)
}

/// Flatten every Row element of `xml` into a header and data rows.
///
/// Elements are matched by local name, so `ss:Row`/`ss:Data` from
/// SpreadsheetML behave like plain `Row`/`Data`. The text of a Data element
/// is all of its descendant text, with nested tags ignored.
pub fn flatten_str(xml: &str) -> Result<FlattenedSheet, EtlError> {
    let mut reader = Reader::from_str(xml);
    let mut sheet = FlattenedSheet::default();
    let mut current: Option<RowBuilder> = None;
    let mut position = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| {
            EtlError::XmlParseError(format!(
                "error at position {}: {}",
                reader.error_position(),
                e
            ))
        })?;

        match event {
            Event::Start(e) => match (e.local_name().as_ref(), current.as_mut()) {
                (ROW_TAG, Some(row)) => row.row_depth += 1,
                (ROW_TAG, None) => current = Some(RowBuilder::default()),
                (DATA_TAG, Some(row)) => row.open_cell(),
                _ => (),
            },
            Event::Empty(e) => match (e.local_name().as_ref(), current.as_mut()) {
                (ROW_TAG, None) => {
                    sheet.accept_row(position, Row::new());
                    position += 1;
                }
                (DATA_TAG, Some(row)) => {
                    row.open_cell();
                    row.close_cell();
                }
                _ => (),
            },
            Event::End(e) => {
                let Some(row) = current.as_mut() else {
                    continue;
                };
                match e.local_name().as_ref() {
                    ROW_TAG if row.row_depth > 0 => row.row_depth -= 1,
                    ROW_TAG => {
                        let cells = std::mem::take(&mut row.cells);
                        current = None;
                        sheet.accept_row(position, cells);
                        position += 1;
                    }
                    DATA_TAG => row.close_cell(),
                    _ => (),
                }
            }
            Event::Text(e) => {
                if let Some(row) = current.as_mut() {
                    let text = e
                        .decode()
                        .map_err(|e| EtlError::XmlParseError(e.to_string()))?;
                    row.push_text(&text);
                }
            }
            Event::CData(e) => {
                if let Some(row) = current.as_mut() {
                    let text = std::str::from_utf8(&e)
                        .map_err(|e| EtlError::XmlParseError(e.to_string()))?;
                    row.push_text(text);
                }
            }
            Event::GeneralRef(e) => {
                if let Some(row) = current.as_mut() {
                    if let Some(ch) = e
                        .resolve_char_ref()
                        .map_err(|e| EtlError::XmlParseError(e.to_string()))?
                    {
                        row.push_text(ch.encode_utf8(&mut [0u8; 4]));
                    } else {
                        let name = e
                            .decode()
                            .map_err(|e| EtlError::XmlParseError(e.to_string()))?;
                        let resolved = resolve_predefined_entity(&name).ok_or_else(|| {
                            EtlError::XmlParseError(format!("unknown entity &{};", name))
                        })?;
                        row.push_text(resolved);
                    }
                }
            }
            Event::Eof => break,
            _ => (),
        }
    }

    if current.is_some() {
        return Err(EtlError::XmlParseError(
            "document ended inside a Row element".to_string(),
        ));
    }

    debug!(
        columns = sheet.header.len(),
        rows = sheet.rows.len(),
        "flattened document"
    );
    Ok(sheet)
}

// Sample file path (the actual file is stored in the samples directory)
pub const SAMPLE_PNR_PATH: &str = "samples/PNR.xml";
