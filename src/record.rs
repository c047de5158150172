// Named PNR records and header-to-field resolution
use serde::Serialize;
use tracing::warn;

use crate::error::EtlError;
use crate::table::PnrTable;

/// Fields of a passenger name record, in their canonical column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PnrField {
    FirstName,
    LastName,
    Address,
    Age,
    Origin,
    Destination,
    TravelDate,
    Class,
    BookingTime,
    NumPassengers,
}

impl PnrField {
    pub const ALL: [PnrField; 10] = [
        PnrField::FirstName,
        PnrField::LastName,
        PnrField::Address,
        PnrField::Age,
        PnrField::Origin,
        PnrField::Destination,
        PnrField::TravelDate,
        PnrField::Class,
        PnrField::BookingTime,
        PnrField::NumPassengers,
    ];

    /// Database column the field is inserted into.
    pub fn column(self) -> &'static str {
        match self {
            PnrField::FirstName => "first_name",
            PnrField::LastName => "last_name",
            PnrField::Address => "address",
            PnrField::Age => "age",
            PnrField::Origin => "origin",
            PnrField::Destination => "destination",
            PnrField::TravelDate => "travel_date",
            PnrField::Class => "class",
            PnrField::BookingTime => "booking_time",
            PnrField::NumPassengers => "num_passengers",
        }
    }

    // Accepted header names, already normalized
    fn header_names(self) -> &'static [&'static str] {
        match self {
            PnrField::FirstName => &["firstname"],
            PnrField::LastName => &["lastname"],
            PnrField::Address => &["address"],
            PnrField::Age => &["age"],
            PnrField::Origin => &["origin", "source"],
            PnrField::Destination => &["destination", "dest"],
            PnrField::TravelDate => &["traveldate"],
            PnrField::Class => &["class", "travelclass"],
            PnrField::BookingTime => &["bookingtime"],
            PnrField::NumPassengers => &["numpassengers", "npass"],
        }
    }

    /// Position of the field in the canonical layout.
    pub fn position(self) -> usize {
        self as usize
    }
}

fn normalize_header(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(*c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Column index of every PNR field within a table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    indices: [usize; 10],
}

impl ColumnMap {
    /// Resolve each field by header name, falling back to its canonical
    /// position when the name is absent and that column is unclaimed.
    pub fn resolve(columns: &[String]) -> Result<Self, EtlError> {
        let normalized: Vec<String> = columns.iter().map(|c| normalize_header(c)).collect();

        let by_name: Vec<Option<usize>> = PnrField::ALL
            .iter()
            .map(|field| {
                normalized
                    .iter()
                    .position(|header| field.header_names().contains(&header.as_str()))
            })
            .collect();

        let mut indices = [0usize; 10];
        for (field, found) in PnrField::ALL.iter().zip(&by_name) {
            indices[field.position()] = match found {
                Some(index) => *index,
                None => {
                    let position = field.position();
                    let claimed = by_name.contains(&Some(position));
                    if position >= columns.len() || claimed {
                        return Err(EtlError::MissingColumn(field.column().to_string()));
                    }
                    warn!(
                        field = field.column(),
                        header = %columns[position],
                        position,
                        "no header matches field by name, using its positional column"
                    );
                    position
                }
            };
        }

        Ok(Self { indices })
    }

    pub fn index_of(&self, field: PnrField) -> usize {
        self.indices[field.position()]
    }
}

/// A cleaned passenger name record. Values are kept as they appear in the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PnrRecord {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub age: String,
    pub origin: String,
    pub destination: String,
    pub travel_date: String,
    pub class: String,
    pub booking_time: String,
    pub num_passengers: String,
}

impl PnrRecord {
    fn from_cells(map: &ColumnMap, cells: &[String]) -> Self {
        let get = |field: PnrField| cells[map.index_of(field)].clone();

        Self {
            first_name: get(PnrField::FirstName),
            last_name: get(PnrField::LastName),
            address: get(PnrField::Address),
            age: get(PnrField::Age),
            origin: get(PnrField::Origin),
            destination: get(PnrField::Destination),
            travel_date: get(PnrField::TravelDate),
            class: get(PnrField::Class),
            booking_time: get(PnrField::BookingTime),
            num_passengers: get(PnrField::NumPassengers),
        }
    }

    /// Value of a field by name.
    pub fn get(&self, field: PnrField) -> &str {
        match field {
            PnrField::FirstName => &self.first_name,
            PnrField::LastName => &self.last_name,
            PnrField::Address => &self.address,
            PnrField::Age => &self.age,
            PnrField::Origin => &self.origin,
            PnrField::Destination => &self.destination,
            PnrField::TravelDate => &self.travel_date,
            PnrField::Class => &self.class,
            PnrField::BookingTime => &self.booking_time,
            PnrField::NumPassengers => &self.num_passengers,
        }
    }
}

/// Convert every table record into a named `PnrRecord`.
pub fn map_records(table: &PnrTable) -> Result<Vec<PnrRecord>, EtlError> {
    if table.is_empty() {
        return Ok(Vec::new());
    }

    let map = ColumnMap::resolve(table.columns())?;
    Ok(table
        .records()
        .iter()
        .map(|cells| PnrRecord::from_cells(&map, cells))
        .collect())
}
