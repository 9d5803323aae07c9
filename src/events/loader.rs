//! CSV loading of raw bid events.
//!
//! The loader resolves columns by header name through a [`ColumnMapping`],
//! so files with extra columns (e.g. `bid_id`) or a different column order
//! load unchanged. Blank cells become `None`; a header missing from the file
//! is a fatal [`ExtractError::MalformedInput`].

use super::{Event, EventTable};
use crate::error::{ExtractError, Result};
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Header names for each event field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub entity_id: String,
    pub auction: String,
    pub ip: String,
    pub device: String,
    pub merchandise: String,
    pub country: String,
    pub url: String,
    pub timestamp: String,
}

impl Default for ColumnMapping {
    /// Header names of the bids file of the bot-detection competition.
    fn default() -> Self {
        Self {
            entity_id: "bidder_id".to_string(),
            auction: "auction".to_string(),
            ip: "ip".to_string(),
            device: "device".to_string(),
            merchandise: "merchandise".to_string(),
            country: "country".to_string(),
            url: "url".to_string(),
            timestamp: "time".to_string(),
        }
    }
}

/// Resolved header positions.
struct ColumnIndices {
    entity_id: usize,
    auction: usize,
    ip: usize,
    device: usize,
    merchandise: usize,
    country: usize,
    url: usize,
    timestamp: usize,
}

impl ColumnIndices {
    fn resolve(headers: &StringRecord, mapping: &ColumnMapping) -> Result<Self> {
        let find = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| ExtractError::malformed("<header>", name, "column absent from input"))
        };

        Ok(Self {
            entity_id: find(&mapping.entity_id)?,
            auction: find(&mapping.auction)?,
            ip: find(&mapping.ip)?,
            device: find(&mapping.device)?,
            merchandise: find(&mapping.merchandise)?,
            country: find(&mapping.country)?,
            url: find(&mapping.url)?,
            timestamp: find(&mapping.timestamp)?,
        })
    }
}

/// Streaming CSV event loader.
#[derive(Debug, Clone, Default)]
pub struct EventLoader {
    mapping: ColumnMapping,
    delimiter: Option<u8>,
}

impl EventLoader {
    /// Create a loader with the default column mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader with a custom column mapping.
    pub fn with_mapping(mapping: ColumnMapping) -> Self {
        Self {
            mapping,
            delimiter: None,
        }
    }

    /// Use a delimiter other than `,`.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    /// Load all events from a CSV file.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<EventTable> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            ExtractError::generic(format!("Failed to open {}: {e}", path.display()))
        })?;
        let table = self.load_from_reader(file)?;
        log::info!("Loaded {} events from {}", table.len(), path.display());
        Ok(table)
    }

    /// Load all events from any reader producing CSV text.
    pub fn load_from_reader<R: Read>(&self, reader: R) -> Result<EventTable> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter.unwrap_or(b','))
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let columns = ColumnIndices::resolve(&headers, &self.mapping)?;

        let mut table = EventTable::new();
        let mut record = StringRecord::new();
        let mut row = 0usize;

        while csv_reader.read_record(&mut record)? {
            row += 1;
            table.push(self.parse_record(&record, &columns, row)?);
        }

        Ok(table)
    }

    fn parse_record(&self, record: &StringRecord, columns: &ColumnIndices, row: usize) -> Result<Event> {
        let entity_id = cell(record, columns.entity_id).ok_or_else(|| {
            ExtractError::malformed(
                format!("<row {row}>"),
                self.mapping.entity_id.as_str(),
                "entity identifier missing",
            )
        })?;

        let timestamp = match cell(record, columns.timestamp) {
            Some(raw) => Some(raw.parse::<f64>().map_err(|_| {
                ExtractError::malformed(
                    entity_id.as_str(),
                    self.mapping.timestamp.as_str(),
                    format!("row {row}: '{raw}' is not numeric"),
                )
            })?),
            None => None,
        };

        Ok(Event {
            entity_id,
            auction: cell(record, columns.auction),
            ip: cell(record, columns.ip),
            device: cell(record, columns.device),
            merchandise: cell(record, columns.merchandise),
            country: cell(record, columns.country),
            url: cell(record, columns.url),
            timestamp,
        })
    }
}

/// Non-blank cell content.
fn cell(record: &StringRecord, index: usize) -> Option<String> {
    record
        .get(index)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Load events from a CSV file with the given column mapping.
pub fn load_events_csv<P: AsRef<Path>>(path: P, mapping: &ColumnMapping) -> Result<EventTable> {
    EventLoader::with_mapping(mapping.clone()).load(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CategoricalColumn;

    const BIDS: &str = "\
bid_id,bidder_id,auction,merchandise,device,time,country,ip,url
0,b1,aucA,jewelry,phone0,10,us,1.1.1.1,u1
1,b2,aucA,mobile,phone1,12,,2.2.2.2,u2
2,b1,aucB,jewelry,phone0,20,us,1.1.1.1,u1
";

    #[test]
    fn test_load_default_mapping() {
        let table = EventLoader::new().load_from_reader(BIDS.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);

        let first = &table.events()[0];
        assert_eq!(first.entity_id, "b1");
        assert_eq!(first.categorical(CategoricalColumn::Auction), Some("aucA"));
        assert_eq!(first.categorical(CategoricalColumn::Ip), Some("1.1.1.1"));
        assert_eq!(first.timestamp, Some(10.0));
    }

    #[test]
    fn test_blank_cell_is_none() {
        let table = EventLoader::new().load_from_reader(BIDS.as_bytes()).unwrap();
        assert_eq!(table.events()[1].country, None);
    }

    #[test]
    fn test_missing_header_is_malformed() {
        let csv = "bidder_id,auction,time\nb1,a,1\n";
        let err = EventLoader::new().load_from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.is_malformed_input());
        assert!(err.to_string().contains("ip"));
    }

    #[test]
    fn test_non_numeric_timestamp_names_entity() {
        let csv = "bidder_id,auction,merchandise,device,time,country,ip,url\n\
                   b9,a,m,d,soon,us,ip,u\n";
        let err = EventLoader::new().load_from_reader(csv.as_bytes()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("b9"));
        assert!(msg.contains("time"));
    }

    #[test]
    fn test_custom_mapping_and_delimiter() {
        let csv = "who;lot;addr;dev;cat;cc;link;ts\nz;l1;ip;d;c;fr;u;4.5\n";
        let mapping = ColumnMapping {
            entity_id: "who".into(),
            auction: "lot".into(),
            ip: "addr".into(),
            device: "dev".into(),
            merchandise: "cat".into(),
            country: "cc".into(),
            url: "link".into(),
            timestamp: "ts".into(),
        };
        let table = EventLoader::with_mapping(mapping)
            .with_delimiter(b';')
            .load_from_reader(csv.as_bytes())
            .unwrap();
        assert_eq!(table.events()[0].entity_id, "z");
        assert_eq!(table.events()[0].timestamp, Some(4.5));
    }
}
