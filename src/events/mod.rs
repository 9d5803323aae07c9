//! Raw bid events and their grouping.
//!
//! Events are read once and never mutated. The engine consumes them through
//! two groupings:
//!
//! - by entity (bidder), in first-seen order of entity identifiers, which
//!   fixes the row order of the feature matrix
//! - by auction within one entity, for the aggregate-of-aggregates time
//!   statistics
//!
//! Both groupings preserve the original event order inside each group.

pub mod loader;

pub use loader::{load_events_csv, ColumnMapping, EventLoader};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The categorical columns summarized per entity, in schema order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalColumn {
    Ip,
    Device,
    Merchandise,
    Country,
    Url,
    Auction,
}

impl CategoricalColumn {
    /// All summarized columns in schema order.
    pub fn all() -> &'static [CategoricalColumn] {
        &[
            CategoricalColumn::Ip,
            CategoricalColumn::Device,
            CategoricalColumn::Merchandise,
            CategoricalColumn::Country,
            CategoricalColumn::Url,
            CategoricalColumn::Auction,
        ]
    }

    /// Column name used in feature names and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            CategoricalColumn::Ip => "ip",
            CategoricalColumn::Device => "device",
            CategoricalColumn::Merchandise => "merchandise",
            CategoricalColumn::Country => "country",
            CategoricalColumn::Url => "url",
            CategoricalColumn::Auction => "auction",
        }
    }

    /// Whether every event of an entity must carry this column.
    ///
    /// The auction doubles as the sub-group key, so it is required. The
    /// other columns may be blank; an entity with no value at all gets the
    /// fill value for that column's statistics.
    pub fn is_required(&self) -> bool {
        matches!(self, CategoricalColumn::Auction)
    }
}

impl fmt::Display for CategoricalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name of the timestamp column in error messages.
pub const TIMESTAMP_COLUMN: &str = "time";

/// One raw bid record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Bidder identifier (grouping key).
    pub entity_id: String,

    /// Auction identifier (sub-group key).
    pub auction: Option<String>,

    pub ip: Option<String>,
    pub device: Option<String>,
    pub merchandise: Option<String>,
    pub country: Option<String>,
    pub url: Option<String>,

    /// Bid time. Intervals are computed in the given event order.
    pub timestamp: Option<f64>,
}

impl Event {
    /// Create an event carrying only the required fields.
    pub fn new(entity_id: impl Into<String>, auction: impl Into<String>, timestamp: f64) -> Self {
        Self {
            entity_id: entity_id.into(),
            auction: Some(auction.into()),
            ip: None,
            device: None,
            merchandise: None,
            country: None,
            url: None,
            timestamp: Some(timestamp),
        }
    }

    /// Set the ip.
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// Set the device.
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Set the merchandise category.
    pub fn with_merchandise(mut self, merchandise: impl Into<String>) -> Self {
        self.merchandise = Some(merchandise.into());
        self
    }

    /// Set the country.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Set the url.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Value of a categorical column, if present.
    #[inline]
    pub fn categorical(&self, column: CategoricalColumn) -> Option<&str> {
        match column {
            CategoricalColumn::Ip => self.ip.as_deref(),
            CategoricalColumn::Device => self.device.as_deref(),
            CategoricalColumn::Merchandise => self.merchandise.as_deref(),
            CategoricalColumn::Country => self.country.as_deref(),
            CategoricalColumn::Url => self.url.as_deref(),
            CategoricalColumn::Auction => self.auction.as_deref(),
        }
    }
}

/// The full raw event set.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    events: Vec<Event>,
}

impl EventTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing list of events.
    pub fn from_events(events: Vec<Event>) -> Self {
        Self { events }
    }

    /// Append one event.
    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Distinct entity identifiers in first-seen order.
    pub fn entity_ids(&self) -> Vec<String> {
        self.group_by_entity()
            .into_iter()
            .map(|g| g.entity_id().to_string())
            .collect()
    }

    /// Group events by entity identifier.
    ///
    /// Groups come out in first-seen order of the identifier; events inside
    /// a group keep table order.
    pub fn group_by_entity(&self) -> Vec<EntityEventGroup<'_>> {
        let mut positions: AHashMap<&str, usize> = AHashMap::new();
        let mut groups: Vec<EntityEventGroup<'_>> = Vec::new();

        for event in &self.events {
            let slot = *positions.entry(event.entity_id.as_str()).or_insert_with(|| {
                groups.push(EntityEventGroup {
                    entity_id: event.entity_id.as_str(),
                    events: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot].events.push(event);
        }

        groups
    }
}

impl FromIterator<Event> for EventTable {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

/// All events sharing one entity identifier.
#[derive(Debug, Clone)]
pub struct EntityEventGroup<'a> {
    entity_id: &'a str,
    events: Vec<&'a Event>,
}

impl<'a> EntityEventGroup<'a> {
    /// Build a group directly (tests and single-entity callers).
    pub fn new(entity_id: &'a str, events: Vec<&'a Event>) -> Self {
        Self { entity_id, events }
    }

    pub fn entity_id(&self) -> &'a str {
        self.entity_id
    }

    pub fn events(&self) -> &[&'a Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Present values of one categorical column, in event order.
    pub fn categorical_values(&self, column: CategoricalColumn) -> Vec<&'a str> {
        self.events
            .iter()
            .filter_map(|e| e.categorical(column))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> EventTable {
        EventTable::from_events(vec![
            Event::new("b", "a1", 5.0),
            Event::new("a", "a1", 1.0),
            Event::new("b", "a2", 7.0),
            Event::new("c", "a3", 2.0),
            Event::new("a", "a2", 3.0),
        ])
    }

    #[test]
    fn test_group_by_entity_first_seen_order() {
        let table = table();
        let groups = table.group_by_entity();
        let ids: Vec<&str> = groups.iter().map(|g| g.entity_id()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_group_preserves_event_order() {
        let table = table();
        let groups = table.group_by_entity();
        let times: Vec<f64> = groups[1]
            .events()
            .iter()
            .filter_map(|e| e.timestamp)
            .collect();
        assert_eq!(times, vec![1.0, 3.0]);
    }

    #[test]
    fn test_empty_table_has_no_groups() {
        let table = EventTable::new();
        assert!(table.is_empty());
        assert!(table.group_by_entity().is_empty());
        assert!(table.entity_ids().is_empty());
    }

    #[test]
    fn test_categorical_values_skip_missing() {
        let events = vec![
            Event::new("x", "a1", 1.0).with_country("fr"),
            Event::new("x", "a1", 2.0),
            Event::new("x", "a2", 3.0).with_country("de"),
        ];
        let group = EntityEventGroup::new("x", events.iter().collect());
        assert_eq!(
            group.categorical_values(CategoricalColumn::Country),
            vec!["fr", "de"]
        );
        assert_eq!(group.categorical_values(CategoricalColumn::Auction).len(), 3);
    }

    #[test]
    fn test_column_names_and_required() {
        let names: Vec<&str> = CategoricalColumn::all().iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec!["ip", "device", "merchandise", "country", "url", "auction"]
        );
        assert!(CategoricalColumn::Auction.is_required());
        assert!(!CategoricalColumn::Country.is_required());
    }
}
