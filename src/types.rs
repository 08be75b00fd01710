use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

//==============================================================================
// Row
//==============================================================================

/// One imported spreadsheet record: a synthesized unique id plus the row's
/// cells as ordered (column, value) pairs.
///
/// Column order follows the sheet's header order. Duplicate column keys are
/// tolerated: inserting an existing key overwrites its value in place, so the
/// last cell wins while the column keeps its original position. The `id` is
/// held outside the pair list and can never be shadowed by a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    id: String,
    fields: Vec<(String, String)>,
}

impl Row {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Insert a cell value, overwriting in place when the column already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value.into(),
            None => self.fields.push((key, value.into())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Column keys in sheet order, excluding `id`.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// True when the row carries no data cells (the id does not count).
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// Rows serialize to the flat wire shape consumed by the overlay front-end:
/// `{"id": "...", "<column>": "<value>", ...}` with columns in sheet order.
impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("id", &self.id)?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

//==============================================================================
// Store info
//==============================================================================

/// Snapshot of the row store's state, served by the status endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreInfo {
    /// Number of rows in the current batch
    pub count: usize,
    /// Whether a row is currently selected
    pub has_selection: bool,
    /// When the store last changed (import or reset)
    pub last_updated: DateTime<Utc>,
    /// Source filename of the current batch, if any
    pub filename: Option<String>,
    /// Column keys of the first row, excluding `id`
    pub columns: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_id_and_fields() {
        let mut row = Row::new("row_1");
        row.insert("name", "Alice");
        row.insert("score", "12");

        assert_eq!(row.id(), "row_1");
        assert_eq!(row.get("name"), Some("Alice"));
        assert_eq!(row.get("score"), Some("12"));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.len(), 2);
        assert!(!row.is_empty());
    }

    #[test]
    fn test_row_insert_overwrites_in_place() {
        let mut row = Row::new("row_1");
        row.insert("name", "first");
        row.insert("city", "Paris");
        row.insert("name", "second");

        // Last value wins, column order unchanged
        assert_eq!(row.get("name"), Some("second"));
        let columns: Vec<&str> = row.columns().collect();
        assert_eq!(columns, vec!["name", "city"]);
    }

    #[test]
    fn test_row_columns_exclude_id() {
        let mut row = Row::new("row_1");
        row.insert("name", "Alice");

        let columns: Vec<&str> = row.columns().collect();
        assert_eq!(columns, vec!["name"]);
    }

    #[test]
    fn test_row_serializes_flat() {
        let mut row = Row::new("row_1_abc");
        row.insert("name", "Alice");
        row.insert("team", "Blue");

        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"id":"row_1_abc","name":"Alice","team":"Blue"}"#);
    }

    #[test]
    fn test_empty_row_serializes_id_only() {
        let row = Row::new("row_9");
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"id":"row_9"}"#);
    }

    #[test]
    fn test_store_info_serialize() {
        let info = StoreInfo {
            count: 2,
            has_selection: true,
            last_updated: Utc::now(),
            filename: Some("roster.xlsx".to_string()),
            columns: vec!["name".to_string(), "team".to_string()],
        };
        let json = serde_json::to_string(&info).unwrap();

        assert!(json.contains("\"count\":2"));
        assert!(json.contains("\"has_selection\":true"));
        assert!(json.contains("\"filename\":\"roster.xlsx\""));
        assert!(json.contains("\"columns\":[\"name\",\"team\"]"));
    }
}
