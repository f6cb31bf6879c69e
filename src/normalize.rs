//! Normalization of irregular upstream JSON into listing records.
//!
//! The catalog wraps results in `response.body.items.item`, where `item`
//! is an array, a single object when there is exactly one result, or
//! missing entirely (sometimes `items` is an empty string). Everything
//! downstream works on [`ListingRecord`]s and never looks at the raw shape.

use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::api::types::ListingRecord;

/// Shape of the `items.item` container of a catalog response
#[derive(Debug, Clone, PartialEq)]
pub enum ItemShape {
    /// Container absent or not a list/object
    Missing,
    /// A single object where a list was expected
    Single(Map<String, Value>),
    /// A proper list (non-object entries already removed)
    Many(Vec<Map<String, Value>>),
}

impl ItemShape {
    pub fn of(doc: &Value) -> Self {
        match doc.pointer("/response/body/items/item") {
            Some(Value::Object(map)) => Self::Single(map.clone()),
            Some(Value::Array(list)) => {
                Self::Many(list.iter().filter_map(|v| v.as_object().cloned()).collect())
            }
            _ => Self::Missing,
        }
    }

    pub fn into_vec(self) -> Vec<Map<String, Value>> {
        match self {
            Self::Missing => Vec::new(),
            Self::Single(map) => vec![map],
            Self::Many(list) => list,
        }
    }
}

/// Result code and message from a catalog response header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultHeader {
    pub code: String,
    pub message: String,
}

impl ResultHeader {
    pub const SUCCESS: &'static str = "0000";

    pub fn is_success(&self) -> bool {
        self.code == Self::SUCCESS
    }
}

/// Render a scalar JSON value as text. Empty strings, nulls, arrays and
/// objects yield `None`.
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Extract the item objects from a catalog response, in upstream order
pub fn extract_items(doc: &Value) -> Vec<Map<String, Value>> {
    let shape = ItemShape::of(doc);
    if let ItemShape::Single(_) = shape {
        debug!("Response carried a single item object instead of a list");
    }
    shape.into_vec()
}

/// Build a listing record from one item object. Items without a usable
/// `title` are dropped.
pub fn listing_from_item(item: &Map<String, Value>) -> Option<ListingRecord> {
    let title = item.get("title").and_then(value_to_string)?;
    let title = title.trim().to_string();

    Some(ListingRecord {
        title,
        content_id: item.get("contentid").and_then(value_to_string),
        content_type_id: item.get("contenttypeid").and_then(value_to_string),
        fields: item.clone(),
    })
}

/// Normalize a catalog list response into listing records
pub fn normalize_listings(doc: &Value) -> Vec<ListingRecord> {
    let items = extract_items(doc);
    let total = items.len();
    let records: Vec<ListingRecord> = items.iter().filter_map(listing_from_item).collect();
    if records.len() < total {
        debug!("Dropped {} item(s) without a title", total - records.len());
    }
    records
}

/// `response.body.totalCount`, 0 when missing or malformed
pub fn total_count(doc: &Value) -> u64 {
    match doc.pointer("/response/body/totalCount") {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// `response.header` of a catalog response, if present
pub fn result_header(doc: &Value) -> Option<ResultHeader> {
    let header = doc.pointer("/response/header")?;
    Some(ResultHeader {
        code: header.get("resultCode").and_then(value_to_string)?,
        message: header
            .get("resultMsg")
            .and_then(value_to_string)
            .unwrap_or_default(),
    })
}

/// Title → listing lookup for one page of results.
///
/// Titles are not guaranteed unique upstream. The first record with a
/// given title wins; later records with the same title are kept in
/// [`LookupTable::collisions`] so callers can surface them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LookupTable {
    entries: Vec<ListingRecord>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    collisions: Vec<ListingRecord>,
}

impl LookupTable {
    pub fn from_records(records: impl IntoIterator<Item = ListingRecord>) -> Self {
        let mut table = Self::default();
        for record in records {
            table.insert(record);
        }
        table
    }

    fn insert(&mut self, record: ListingRecord) {
        if self.index.contains_key(&record.title) {
            warn!(
                "Duplicate title '{}' (contentid {:?}); keeping the first entry",
                record.title, record.content_id
            );
            self.collisions.push(record);
            return;
        }
        self.index.insert(record.title.clone(), self.entries.len());
        self.entries.push(record);
    }

    pub fn get(&self, title: &str) -> Option<&ListingRecord> {
        self.index.get(title).map(|&i| &self.entries[i])
    }

    /// Titles in upstream order
    pub fn titles(&self) -> Vec<&str> {
        self.entries.iter().map(|r| r.title.as_str()).collect()
    }

    pub fn records(&self) -> &[ListingRecord] {
        &self.entries
    }

    /// Records hidden behind an earlier record with the same title
    pub fn collisions(&self) -> &[ListingRecord] {
        &self.collisions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(item: Value) -> Value {
        json!({
            "response": {
                "header": {"resultCode": "0000", "resultMsg": "OK"},
                "body": {"items": {"item": item}, "totalCount": 95}
            }
        })
    }

    #[test]
    fn test_single_object_yields_one_record() {
        let doc = envelope(json!({"title": "경복궁", "contentid": "126508", "contenttypeid": "12"}));
        let records = normalize_listings(&doc);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "경복궁");
        assert_eq!(records[0].content_id.as_deref(), Some("126508"));
        assert_eq!(records[0].content_type_id.as_deref(), Some("12"));
    }

    #[test]
    fn test_array_keeps_order_and_drops_untitled() {
        let doc = envelope(json!([
            {"title": "경복궁", "contentid": 126508, "contenttypeid": 12},
            {"contentid": "1"},
            {"title": "   ", "contentid": "2"},
            "garbage",
            {"title": "창덕궁", "contentid": "126509", "contenttypeid": "12"}
        ]));
        let titles: Vec<String> = normalize_listings(&doc).into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["경복궁", "창덕궁"]);
    }

    #[test]
    fn test_numeric_ids_become_strings() {
        let doc = envelope(json!([{"title": "A", "contentid": 126508, "contenttypeid": 12}]));
        let records = normalize_listings(&doc);
        assert_eq!(records[0].content_id.as_deref(), Some("126508"));
        assert_eq!(records[0].content_type_id.as_deref(), Some("12"));
    }

    #[test]
    fn test_missing_or_malformed_containers_yield_nothing() {
        let cases = vec![
            json!({}),
            json!([]),
            json!("text"),
            json!({"response": {"body": "oops"}}),
            json!({"response": {"body": {"items": ""}}}),
            json!({"response": {"body": {"items": {"item": 5}}}}),
        ];
        for doc in cases {
            assert!(normalize_listings(&doc).is_empty(), "case {doc}");
            assert_eq!(ItemShape::of(&doc), ItemShape::Missing);
        }
    }

    #[test]
    fn test_total_count_and_header() {
        let doc = envelope(json!([]));
        assert_eq!(total_count(&doc), 95);
        let header = result_header(&doc).unwrap();
        assert!(header.is_success());

        let doc = json!({"response": {"header": {"resultCode": "10", "resultMsg": "INVALID_REQUEST_PARAMETER_ERROR"}, "body": {"totalCount": "12"}}});
        assert_eq!(total_count(&doc), 12);
        let header = result_header(&doc).unwrap();
        assert!(!header.is_success());
        assert_eq!(header.message, "INVALID_REQUEST_PARAMETER_ERROR");

        assert_eq!(total_count(&json!({})), 0);
        assert!(result_header(&json!({})).is_none());
    }

    #[test]
    fn test_lookup_table_first_wins() {
        let table = LookupTable::from_records(vec![
            ListingRecord::new("서울숲", Some("1".into()), Some("12".into())),
            ListingRecord::new("남산타워", Some("2".into()), Some("12".into())),
            ListingRecord::new("서울숲", Some("3".into()), Some("15".into())),
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.titles(), vec!["서울숲", "남산타워"]);
        assert_eq!(table.get("서울숲").unwrap().content_id.as_deref(), Some("1"));
        assert_eq!(table.collisions().len(), 1);
        assert_eq!(table.collisions()[0].content_id.as_deref(), Some("3"));
        assert!(table.get("없는곳").is_none());
    }
}
