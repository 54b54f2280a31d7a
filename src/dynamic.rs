use std::collections::HashMap;

use crate::headers::HeaderIndex;
use crate::options::DynamicRowDisposal;

/// An untyped row: an ordered string map keyed by header name when headers
/// are available, by stringified position otherwise.
///
/// Used when the caller has no `RowDescriptor<T>` to bind against — the
/// "no static row type" path the Design Notes call for, built as an
/// ordered map rather than reflection over a generated type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DynamicRow {
    order: Vec<String>,
    values: HashMap<String, String>,
}

impl DynamicRow {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn clear(&mut self) {
        self.order.clear();
        self.values.clear();
    }

    fn push(&mut self, key: String, value: String) {
        if !self.values.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.values.insert(key, value);
    }
}

/// Builds [`DynamicRow`]s from raw field vectors, honoring
/// [`DynamicRowDisposal`] for how the backing row is reused across records.
pub struct DynamicRowBuilder {
    disposal: DynamicRowDisposal,
    scratch: DynamicRow,
}

impl DynamicRowBuilder {
    pub fn new(disposal: DynamicRowDisposal) -> DynamicRowBuilder {
        DynamicRowBuilder { disposal, scratch: DynamicRow::default() }
    }

    /// Builds a row from `fields`, naming each by `headers` (falling back to
    /// its position as a string when there are more fields than headers, or
    /// no headers at all).
    pub fn build(&mut self, fields: &[String], headers: Option<&HeaderIndex>) -> DynamicRow {
        let mut row = match self.disposal {
            DynamicRowDisposal::Reuse => {
                self.scratch.clear();
                std::mem::take(&mut self.scratch)
            }
            DynamicRowDisposal::CreateNew => DynamicRow::default(),
        };
        for (i, field) in fields.iter().enumerate() {
            let key = match headers.and_then(|h| h.names().get(i)) {
                Some(name) => name.clone(),
                None => i.to_string(),
            };
            row.push(key, field.clone());
        }
        if let DynamicRowDisposal::Reuse = self.disposal {
            self.scratch = row.clone();
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_row_keyed_by_header_name() {
        let headers = HeaderIndex::new(vec!["id".to_string(), "name".to_string()]);
        let mut b = DynamicRowBuilder::new(DynamicRowDisposal::CreateNew);
        let row = b.build(&["1".to_string(), "alice".to_string()], Some(&headers));
        assert_eq!(row.get("id"), Some("1"));
        assert_eq!(row.get("name"), Some("alice"));
        assert_eq!(row.keys(), &["id".to_string(), "name".to_string()]);
    }

    #[test]
    fn builds_row_keyed_by_position_without_headers() {
        let mut b = DynamicRowBuilder::new(DynamicRowDisposal::CreateNew);
        let row = b.build(&["x".to_string(), "y".to_string()], None);
        assert_eq!(row.get("0"), Some("x"));
        assert_eq!(row.get("1"), Some("y"));
    }

    #[test]
    fn reuse_disposal_produces_independent_snapshots() {
        let headers = HeaderIndex::new(vec!["id".to_string()]);
        let mut b = DynamicRowBuilder::new(DynamicRowDisposal::Reuse);
        let first = b.build(&["1".to_string()], Some(&headers));
        let second = b.build(&["2".to_string()], Some(&headers));
        assert_eq!(first.get("id"), Some("1"));
        assert_eq!(second.get("id"), Some("2"));
    }
}
