use std::collections::HashMap;

/// Maps column names to their position in the header record, built once per
/// input by reading the first (non-comment, non-blank) record as headers.
///
/// Needed by `ConstructMode::ByName` (see `row.rs`): a descriptor bound by
/// column name rather than position can only resolve which field index to
/// read once the header record has been fully collected.
#[derive(Clone, Debug, Default)]
pub struct HeaderIndex {
    names: Vec<String>,
    by_name: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn new(names: Vec<String>) -> HeaderIndex {
        let mut by_name = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            by_name.entry(name.clone()).or_insert(i);
        }
        HeaderIndex { names, by_name }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The field position for `name`, if present. Duplicate header names
    /// resolve to the first occurrence.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_column_position_by_name() {
        let idx = HeaderIndex::new(vec!["id".to_string(), "name".to_string()]);
        assert_eq!(idx.position("id"), Some(0));
        assert_eq!(idx.position("name"), Some(1));
        assert_eq!(idx.position("missing"), None);
    }

    #[test]
    fn duplicate_header_keeps_first_position() {
        let idx = HeaderIndex::new(vec!["id".to_string(), "id".to_string()]);
        assert_eq!(idx.position("id"), Some(0));
    }
}
