use std::collections::BTreeMap;

use super::domain::{EntityKind, EntityRow};

/// Lower-cased copy of a row's columns, kept at the same position as the row it mirrors.
#[derive(Debug, Clone, PartialEq, Eq)]
struct IndexEntry {
    id: String,
    haystack: BTreeMap<String, String>,
}

impl IndexEntry {
    fn from_row(row: &EntityRow) -> Self {
        Self {
            id: row.entity.id.clone(),
            haystack: row
                .columns
                .iter()
                .map(|(key, value)| (key.clone(), value.to_lowercase()))
                .collect(),
        }
    }
}

/// Per-column substring criteria; empty values are ignored, as on the search screens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    criteria: BTreeMap<String, String>,
}

impl RowFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, needle: impl AsRef<str>) -> Self {
        let needle = needle.as_ref().trim().to_lowercase();
        if !needle.is_empty() {
            self.criteria.insert(column.into(), needle);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    fn matches(&self, entry: &IndexEntry) -> bool {
        self.criteria.iter().all(|(column, needle)| {
            entry
                .haystack
                .get(column)
                .is_some_and(|value| value.contains(needle.as_str()))
        })
    }
}

/// Rows of one list screen together with their filter index. Both vectors only change
/// inside `&mut self` methods that update them together, so a removed row can never be
/// found again through filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListViewModel {
    kind: EntityKind,
    rows: Vec<EntityRow>,
    index: Vec<IndexEntry>,
}

impl ListViewModel {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            rows: Vec::new(),
            index: Vec::new(),
        }
    }

    /// Builds the view from a list response. Rows of another kind and repeated ids are
    /// skipped.
    pub fn from_rows(kind: EntityKind, rows: impl IntoIterator<Item = EntityRow>) -> Self {
        let mut view = Self::new(kind);
        for row in rows {
            if row.entity.kind == kind && view.position(&row.entity.id).is_none() {
                view.index.push(IndexEntry::from_row(&row));
                view.rows.push(row);
            }
        }
        view
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn rows(&self) -> &[EntityRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&EntityRow> {
        self.position(id).map(|position| &self.rows[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Ids currently present in the filter index, in display order.
    pub fn indexed_ids(&self) -> Vec<&str> {
        self.index.iter().map(|entry| entry.id.as_str()).collect()
    }

    pub fn filter(&self, filter: &RowFilter) -> Vec<&EntityRow> {
        self.index
            .iter()
            .zip(&self.rows)
            .filter(|(entry, _)| filter.matches(entry))
            .map(|(_, row)| row)
            .collect()
    }

    pub fn remove(&mut self, id: &str) -> Option<EntityRow> {
        let position = self.position(id)?;
        self.index.remove(position);
        Some(self.rows.remove(position))
    }

    /// Replaces an existing row in place. Returns `false` when the row is not rendered.
    pub fn replace(&mut self, row: EntityRow) -> bool {
        if row.entity.kind != self.kind {
            return false;
        }
        match self.position(&row.entity.id) {
            Some(position) => {
                self.index[position] = IndexEntry::from_row(&row);
                self.rows[position] = row;
                true
            }
            None => false,
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.rows.iter().position(|row| row.entity.id == id)
    }
}
