use crate::services::ExamFileRecord;
use serde::Serialize;

/// One prior exam file offered as supporting evidence for analysis.
#[derive(Debug, Clone, Serialize)]
pub struct ExamEvidenceItem {
    pub id: i64,
    pub name: String,
    pub date: String,
    pub size_bytes: u64,
    pub status: String,
    pub url: String,
    pub selected: bool,
}

impl From<ExamFileRecord> for ExamEvidenceItem {
    fn from(record: ExamFileRecord) -> Self {
        Self {
            id: record.id,
            name: record.filename,
            date: record.upload_date,
            size_bytes: record.file_size,
            status: record.status,
            url: record.file_url,
            selected: false,
        }
    }
}

/// Tracks which of a patient's prior exams the clinician has marked as
/// evidence for the next analysis run.
///
/// Selections only ever refer to items in the loaded list, so the set of
/// selected ids is always a subset of the available ids.
#[derive(Debug, Default)]
pub struct EvidenceSelector {
    items: Vec<ExamEvidenceItem>,
}

impl EvidenceSelector {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Replace the available list with a fresh fetch. All selections reset.
    pub fn replace(&mut self, records: Vec<ExamFileRecord>) {
        self.items = records.into_iter().map(ExamEvidenceItem::from).collect();
    }

    pub fn items(&self) -> &[ExamEvidenceItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Flip the selection mark on one item. Unknown ids are ignored.
    pub fn toggle(&mut self, id: i64) {
        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.selected = !item.selected;
        }
    }

    pub fn selected_ids(&self) -> Vec<i64> {
        self.items
            .iter()
            .filter(|item| item.selected)
            .map(|item| item.id)
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        self.items.iter().filter(|item| item.selected).count()
    }

    /// Case-insensitive substring filter over item names. An empty query
    /// matches everything. The iterator is lazy and borrows the list, so
    /// it can be re-run cheaply as the clinician types.
    pub fn search<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a ExamEvidenceItem> + 'a {
        let needle = query.trim().to_lowercase();
        self.items
            .iter()
            .filter(move |item| needle.is_empty() || item.name.to_lowercase().contains(&needle))
    }
}
