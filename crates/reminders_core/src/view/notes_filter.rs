//! Filtered note list.

use crate::model::note::Note;
use crate::view::sections::{section_key, SectionRole};
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Criteria a note must meet to be listed. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotesFilter {
    pub notebook_guid: Option<String>,
    pub tag_guid: Option<String>,
    pub only_reminders: bool,
    pub only_search_results: bool,
}

impl NotesFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notebook(mut self, notebook_guid: impl Into<String>) -> Self {
        self.notebook_guid = Some(notebook_guid.into());
        self
    }

    pub fn with_tag(mut self, tag_guid: impl Into<String>) -> Self {
        self.tag_guid = Some(tag_guid.into());
        self
    }

    pub fn reminders_only(mut self) -> Self {
        self.only_reminders = true;
        self
    }

    pub fn search_results_only(mut self) -> Self {
        self.only_search_results = true;
        self
    }

    pub fn accepts(&self, note: &Note) -> bool {
        if note.deleted() {
            return false;
        }
        if let Some(notebook_guid) = self.notebook_guid.as_deref() {
            if note.notebook_guid() != notebook_guid {
                return false;
            }
        }
        if let Some(tag_guid) = self.tag_guid.as_deref() {
            if !note.tag_guids().iter().any(|tag| tag == tag_guid) {
                return false;
            }
        }
        if self.only_reminders && !note.reminder() {
            return false;
        }
        if self.only_search_results && !note.is_search_result() {
            return false;
        }
        true
    }

    /// Accepted notes sorted by `updated DESC, guid ASC`.
    pub fn apply<'a>(&self, notes: impl IntoIterator<Item = &'a Note>) -> Vec<&'a Note> {
        let mut accepted: Vec<&Note> = notes
            .into_iter()
            .filter(|note| self.accepts(note))
            .collect();
        accepted.sort_by(|left, right| view_order(left, right));
        accepted
    }

    /// Number of accepted notes whose `role` section is `section`.
    pub fn section_count<'a>(
        &self,
        notes: impl IntoIterator<Item = &'a Note>,
        role: SectionRole,
        section: &str,
        today: NaiveDate,
    ) -> usize {
        notes
            .into_iter()
            .filter(|note| self.accepts(note))
            .filter(|note| section_key(note, role, today).as_deref() == Some(section))
            .count()
    }
}

fn view_order(left: &Note, right: &Note) -> Ordering {
    right
        .updated()
        .cmp(&left.updated())
        .then_with(|| left.guid().cmp(right.guid()))
}
