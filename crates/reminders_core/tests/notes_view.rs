mod common;

use chrono::{Duration, Local, NaiveDate, TimeZone};
use common::harness;
use reminders_core::view::sections::{reminder_bucket, section_key};
use reminders_core::{NoteGuid, NotesFilter, NotesStore, SectionRole};

fn noon(date: NaiveDate) -> i64 {
    Local
        .from_local_datetime(&date.and_hms_opt(12, 0, 0).unwrap())
        .earliest()
        .unwrap()
        .timestamp_millis()
}

fn seeded_store() -> (common::Harness, NotesStore) {
    let h = harness();
    let mut store = NotesStore::new(h.context.clone());
    let rows = [
        ("a", "nb-1", 300, true),
        ("b", "nb-1", 100, false),
        ("c", "nb-2", 300, true),
        ("d", "nb-1", 200, false),
    ];
    for (guid, notebook, updated, reminder) in rows {
        let note = store.note_or_create(&NoteGuid::new(guid), 1);
        note.set_notebook_guid(notebook);
        note.set_updated(updated);
        note.set_reminder(reminder);
        if guid != "c" {
            note.add_tag("shared");
        }
    }
    store.note_mut("d").unwrap().set_is_search_result(true);
    (h, store)
}

fn guids(notes: Vec<&reminders_core::Note>) -> Vec<String> {
    notes
        .into_iter()
        .map(|note| note.guid().to_string())
        .collect()
}

#[test]
fn default_filter_orders_by_updated_then_guid() {
    let (_h, store) = seeded_store();
    let listed = store.filtered(&NotesFilter::new());
    assert_eq!(guids(listed), ["a", "c", "d", "b"]);
}

#[test]
fn filters_combine() {
    let (_h, store) = seeded_store();
    assert_eq!(
        guids(store.filtered(&NotesFilter::new().with_notebook("nb-1"))),
        ["a", "d", "b"]
    );
    assert_eq!(
        guids(store.filtered(&NotesFilter::new().with_tag("shared").reminders_only())),
        ["a"]
    );
    assert_eq!(
        guids(store.filtered(&NotesFilter::new().search_results_only())),
        ["d"]
    );
}

#[test]
fn deleted_notes_are_hidden() {
    let (_h, mut store) = seeded_store();
    store.sync_handle("a").unwrap().set_deleted(true);
    assert_eq!(
        guids(store.filtered(&NotesFilter::new())),
        ["c", "d", "b"]
    );
}

#[test]
fn reminder_buckets_use_stable_keys() {
    let (_h, mut store) = seeded_store();
    let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
    let note = store.note_mut("a").unwrap();

    note.set_reminder_time(None);
    assert_eq!(reminder_bucket(note, today), Some("no_date"));
    let cases = [
        (-3, "overdue"),
        (0, "today"),
        (1, "tomorrow"),
        (6, "next_week"),
        (12, "in_two_weeks"),
        (40, "later"),
    ];
    for (offset, expected) in cases {
        note.set_reminder_time(Some(noon(today + Duration::days(offset))));
        assert_eq!(reminder_bucket(note, today), Some(expected), "offset {offset}");
    }
    note.set_reminder_done(true);
    assert_eq!(reminder_bucket(note, today), Some("done"));

    let plain = store.note("b").unwrap();
    assert_eq!(reminder_bucket(plain, today), None);
}

#[test]
fn section_count_respects_filter_and_role() {
    let (_h, mut store) = seeded_store();
    let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
    for guid in ["a", "b", "c", "d"] {
        store
            .note_mut(guid)
            .unwrap()
            .set_created(noon(today - Duration::days(1)));
    }
    store.note_mut("c").unwrap().set_created(noon(today));

    let all = NotesFilter::new();
    assert_eq!(
        all.section_count(store.notes(), SectionRole::Created, "yesterday", today),
        3
    );
    assert_eq!(
        all.section_count(store.notes(), SectionRole::Notebook, "nb-1", today),
        3
    );
    let reminders = NotesFilter::new().reminders_only();
    assert_eq!(
        reminders.section_count(store.notes(), SectionRole::ReminderTime, "no_date", today),
        2
    );
    assert_eq!(
        section_key(store.note("c").unwrap(), SectionRole::Created, today).as_deref(),
        Some("today")
    );
}
