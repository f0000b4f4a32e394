use glyph_core::{ErrorKind, NoteDraft, NoteId, StoreConfig, StoreHandle};
use std::collections::BTreeSet;
use std::time::Duration;

async fn open_handle() -> StoreHandle {
    StoreHandle::open(StoreConfig::in_memory()).await.unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn handle_runs_note_commands() {
    let handle = open_handle().await;
    let id = handle.create_note("Groceries", "milk, eggs").await.unwrap();
    assert_eq!(handle.get_note(id).await.unwrap().title, "Groceries");

    handle.update_note(id, "Groceries", "milk").await.unwrap();
    assert_eq!(handle.search("MILK").await.unwrap().len(), 1);
    assert_eq!(handle.last_id().await.unwrap(), Some(id));

    assert!(handle.delete_note(id).await.unwrap());
    let err = handle.get_note(id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    handle.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_get_distinct_ids() {
    let handle = open_handle().await;
    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let handle = handle.clone();
            tokio::spawn(async move { handle.create_note(format!("note {i}"), "").await })
        })
        .collect();

    let mut ids = BTreeSet::new();
    for task in tasks {
        ids.insert(task.await.unwrap().unwrap());
    }
    assert_eq!(ids.len(), 16);
    assert_eq!(ids.first(), Some(&NoteId(1)));
    assert_eq!(ids.last(), Some(&NoteId(16)));
    assert_eq!(handle.list_notes().await.unwrap().len(), 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn subscription_wakes_after_handle_write() {
    let handle = open_handle().await;
    let mut notes = handle.subscribe_notes().await.unwrap();

    let writer = handle.clone();
    let id = writer.create_note("pushed", "").await.unwrap();

    let snapshot = tokio::time::timeout(Duration::from_secs(5), notes.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot[0].id, id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn draft_round_trips_through_handle() {
    let handle = open_handle().await;
    handle.create_tag("Work").await.unwrap();
    let work = handle.find_tag_by_name("Work").await.unwrap().unwrap();

    let mut draft = NoteDraft::new();
    draft.set_title("Plan");
    draft.add_tag(work.clone());
    let (mut draft, saved) = handle.save_note(draft).await.unwrap();
    assert_eq!(draft.id(), Some(saved.note.id));
    assert!(saved.has_tag(work.id));

    draft.set_content("details");
    let (_, saved_again) = handle.save_note(draft).await.unwrap();
    assert_eq!(saved_again.note.id, saved.note.id);
    assert_eq!(saved_again.note.content, "details");

    let selected: BTreeSet<_> = [work.id].into_iter().collect();
    let filtered = handle.list_notes_with_all_tags(selected).await.unwrap();
    assert_eq!(filtered.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn close_with_other_handles_alive_keeps_store_open() {
    let handle = open_handle().await;
    let other = handle.clone();
    handle.close().await.unwrap();

    other.create_note("still open", "").await.unwrap();
    let mut notes = other.subscribe_notes().await.unwrap();
    other.close().await.unwrap();
    assert_eq!(notes.changed().await, None);
}
