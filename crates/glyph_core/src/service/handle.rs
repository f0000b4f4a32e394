//! Async facade over [`NoteStore`].
//!
//! # Responsibility
//! - Let UI-facing callers issue store commands without blocking their
//!   thread: every call runs on tokio's blocking pool.
//! - Share one store between any number of cloned handles.
//!
//! # Invariants
//! - Calls are serialized by one mutex, so each command sees the effects of
//!   every command that completed before it.
//! - A poisoned lock or a failed worker is reported as `StorageUnavailable`
//!   for that call only.

use crate::config::StoreConfig;
use crate::error::{Operation, StoreError, StoreResult};
use crate::model::draft::NoteDraft;
use crate::model::note::{Note, NoteId};
use crate::model::tag::{NoteWithTags, Tag, TagId};
use crate::service::live::Subscription;
use crate::service::note_store::NoteStore;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

/// Cloneable async handle to one [`NoteStore`].
#[derive(Clone)]
pub struct StoreHandle {
    store: Arc<Mutex<NoteStore>>,
}

impl StoreHandle {
    pub fn new(store: NoteStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Opens the configured store on the blocking pool.
    pub async fn open(config: StoreConfig) -> StoreResult<Self> {
        let joined = tokio::task::spawn_blocking(move || NoteStore::open(&config)).await;
        match joined {
            Ok(store) => store.map(Self::new),
            Err(err) => Err(StoreError::unavailable(
                Operation::Open,
                format!("store worker failed: {err}"),
            )),
        }
    }

    /// Closes the store if this is the last handle; otherwise only releases
    /// this handle.
    pub async fn close(self) -> StoreResult<()> {
        let Ok(mutex) = Arc::try_unwrap(self.store) else {
            return Ok(());
        };
        let store = mutex
            .into_inner()
            .map_err(|_| StoreError::unavailable(Operation::Close, "store lock poisoned"))?;
        match tokio::task::spawn_blocking(move || store.close()).await {
            Ok(result) => result,
            Err(err) => Err(StoreError::unavailable(
                Operation::Close,
                format!("store worker failed: {err}"),
            )),
        }
    }

    pub async fn create_note(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> StoreResult<NoteId> {
        let (title, content) = (title.into(), content.into());
        self.run(Operation::CreateNote, move |store| {
            store.create_note(&title, &content)
        })
        .await
    }

    pub async fn update_note(
        &self,
        id: NoteId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> StoreResult<()> {
        let (title, content) = (title.into(), content.into());
        self.run(Operation::UpdateNote, move |store| {
            store.update_note(id, &title, &content)
        })
        .await
    }

    pub async fn delete_note(&self, id: NoteId) -> StoreResult<bool> {
        self.run(Operation::DeleteNote, move |store| store.delete_note(id))
            .await
    }

    pub async fn delete_all_notes(&self) -> StoreResult<usize> {
        self.run(Operation::DeleteAllNotes, |store| store.delete_all_notes())
            .await
    }

    pub async fn get_note(&self, id: NoteId) -> StoreResult<Note> {
        self.run(Operation::GetNote, move |store| store.get_note(id))
            .await
    }

    pub async fn list_notes(&self) -> StoreResult<Vec<Note>> {
        self.run(Operation::ListNotes, |store| store.list_notes())
            .await
    }

    pub async fn search(&self, query: impl Into<String>) -> StoreResult<Vec<Note>> {
        let query = query.into();
        self.run(Operation::Search, move |store| store.search(&query))
            .await
    }

    pub async fn last_id(&self) -> StoreResult<Option<NoteId>> {
        self.run(Operation::LastId, |store| store.last_id()).await
    }

    /// Saves `draft` and returns it bound to the persisted note, together with
    /// the saved read model.
    pub async fn save_note(&self, draft: NoteDraft) -> StoreResult<(NoteDraft, NoteWithTags)> {
        self.run(Operation::SaveNote, move |store| {
            let mut draft = draft;
            let saved = store.save_note(&mut draft)?;
            Ok((draft, saved))
        })
        .await
    }

    pub async fn create_tag(&self, name: impl Into<String>) -> StoreResult<Option<TagId>> {
        let name = name.into();
        self.run(Operation::CreateTag, move |store| store.create_tag(&name))
            .await
    }

    pub async fn rename_tag(&self, id: TagId, name: impl Into<String>) -> StoreResult<()> {
        let name = name.into();
        self.run(Operation::RenameTag, move |store| store.rename_tag(id, &name))
            .await
    }

    pub async fn delete_tag(&self, id: TagId) -> StoreResult<bool> {
        self.run(Operation::DeleteTag, move |store| store.delete_tag(id))
            .await
    }

    pub async fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        self.run(Operation::ListTags, |store| store.list_tags()).await
    }

    pub async fn find_tag_by_name(&self, name: impl Into<String>) -> StoreResult<Option<Tag>> {
        let name = name.into();
        self.run(Operation::FindTagByName, move |store| {
            store.find_tag_by_name(&name)
        })
        .await
    }

    pub async fn attach_tag(&self, note_id: NoteId, tag_id: TagId) -> StoreResult<()> {
        self.run(Operation::AttachTag, move |store| {
            store.attach_tag(note_id, tag_id)
        })
        .await
    }

    pub async fn detach_all_tags(&self, note_id: NoteId) -> StoreResult<usize> {
        self.run(Operation::DetachAllTags, move |store| {
            store.detach_all_tags(note_id)
        })
        .await
    }

    pub async fn get_note_with_tags(&self, id: NoteId) -> StoreResult<NoteWithTags> {
        self.run(Operation::GetNoteWithTags, move |store| {
            store.get_note_with_tags(id)
        })
        .await
    }

    pub async fn list_notes_with_tags(&self) -> StoreResult<Vec<NoteWithTags>> {
        self.run(Operation::ListNotesWithTags, |store| {
            store.list_notes_with_tags()
        })
        .await
    }

    pub async fn list_notes_with_all_tags(
        &self,
        selected: BTreeSet<TagId>,
    ) -> StoreResult<Vec<NoteWithTags>> {
        self.run(Operation::FilterByTags, move |store| {
            store.list_notes_with_all_tags(&selected)
        })
        .await
    }

    pub async fn subscribe_notes(&self) -> StoreResult<Subscription<Vec<Note>>> {
        self.run(Operation::Subscribe, |store| store.subscribe_notes())
            .await
    }

    pub async fn subscribe_notes_with_tags(
        &self,
    ) -> StoreResult<Subscription<Vec<NoteWithTags>>> {
        self.run(Operation::Subscribe, |store| {
            store.subscribe_notes_with_tags()
        })
        .await
    }

    pub async fn subscribe_tags(&self) -> StoreResult<Subscription<Vec<Tag>>> {
        self.run(Operation::Subscribe, |store| store.subscribe_tags())
            .await
    }

    pub async fn subscribe_search(
        &self,
        query: impl Into<String>,
    ) -> StoreResult<Subscription<Vec<Note>>> {
        let query = query.into();
        self.run(Operation::Subscribe, move |store| {
            store.subscribe_search(&query)
        })
        .await
    }

    pub async fn subscribe_note_with_tags(
        &self,
        id: NoteId,
    ) -> StoreResult<Subscription<Option<NoteWithTags>>> {
        self.run(Operation::Subscribe, move |store| {
            store.subscribe_note_with_tags(id)
        })
        .await
    }

    async fn run<T, F>(&self, operation: Operation, call: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut NoteStore) -> StoreResult<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let joined = tokio::task::spawn_blocking(move || {
            let mut guard = store
                .lock()
                .map_err(|_| StoreError::unavailable(operation, "store lock poisoned"))?;
            call(&mut *guard)
        })
        .await;

        match joined {
            Ok(result) => result,
            Err(err) => Err(StoreError::unavailable(
                operation,
                format!("store worker failed: {err}"),
            )),
        }
    }
}
