//! The authoritative in-memory space collection.
//!
//! [`SpaceStore`] is the only mutation path. Each operation derives a new
//! [`SpaceCollection`] from the current one and publishes it to watchers.
//! A failed operation publishes nothing.

mod collection;

use std::sync::Arc;

use gonggan_models::{
    GeneratedImage, ImageData, Message, Note, Space, SpaceFile, Thread, now,
};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

pub use collection::SpaceCollection;
use collection::{check_streaming, remove_by, thread_mut};

use crate::error::StoreError;

type StoreResult<T> = std::result::Result<T, StoreError>;

const NOTE_FILE_MIME: &str = "text/plain";

pub struct SpaceStore {
    tx: watch::Sender<Arc<SpaceCollection>>,
    /// Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl Default for SpaceStore {
    fn default() -> Self {
        Self::new(SpaceCollection::default())
    }
}

impl SpaceStore {
    pub fn new(collection: SpaceCollection) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(collection));
        Self {
            tx,
            write_lock: Mutex::new(()),
        }
    }

    /// Current collection.
    pub fn snapshot(&self) -> Arc<SpaceCollection> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<SpaceCollection>> {
        self.tx.subscribe()
    }

    pub fn space(&self, space_id: &str) -> StoreResult<Arc<Space>> {
        self.snapshot()
            .space(space_id)
            .cloned()
            .ok_or_else(|| StoreError::SpaceNotFound(space_id.to_string()))
    }

    /// Derive and publish a new collection.
    ///
    /// `Ok(None)` from the transform leaves the collection as it is and
    /// publishes nothing. Returns whether a new collection was published.
    pub fn apply<F>(&self, transform: F) -> StoreResult<bool>
    where
        F: FnOnce(&SpaceCollection) -> StoreResult<Option<SpaceCollection>>,
    {
        let _guard = self.write_lock.lock();
        let current = self.snapshot();
        match transform(&current)? {
            Some(next) => {
                self.tx.send_replace(Arc::new(next));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn commit<F>(&self, transform: F) -> StoreResult<()>
    where
        F: FnOnce(&SpaceCollection) -> StoreResult<SpaceCollection>,
    {
        self.apply(|current| transform(current).map(Some)).map(|_| ())
    }

    // Spaces

    /// Create an empty space at the front of the list.
    pub fn create_space(&self, title: &str) -> String {
        let space = Space::new(title);
        let id = space.id.clone();
        self.insert_space(space);
        debug!(space_id = %id, "Created space");
        id
    }

    /// Put a space, e.g. one just imported, at the front of the list.
    pub fn insert_space(&self, space: Space) {
        let _guard = self.write_lock.lock();
        let next = self.snapshot().insert_space(space);
        self.tx.send_replace(Arc::new(next));
    }

    pub fn remove_space(&self, space_id: &str) -> StoreResult<()> {
        self.commit(|c| c.remove_space(space_id))
    }

    pub fn update_title(&self, space_id: &str, title: &str) -> StoreResult<()> {
        self.commit(|c| c.update_space(space_id, |s| s.title = title.to_string()))
    }

    pub fn update_description(&self, space_id: &str, description: &str) -> StoreResult<()> {
        self.commit(|c| {
            c.update_space(space_id, |s| s.description = description.to_string())
        })
    }

    /// Set the persona text and, when given, the web-search flag.
    pub fn update_instructions(
        &self,
        space_id: &str,
        instructions: &str,
        web_search_enabled: Option<bool>,
    ) -> StoreResult<()> {
        self.commit(|c| {
            c.update_space(space_id, |s| {
                s.instructions = instructions.to_string();
                if let Some(enabled) = web_search_enabled {
                    s.web_search_enabled = enabled;
                }
            })
        })
    }

    pub fn touch_space(&self, space_id: &str) -> StoreResult<()> {
        self.commit(|c| c.update_space(space_id, |s| s.last_active = now()))
    }

    // Files

    /// Append uploaded files in order and return their ids.
    pub fn add_files(&self, space_id: &str, files: Vec<SpaceFile>) -> StoreResult<Vec<String>> {
        let ids = files.iter().map(|f| f.id.clone()).collect();
        self.commit(|c| {
            c.update_space(space_id, |s| s.files.extend(files.into_iter().map(Arc::new)))
        })?;
        Ok(ids)
    }

    pub fn add_link(&self, space_id: &str, url: &str) -> StoreResult<String> {
        let link = SpaceFile::link(url);
        let id = link.id.clone();
        self.commit(|c| c.update_space(space_id, |s| s.files.push(Arc::new(link))))?;
        Ok(id)
    }

    pub fn remove_file(&self, space_id: &str, file_id: &str) -> StoreResult<()> {
        self.commit(|c| {
            c.try_update_space(space_id, |s| {
                if remove_by(&mut s.files, |f| f.id == file_id) {
                    Ok(())
                } else {
                    Err(StoreError::FileNotFound(file_id.to_string()))
                }
            })
        })
    }

    // Threads and messages

    /// Create an empty thread at the front of the space's thread list.
    pub fn create_thread(&self, space_id: &str, title: &str) -> StoreResult<String> {
        let thread = Thread::new(title);
        let id = thread.id.clone();
        self.commit(|c| c.update_space(space_id, |s| s.threads.insert(0, Arc::new(thread))))?;
        debug!(space_id, thread_id = %id, "Created thread");
        Ok(id)
    }

    /// Append a message and bump the thread and space activity stamps.
    ///
    /// Rejects an id already used in the thread, and a streaming flag on
    /// anything but an AI text reply.
    pub fn append_message(
        &self,
        space_id: &str,
        thread_id: &str,
        message: Message,
    ) -> StoreResult<String> {
        check_streaming(&message)?;
        let id = message.id.clone();
        self.commit(|c| {
            c.try_update_space(space_id, |s| {
                let at = now();
                s.last_active = at;
                let thread = thread_mut(s, thread_id)?;
                if thread.message(&message.id).is_some() {
                    return Err(StoreError::DuplicateMessage(message.id.clone()));
                }
                thread.messages.push(Arc::new(message));
                thread.last_message_at = at;
                Ok(())
            })
        })?;
        Ok(id)
    }

    pub fn update_message<F>(
        &self,
        space_id: &str,
        thread_id: &str,
        message_id: &str,
        f: F,
    ) -> StoreResult<()>
    where
        F: FnOnce(&mut Message),
    {
        self.commit(|c| c.update_message(space_id, thread_id, message_id, f))
    }

    pub fn remove_message(
        &self,
        space_id: &str,
        thread_id: &str,
        message_id: &str,
    ) -> StoreResult<()> {
        self.commit(|c| {
            c.try_update_space(space_id, |s| {
                let thread = thread_mut(s, thread_id)?;
                if remove_by(&mut thread.messages, |m| m.id == message_id) {
                    Ok(())
                } else {
                    Err(StoreError::MessageNotFound(message_id.to_string()))
                }
            })
        })
    }

    // Notes

    pub fn add_note(&self, space_id: &str, content: &str) -> StoreResult<String> {
        let note = Note::new(content);
        let id = note.id.clone();
        self.commit(|c| c.update_space(space_id, |s| s.notes.push(Arc::new(note))))?;
        Ok(id)
    }

    pub fn update_note(&self, space_id: &str, note_id: &str, content: &str) -> StoreResult<()> {
        self.commit(|c| c.update_note(space_id, note_id, |n| n.content = content.to_string()))
    }

    pub fn delete_note(&self, space_id: &str, note_id: &str) -> StoreResult<()> {
        self.commit(|c| {
            c.try_update_space(space_id, |s| {
                if remove_by(&mut s.notes, |n| n.id == note_id) {
                    Ok(())
                } else {
                    Err(StoreError::NoteNotFound(note_id.to_string()))
                }
            })
        })
    }

    /// Copy a note into the space's files as `memo_<id suffix>.txt`.
    pub fn note_to_file(&self, space_id: &str, note_id: &str) -> StoreResult<String> {
        let mut file_id = String::new();
        self.commit(|c| {
            c.try_update_space(space_id, |s| {
                let note = s
                    .note(note_id)
                    .ok_or_else(|| StoreError::NoteNotFound(note_id.to_string()))?;
                let bytes = note.content.as_bytes().to_vec();
                let size = format!("{:.1} KB", bytes.len() as f64 / 1024.0);
                let mut file = SpaceFile::upload(
                    format!("memo_{}.txt", note.short_id()),
                    Some(NOTE_FILE_MIME),
                    bytes,
                );
                file.size = Some(size);
                file_id = file.id.clone();
                s.files.push(Arc::new(file));
                Ok(())
            })
        })?;
        Ok(file_id)
    }

    // Gallery

    /// Put placeholders at the front of the gallery in one update, keeping
    /// their relative order.
    pub fn insert_image_placeholders(
        &self,
        space_id: &str,
        placeholders: Vec<GeneratedImage>,
    ) -> StoreResult<Vec<String>> {
        let ids = placeholders.iter().map(|p| p.id.clone()).collect();
        self.commit(|c| {
            c.update_space(space_id, |s| {
                let previous = std::mem::take(&mut s.generated_images);
                s.generated_images = placeholders
                    .into_iter()
                    .map(Arc::new)
                    .chain(previous)
                    .collect();
            })
        })?;
        Ok(ids)
    }

    /// Settle a placeholder: `Some` completes it, `None` marks it failed.
    pub fn resolve_image(
        &self,
        space_id: &str,
        image_id: &str,
        image: Option<ImageData>,
    ) -> StoreResult<()> {
        self.commit(|c| {
            c.try_update_image(space_id, image_id, |entry| {
                let settled = match image {
                    Some(image) => entry.complete(image),
                    None => entry.fail(),
                };
                if settled {
                    Ok(())
                } else {
                    Err(StoreError::ImageAlreadySettled(image_id.to_string()))
                }
            })
        })
    }

    pub fn delete_image(&self, space_id: &str, image_id: &str) -> StoreResult<()> {
        self.commit(|c| {
            c.try_update_space(space_id, |s| {
                if remove_by(&mut s.generated_images, |i| i.id == image_id) {
                    Ok(())
                } else {
                    Err(StoreError::ImageNotFound(image_id.to_string()))
                }
            })
        })
    }
}
