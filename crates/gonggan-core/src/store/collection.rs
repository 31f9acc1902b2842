//! Immutable space collection with path-scoped updates.
//!
//! Every update clones the top-level list of `Arc`s and rebuilds only the
//! addressed node and its ancestors through `Arc::make_mut`; all other spaces,
//! threads, messages and entities stay pointer-equal to the source snapshot.
//! A failed lookup returns an error and the source snapshot is unchanged.

use std::sync::Arc;

use gonggan_models::{GeneratedImage, Message, Note, Space, SpaceFile, Thread};

use crate::error::StoreError;

type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpaceCollection {
    spaces: Vec<Arc<Space>>,
}

impl SpaceCollection {
    pub fn new(spaces: Vec<Space>) -> Self {
        Self {
            spaces: spaces.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn spaces(&self) -> &[Arc<Space>] {
        &self.spaces
    }

    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }

    pub fn space(&self, space_id: &str) -> Option<&Arc<Space>> {
        self.spaces.iter().find(|s| s.id == space_id)
    }

    pub fn thread(&self, space_id: &str, thread_id: &str) -> Option<&Arc<Thread>> {
        self.space(space_id)?.thread(thread_id)
    }

    pub fn message(
        &self,
        space_id: &str,
        thread_id: &str,
        message_id: &str,
    ) -> Option<&Arc<Message>> {
        self.thread(space_id, thread_id)?.message(message_id)
    }

    /// Put a space at the front of the list.
    pub fn insert_space(&self, space: Space) -> Self {
        let mut spaces = Vec::with_capacity(self.spaces.len() + 1);
        spaces.push(Arc::new(space));
        spaces.extend(self.spaces.iter().cloned());
        Self { spaces }
    }

    pub fn remove_space(&self, space_id: &str) -> StoreResult<Self> {
        let index = self
            .spaces
            .iter()
            .position(|s| s.id == space_id)
            .ok_or_else(|| StoreError::SpaceNotFound(space_id.to_string()))?;
        let mut spaces = self.spaces.clone();
        spaces.remove(index);
        Ok(Self { spaces })
    }

    /// Rebuild one space with a transform that may reject the edit.
    pub fn try_update_space<F>(&self, space_id: &str, f: F) -> StoreResult<Self>
    where
        F: FnOnce(&mut Space) -> StoreResult<()>,
    {
        let mut spaces = self.spaces.clone();
        let space = find_mut(&mut spaces, |s| s.id == space_id)
            .ok_or_else(|| StoreError::SpaceNotFound(space_id.to_string()))?;
        f(space)?;
        Ok(Self { spaces })
    }

    pub fn update_space<F>(&self, space_id: &str, f: F) -> StoreResult<Self>
    where
        F: FnOnce(&mut Space),
    {
        self.try_update_space(space_id, |space| {
            f(space);
            Ok(())
        })
    }

    pub fn update_thread<F>(&self, space_id: &str, thread_id: &str, f: F) -> StoreResult<Self>
    where
        F: FnOnce(&mut Thread),
    {
        self.try_update_space(space_id, |space| {
            let thread = thread_mut(space, thread_id)?;
            f(thread);
            Ok(())
        })
    }

    pub fn update_message<F>(
        &self,
        space_id: &str,
        thread_id: &str,
        message_id: &str,
        f: F,
    ) -> StoreResult<Self>
    where
        F: FnOnce(&mut Message),
    {
        self.try_update_space(space_id, |space| {
            let thread = thread_mut(space, thread_id)?;
            let message = find_mut(&mut thread.messages, |m| m.id == message_id)
                .ok_or_else(|| StoreError::MessageNotFound(message_id.to_string()))?;
            f(message);
            check_streaming(message)
        })
    }

    pub fn update_file<F>(&self, space_id: &str, file_id: &str, f: F) -> StoreResult<Self>
    where
        F: FnOnce(&mut SpaceFile),
    {
        self.try_update_space(space_id, |space| {
            let file = find_mut(&mut space.files, |file| file.id == file_id)
                .ok_or_else(|| StoreError::FileNotFound(file_id.to_string()))?;
            f(file);
            Ok(())
        })
    }

    pub fn try_update_image<F>(&self, space_id: &str, image_id: &str, f: F) -> StoreResult<Self>
    where
        F: FnOnce(&mut GeneratedImage) -> StoreResult<()>,
    {
        self.try_update_space(space_id, |space| {
            let image = find_mut(&mut space.generated_images, |i| i.id == image_id)
                .ok_or_else(|| StoreError::ImageNotFound(image_id.to_string()))?;
            f(image)
        })
    }

    pub fn update_note<F>(&self, space_id: &str, note_id: &str, f: F) -> StoreResult<Self>
    where
        F: FnOnce(&mut Note),
    {
        self.try_update_space(space_id, |space| {
            let note = find_mut(&mut space.notes, |n| n.id == note_id)
                .ok_or_else(|| StoreError::NoteNotFound(note_id.to_string()))?;
            f(note);
            Ok(())
        })
    }
}

pub(super) fn thread_mut<'a>(
    space: &'a mut Space,
    thread_id: &str,
) -> StoreResult<&'a mut Thread> {
    find_mut(&mut space.threads, |t| t.id == thread_id)
        .ok_or_else(|| StoreError::ThreadNotFound(thread_id.to_string()))
}

/// Only AI text replies may carry the streaming flag.
pub(super) fn check_streaming(message: &Message) -> StoreResult<()> {
    if message.is_streaming && !message.is_ai_text() {
        return Err(StoreError::StreamingNotAllowed(message.id.clone()));
    }
    Ok(())
}

/// Copy-on-write access to the first matching entry.
fn find_mut<T, P>(items: &mut [Arc<T>], predicate: P) -> Option<&mut T>
where
    T: Clone,
    P: Fn(&T) -> bool,
{
    items
        .iter_mut()
        .find(|item| predicate(item))
        .map(Arc::make_mut)
}

/// Remove the first matching entry, keeping the order of the rest.
pub(super) fn remove_by<T, P>(items: &mut Vec<Arc<T>>, predicate: P) -> bool
where
    P: Fn(&T) -> bool,
{
    match items.iter().position(|item| predicate(item)) {
        Some(index) => {
            items.remove(index);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use gonggan_models::{ImageData, MessageContent};

    use super::*;

    struct Fixture {
        collection: SpaceCollection,
        space_a: String,
        space_b: String,
        thread_1: String,
        thread_2: String,
        message: String,
        images: Vec<String>,
    }

    fn fixture() -> Fixture {
        let mut a = Space::new("a");
        let mut t1 = Thread::new("one");
        let message = Message::ai_text("hello");
        let message_id = message.id.clone();
        t1.messages.push(Arc::new(Message::user("hi")));
        t1.messages.push(Arc::new(message));
        let t2 = Thread::new("two");
        let (thread_1, thread_2) = (t1.id.clone(), t2.id.clone());
        a.threads = vec![Arc::new(t1), Arc::new(t2)];
        let images: Vec<GeneratedImage> = (0..3)
            .map(|i| GeneratedImage::placeholder(format!("p{i}"), "1:1", "1K"))
            .collect();
        let image_ids = images.iter().map(|i| i.id.clone()).collect();
        a.generated_images = images.into_iter().map(Arc::new).collect();
        a.notes.push(Arc::new(Note::new("n")));

        let b = Space::new("b");
        Fixture {
            space_a: a.id.clone(),
            space_b: b.id.clone(),
            collection: SpaceCollection::new(vec![a, b]),
            thread_1,
            thread_2,
            message: message_id,
            images: image_ids,
        }
    }

    #[test]
    fn test_message_update_shares_untouched_branches() {
        let f = fixture();
        let next = f
            .collection
            .update_message(&f.space_a, &f.thread_1, &f.message, |m| {
                m.content = MessageContent::Text("changed".into());
            })
            .unwrap();

        let before = f.collection.space(&f.space_a).unwrap();
        let after = next.space(&f.space_a).unwrap();
        assert!(!Arc::ptr_eq(before, after));
        assert!(Arc::ptr_eq(
            f.collection.space(&f.space_b).unwrap(),
            next.space(&f.space_b).unwrap()
        ));
        assert!(Arc::ptr_eq(&before.threads[1], &after.threads[1]));
        assert!(Arc::ptr_eq(&before.threads[0].messages[0], &after.threads[0].messages[0]));
        assert!(Arc::ptr_eq(&before.generated_images[0], &after.generated_images[0]));
        assert!(Arc::ptr_eq(&before.notes[0], &after.notes[0]));

        assert_eq!(
            next.message(&f.space_a, &f.thread_1, &f.message).unwrap().text(),
            Some("changed")
        );
        assert_eq!(
            f.collection
                .message(&f.space_a, &f.thread_1, &f.message)
                .unwrap()
                .text(),
            Some("hello")
        );
    }

    #[test]
    fn test_missing_path_is_rejected() {
        let f = fixture();
        assert_eq!(
            f.collection.update_space("nope", |_| {}).unwrap_err(),
            StoreError::SpaceNotFound("nope".into())
        );
        assert_eq!(
            f.collection.update_thread(&f.space_a, "nope", |_| {}).unwrap_err(),
            StoreError::ThreadNotFound("nope".into())
        );
        assert_eq!(
            f.collection
                .update_message(&f.space_a, &f.thread_2, &f.message, |_| {})
                .unwrap_err(),
            StoreError::MessageNotFound(f.message.clone())
        );
        assert!(matches!(
            f.collection.update_note(&f.space_b, "x", |_| {}),
            Err(StoreError::NoteNotFound(_))
        ));
        assert!(matches!(
            f.collection.remove_space("x"),
            Err(StoreError::SpaceNotFound(_))
        ));
    }

    #[test]
    fn test_updates_to_different_leaves_commute() {
        let f = fixture();
        let complete = |c: &SpaceCollection, id: &str| {
            c.try_update_image(&f.space_a, id, |image| {
                image.complete(ImageData::png(id.as_bytes().to_vec()));
                Ok(())
            })
            .unwrap()
        };
        let fail = |c: &SpaceCollection, id: &str| {
            c.try_update_image(&f.space_a, id, |image| {
                image.fail();
                Ok(())
            })
            .unwrap()
        };

        let ab = fail(&complete(&f.collection, &f.images[0]), &f.images[1]);
        let ba = complete(&fail(&f.collection, &f.images[1]), &f.images[0]);
        assert_eq!(ab, ba);

        let rename = |c: &SpaceCollection, title: &str| {
            c.update_thread(&f.space_a, &f.thread_2, |t| t.title = title.into())
                .unwrap()
        };
        let x = rename(&complete(&f.collection, &f.images[2]), "x");
        let y = complete(&rename(&f.collection, "x"), &f.images[2]);
        assert_eq!(x, y);
    }

    #[test]
    fn test_same_leaf_last_applied_wins() {
        let f = fixture();
        let set = |c: &SpaceCollection, text: &str| {
            c.update_message(&f.space_a, &f.thread_1, &f.message, |m| {
                m.content = MessageContent::Text(text.into());
            })
            .unwrap()
        };
        let next = set(&set(&f.collection, "first"), "second");
        assert_eq!(
            next.message(&f.space_a, &f.thread_1, &f.message).unwrap().text(),
            Some("second")
        );
    }

    #[test]
    fn test_insert_and_remove_space() {
        let f = fixture();
        let next = f.collection.insert_space(Space::new("c"));
        assert_eq!(next.len(), 3);
        assert_eq!(next.spaces()[0].title, "c");
        assert!(Arc::ptr_eq(&next.spaces()[1], &f.collection.spaces()[0]));

        let removed = next.remove_space(&f.space_a).unwrap();
        let titles: Vec<&str> = removed.spaces().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["c", "b"]);
    }
}
