//! In-memory board: four ordered collections, newest first.
//!
//! Every operation is synchronous and total. An unknown id is a no-op that
//! reports `false` / `None`.

use crate::model::{Content, ContentId, ContentKind, SyncStatus, Theory, VisionImage, VisionVideo, Wish};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry<T> {
    pub item: T,
    pub sync: SyncStatus,
    /// Whether a row exists on the server. Demo and fallback records never do.
    pub persisted: bool,
}

impl<T> Entry<T> {
    pub fn local(item: T) -> Self {
        Self {
            item,
            sync: SyncStatus::Local,
            persisted: false,
        }
    }

    pub fn confirmed(item: T) -> Self {
        Self {
            item,
            sync: SyncStatus::Confirmed,
            persisted: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Collection<T> {
    entries: Vec<Entry<T>>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: Content> Collection<T> {
    pub fn from_entries(entries: Vec<Entry<T>>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Entry<T>] {
        &self.entries
    }

    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|e| &e.item)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &ContentId) -> Option<&Entry<T>> {
        self.entries.iter().find(|e| e.item.id() == id)
    }

    fn get_mut(&mut self, id: &ContentId) -> Option<&mut Entry<T>> {
        self.entries.iter_mut().find(|e| e.item.id() == id)
    }

    pub fn contains(&self, id: &ContentId) -> bool {
        self.get(id).is_some()
    }

    pub fn add_local(&mut self, entry: Entry<T>) {
        self.entries.insert(0, entry);
    }

    /// Replaces the record with the same id, keeping its position.
    pub fn replace_by_id(&mut self, item: T) -> bool {
        match self.get_mut(item.id()) {
            Some(entry) => {
                entry.item = item;
                true
            }
            None => false,
        }
    }

    /// Overwrites the entry with the same id, sync state included.
    pub fn restore(&mut self, entry: Entry<T>) -> bool {
        match self.get_mut(entry.item.id()) {
            Some(slot) => {
                *slot = entry;
                true
            }
            None => false,
        }
    }

    pub fn remove_by_id(&mut self, id: &ContentId) -> Option<Entry<T>> {
        let index = self.entries.iter().position(|e| e.item.id() == id)?;
        Some(self.entries.remove(index))
    }

    /// Swaps the client record for the server's, in place.
    pub fn confirm_insert(&mut self, local_id: &ContentId, confirmed: T) -> bool {
        match self.get_mut(local_id) {
            Some(entry) => {
                *entry = Entry::confirmed(confirmed);
                true
            }
            None => false,
        }
    }

    pub fn mark(&mut self, id: &ContentId, sync: SyncStatus) -> bool {
        match self.get_mut(id) {
            Some(entry) => {
                entry.sync = sync;
                true
            }
            None => false,
        }
    }

    /// Millisecond timestamp id, bumped past any collision.
    pub fn next_local_id(&self, now_ms: u64) -> ContentId {
        let mut candidate = now_ms;
        loop {
            let id = ContentId::new(candidate.to_string());
            if !self.contains(&id) {
                return id;
            }
            candidate = candidate.saturating_add(1);
        }
    }

    fn count(&self, sync: SyncStatus) -> usize {
        self.entries.iter().filter(|e| e.sync == sync).count()
    }

    fn in_flight(&self) -> usize {
        self.entries.iter().filter(|e| e.sync.is_in_flight()).count()
    }
}

impl Collection<Wish> {
    /// Flips completion of one wish, returning the updated wish.
    pub fn toggle_wish_completion(&mut self, id: &ContentId) -> Option<&Wish> {
        let entry = self.get_mut(id)?;
        entry.item.toggle_completion();
        Some(&entry.item)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Board {
    pub theories: Collection<Theory>,
    pub wishes: Collection<Wish>,
    pub images: Collection<VisionImage>,
    pub videos: Collection<VisionVideo>,
}

/// A record type with a home on the [`Board`] and in a [`PendingLoad`].
pub trait Stored: Content + Sized {
    fn slot(board: &Board) -> &Collection<Self>;
    fn slot_mut(board: &mut Board) -> &mut Collection<Self>;
    fn pending(load: &mut PendingLoad) -> &mut Option<Vec<Self>>;
}

macro_rules! impl_stored {
    ($ty:ty, $field:ident) => {
        impl Stored for $ty {
            fn slot(board: &Board) -> &Collection<Self> {
                &board.$field
            }
            fn slot_mut(board: &mut Board) -> &mut Collection<Self> {
                &mut board.$field
            }
            fn pending(load: &mut PendingLoad) -> &mut Option<Vec<Self>> {
                &mut load.$field
            }
        }
    };
}

impl_stored!(Theory, theories);
impl_stored!(Wish, wishes);
impl_stored!(VisionImage, images);
impl_stored!(VisionVideo, videos);

impl Board {
    pub fn collection<T: Stored>(&self) -> &Collection<T> {
        T::slot(self)
    }

    pub fn collection_mut<T: Stored>(&mut self) -> &mut Collection<T> {
        T::slot_mut(self)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.theories.len() + self.wishes.len() + self.images.len() + self.videos.len()
    }

    pub fn contains(&self, kind: ContentKind, id: &ContentId) -> bool {
        match kind {
            ContentKind::Theory => self.theories.contains(id),
            ContentKind::Wish => self.wishes.contains(id),
            ContentKind::Image => self.images.contains(id),
            ContentKind::Video => self.videos.contains(id),
        }
    }

    /// Sync status and persistence of one record.
    pub fn state(&self, kind: ContentKind, id: &ContentId) -> Option<(SyncStatus, bool)> {
        fn pick<T: Content>(c: &Collection<T>, id: &ContentId) -> Option<(SyncStatus, bool)> {
            c.get(id).map(|e| (e.sync, e.persisted))
        }
        match kind {
            ContentKind::Theory => pick(&self.theories, id),
            ContentKind::Wish => pick(&self.wishes, id),
            ContentKind::Image => pick(&self.images, id),
            ContentKind::Video => pick(&self.videos, id),
        }
    }

    pub fn remove(&mut self, kind: ContentKind, id: &ContentId) -> bool {
        match kind {
            ContentKind::Theory => self.theories.remove_by_id(id).is_some(),
            ContentKind::Wish => self.wishes.remove_by_id(id).is_some(),
            ContentKind::Image => self.images.remove_by_id(id).is_some(),
            ContentKind::Video => self.videos.remove_by_id(id).is_some(),
        }
    }

    pub fn mark(&mut self, kind: ContentKind, id: &ContentId, sync: SyncStatus) -> bool {
        match kind {
            ContentKind::Theory => self.theories.mark(id, sync),
            ContentKind::Wish => self.wishes.mark(id, sync),
            ContentKind::Image => self.images.mark(id, sync),
            ContentKind::Video => self.videos.mark(id, sync),
        }
    }

    pub fn toggle_wish_completion(&mut self, id: &ContentId) -> Option<&Wish> {
        self.wishes.toggle_wish_completion(id)
    }

    /// Records with a request in flight.
    pub fn pending_count(&self) -> usize {
        self.theories.in_flight()
            + self.wishes.in_flight()
            + self.images.in_flight()
            + self.videos.in_flight()
    }

    pub fn failed_count(&self) -> usize {
        let failed = SyncStatus::Failed;
        self.theories.count(failed)
            + self.wishes.count(failed)
            + self.images.count(failed)
            + self.videos.count(failed)
    }
}

/// Collections gathered by one load generation. Complete once all four
/// lists have answered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingLoad {
    pub generation: u64,
    pub theories: Option<Vec<Theory>>,
    pub wishes: Option<Vec<Wish>>,
    pub images: Option<Vec<VisionImage>>,
    pub videos: Option<Vec<VisionVideo>>,
}

impl PendingLoad {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.theories.is_some() && self.wishes.is_some() && self.images.is_some() && self.videos.is_some()
    }

    /// The loaded board, or `None` while lists are outstanding.
    pub fn into_board(self) -> Option<Board> {
        fn confirmed<T: Content>(items: Vec<T>) -> Collection<T> {
            Collection::from_entries(items.into_iter().map(Entry::confirmed).collect())
        }
        Some(Board {
            theories: confirmed(self.theories?),
            wishes: confirmed(self.wishes?),
            images: confirmed(self.images?),
            videos: confirmed(self.videos?),
        })
    }
}
