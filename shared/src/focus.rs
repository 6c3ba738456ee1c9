//! Focus mode: every record in one shuffled, circular sequence.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::cache::Board;
use crate::grid::{all_items, ItemRef};
use crate::model::{ContentId, ContentKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusKey {
    Next,
    Previous,
    Close,
}

impl FocusKey {
    /// DOM key names; anything else is ignored.
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "ArrowRight" => Some(FocusKey::Next),
            "ArrowLeft" => Some(FocusKey::Previous),
            "Escape" => Some(FocusKey::Close),
            _ => None,
        }
    }
}

/// Snapshot of the board taken when focus mode opens. Only deletions and
/// insert confirmations reach it afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FocusSequence {
    items: Vec<ItemRef>,
    index: usize,
}

impl FocusSequence {
    pub fn shuffled<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> Self {
        let mut items: Vec<ItemRef> = all_items(board).map(|i| i.item_ref()).collect();
        items.shuffle(rng);
        Self { items, index: 0 }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn items(&self) -> &[ItemRef] {
        &self.items
    }

    pub fn current(&self) -> Option<&ItemRef> {
        self.items.get(self.index)
    }

    pub fn next(&mut self) {
        if !self.items.is_empty() {
            self.index = (self.index + 1) % self.items.len();
        }
    }

    pub fn previous(&mut self) {
        if !self.items.is_empty() {
            self.index = (self.index + self.items.len() - 1) % self.items.len();
        }
    }

    pub fn remove(&mut self, kind: ContentKind, id: &ContentId) {
        let Some(position) = self.items.iter().position(|i| i.kind == kind && &i.id == id) else {
            return;
        };
        self.items.remove(position);
        if position < self.index {
            self.index -= 1;
        }
        if self.index >= self.items.len() {
            self.index = 0;
        }
    }

    /// Drops every item `keep` rejects, holding on to the current one when
    /// it survives.
    pub fn retain(&mut self, mut keep: impl FnMut(&ItemRef) -> bool) {
        let current = self.current().cloned();
        self.items.retain(|item| keep(item));
        self.index = current
            .and_then(|c| self.items.iter().position(|i| *i == c))
            .unwrap_or(0);
    }

    pub fn rename(&mut self, kind: ContentKind, from: &ContentId, to: &ContentId) {
        for item in self.items.iter_mut().filter(|i| i.kind == kind && &i.id == from) {
            item.id = to.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    fn sequence() -> FocusSequence {
        FocusSequence::shuffled(&demo::board(), &mut StdRng::seed_from_u64(7))
    }

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(FocusKey::parse("ArrowRight"), Some(FocusKey::Next));
        assert_eq!(FocusKey::parse("ArrowLeft"), Some(FocusKey::Previous));
        assert_eq!(FocusKey::parse("Escape"), Some(FocusKey::Close));
        assert_eq!(FocusKey::parse("Enter"), None);
    }

    #[test]
    fn shuffle_is_a_permutation_of_the_board() {
        let board = demo::board();
        let seq = sequence();
        assert_eq!(seq.len(), board.len());
        let shuffled: BTreeSet<_> = seq.items().iter().cloned().collect();
        let original: BTreeSet<_> = all_items(&board).map(|i| i.item_ref()).collect();
        assert_eq!(shuffled, original);
        assert_eq!(seq.index(), 0);
    }

    #[test]
    fn navigation_wraps() {
        let mut seq = sequence();
        seq.previous();
        assert_eq!(seq.index(), seq.len() - 1);
        seq.next();
        assert_eq!(seq.index(), 0);
    }

    #[test]
    fn empty_sequence_ignores_navigation() {
        let mut seq = FocusSequence::shuffled(&Board::default(), &mut StdRng::seed_from_u64(1));
        seq.next();
        seq.previous();
        assert_eq!(seq.index(), 0);
        assert!(seq.current().is_none());
    }

    #[test]
    fn removing_keeps_current_item() {
        let mut seq = sequence();
        seq.next();
        seq.next();
        let current = seq.current().cloned().unwrap();
        let first = seq.items()[0].clone();
        seq.remove(first.kind, &first.id);
        assert_eq!(seq.current(), Some(&current));
    }

    #[test]
    fn removing_last_wraps_to_start() {
        let mut seq = sequence();
        seq.previous();
        let last = seq.current().cloned().unwrap();
        seq.remove(last.kind, &last.id);
        assert_eq!(seq.index(), 0);
        assert_eq!(seq.len(), demo::board().len() - 1);
    }

    #[test]
    fn retain_keeps_current_when_possible() {
        let mut seq = sequence();
        seq.next();
        let current = seq.current().cloned().unwrap();
        seq.retain(|i| i.kind == current.kind);
        assert_eq!(seq.current(), Some(&current));
        seq.retain(|_| false);
        assert!(seq.is_empty());
        assert_eq!(seq.index(), 0);
    }

    #[test]
    fn rename_follows_server_ids() {
        let mut seq = sequence();
        let target = seq.items()[1].clone();
        let new_id = ContentId::new("srv-9");
        seq.rename(target.kind, &target.id, &new_id);
        assert_eq!(seq.items()[1].id, new_id);
    }
}
