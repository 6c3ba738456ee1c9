//! Category filter and the combined board grid.

use serde::{Deserialize, Serialize};

use crate::cache::Board;
use crate::model::{Category, Content, ContentId, ContentKind, Theory, VisionImage, VisionVideo, Wish};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => c == category,
        }
    }
}

/// Stable handle to a record across board mutations.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemRef {
    pub kind: ContentKind,
    pub id: ContentId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridItem<'a> {
    Theory(&'a Theory),
    Wish(&'a Wish),
    Image(&'a VisionImage),
    Video(&'a VisionVideo),
}

impl<'a> GridItem<'a> {
    pub fn kind(&self) -> ContentKind {
        match self {
            GridItem::Theory(_) => ContentKind::Theory,
            GridItem::Wish(_) => ContentKind::Wish,
            GridItem::Image(_) => ContentKind::Image,
            GridItem::Video(_) => ContentKind::Video,
        }
    }

    pub fn id(&self) -> &'a ContentId {
        match self {
            GridItem::Theory(t) => t.id(),
            GridItem::Wish(w) => w.id(),
            GridItem::Image(i) => i.id(),
            GridItem::Video(v) => v.id(),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            GridItem::Theory(t) => t.category(),
            GridItem::Wish(w) => w.category(),
            GridItem::Image(i) => i.category(),
            GridItem::Video(v) => v.category(),
        }
    }

    pub fn item_ref(&self) -> ItemRef {
        ItemRef {
            kind: self.kind(),
            id: self.id().clone(),
        }
    }
}

/// Every record on the board, in collection order, theories first.
pub fn all_items(board: &Board) -> impl Iterator<Item = GridItem<'_>> {
    board
        .theories
        .items()
        .map(GridItem::Theory)
        .chain(board.wishes.items().map(GridItem::Wish))
        .chain(board.images.items().map(GridItem::Image))
        .chain(board.videos.items().map(GridItem::Video))
}

/// Filtered grid ordered by kind (theory, wish, image, video) then id.
pub fn compose(board: &Board, filter: CategoryFilter) -> Vec<GridItem<'_>> {
    let mut items: Vec<GridItem<'_>> = all_items(board)
        .filter(|item| filter.matches(item.category()))
        .collect();
    items.sort_by(|a, b| a.kind().cmp(&b.kind()).then_with(|| a.id().cmp(b.id())));
    items
}

pub fn resolve<'a>(board: &'a Board, item: &ItemRef) -> Option<GridItem<'a>> {
    let id = &item.id;
    match item.kind {
        ContentKind::Theory => board.theories.get(id).map(|e| GridItem::Theory(&e.item)),
        ContentKind::Wish => board.wishes.get(id).map(|e| GridItem::Wish(&e.item)),
        ContentKind::Image => board.images.get(id).map(|e| GridItem::Image(&e.item)),
        ContentKind::Video => board.videos.get(id).map(|e| GridItem::Video(&e.item)),
    }
}
