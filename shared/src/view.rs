use serde::{Deserialize, Serialize};

use crate::app::Model;
use crate::cache::Board;
use crate::grid::{compose, resolve, CategoryFilter, GridItem};
use crate::model::{Category, ContentId, ContentKind, SyncStatus};

pub const LOAD_ERROR_MESSAGE: &str = "We couldn't load your vision board.";
pub const EMPTY_GRID_MESSAGE: &str = "No items in this category yet.";

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    #[default]
    Board,
    Auth,
}

impl Route {
    pub const fn path(self) -> &'static str {
        match self {
            Route::Board => "/",
            Route::Auth => "/auth",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageMode {
    Remote,
    Fallback,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryOption {
    pub filter: CategoryFilter,
    pub label: String,
    pub selected: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardBody {
    Theory {
        title: String,
        content: String,
        author: Option<String>,
    },
    Wish {
        title: String,
        description: Option<String>,
        completed: bool,
        progress: Option<u8>,
    },
    Image {
        src: String,
        alt: String,
    },
    Video {
        url: String,
        title: String,
        thumbnail: Option<String>,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardView {
    pub id: ContentId,
    pub kind: ContentKind,
    pub category: Category,
    pub category_label: String,
    pub sync_status: SyncStatus,
    pub body: CardBody,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FocusView {
    /// One-based, for "3 / 12" counters. Zero when empty.
    pub position: usize,
    pub total: usize,
    pub card: Option<CardView>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthView {
    pub busy: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewModel {
    pub route: Route,
    pub path: String,
    pub mode: StorageMode,
    pub user_email: Option<String>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub load_error: Option<String>,
    pub categories: Vec<CategoryOption>,
    pub filter: CategoryFilter,
    pub cards: Vec<CardView>,
    pub grid_is_empty: bool,
    pub empty_message: Option<String>,
    pub focus: Option<FocusView>,
    pub auth: AuthView,
    pub pending_sync_count: usize,
    pub failed_sync_count: usize,
}

fn sync_status(board: &Board, kind: ContentKind, id: &ContentId) -> SyncStatus {
    board.state(kind, id).map(|(sync, _)| sync).unwrap_or_default()
}

pub fn card(board: &Board, item: GridItem<'_>) -> CardView {
    let body = match item {
        GridItem::Theory(t) => CardBody::Theory {
            title: t.title.clone(),
            content: t.content.clone(),
            author: t.author.clone(),
        },
        GridItem::Wish(w) => CardBody::Wish {
            title: w.title.clone(),
            description: w.description.clone(),
            completed: w.completed(),
            progress: w.progress(),
        },
        GridItem::Image(i) => CardBody::Image {
            src: i.src.clone(),
            alt: i.alt.clone(),
        },
        GridItem::Video(v) => CardBody::Video {
            url: v.url.clone(),
            title: v.title.clone(),
            thumbnail: v.thumbnail.clone(),
        },
    };
    CardView {
        id: item.id().clone(),
        kind: item.kind(),
        category: item.category(),
        category_label: item.category().label().to_string(),
        sync_status: sync_status(board, item.kind(), item.id()),
        body,
    }
}

fn categories(selected: CategoryFilter) -> Vec<CategoryOption> {
    std::iter::once((CategoryFilter::All, "All"))
        .chain(Category::ALL.iter().map(|c| (CategoryFilter::Only(*c), c.label())))
        .map(|(filter, label)| CategoryOption {
            filter,
            label: label.to_string(),
            selected: filter == selected,
        })
        .collect()
}

pub fn build(model: &Model) -> ViewModel {
    let board = &model.board;
    let cards: Vec<CardView> = compose(board, model.filter)
        .into_iter()
        .map(|item| card(board, item))
        .collect();
    let grid_is_empty = cards.is_empty();

    let focus = model.focus.as_ref().map(|seq| FocusView {
        position: if seq.is_empty() { 0 } else { seq.index() + 1 },
        total: seq.len(),
        card: seq
            .current()
            .and_then(|r| resolve(board, r))
            .map(|item| card(board, item)),
    });

    ViewModel {
        route: model.route,
        path: model.route.path().to_string(),
        mode: if model.remote.is_some() {
            StorageMode::Remote
        } else {
            StorageMode::Fallback
        },
        user_email: model.session.as_ref().and_then(|s| s.email.clone()),
        is_authenticated: model.session.is_some(),
        is_loading: model.restoring || model.load.is_some(),
        load_error: model.load_error.then(|| LOAD_ERROR_MESSAGE.to_string()),
        categories: categories(model.filter),
        filter: model.filter,
        cards,
        grid_is_empty,
        empty_message: grid_is_empty.then(|| EMPTY_GRID_MESSAGE.to_string()),
        focus,
        auth: model.auth.clone(),
        pending_sync_count: board.pending_count(),
        failed_sync_count: board.failed_count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;

    #[test]
    fn category_options_start_with_all() {
        let options = categories(CategoryFilter::Only(Category::Health));
        assert_eq!(options.len(), 7);
        assert_eq!(options[0].label, "All");
        assert!(!options[0].selected);
        let health = options.iter().find(|o| o.selected).unwrap();
        assert_eq!(health.label, "Health & Wellness");
    }

    #[test]
    fn cards_carry_labels_and_status() {
        let board = demo::board();
        let item = compose(&board, CategoryFilter::All)[0];
        let view = card(&board, item);
        assert_eq!(view.kind, ContentKind::Theory);
        assert_eq!(view.sync_status, SyncStatus::Local);
        assert_eq!(view.category_label, view.category.label());
    }

    #[test]
    fn routes_have_paths() {
        assert_eq!(Route::Board.path(), "/");
        assert_eq!(Route::Auth.path(), "/auth");
    }
}
