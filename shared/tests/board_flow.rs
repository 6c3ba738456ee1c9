mod common;

use assert_matches::assert_matches;
use common::*;
use vision_shared::config::Environment;
use vision_shared::grid::CategoryFilter;
use vision_shared::model::{
    Category, ContentId, ContentKind, ImageDraft, TheoryDraft, VideoDraft, WishDraft,
};
use vision_shared::view::{CardBody, Route, StorageMode, EMPTY_GRID_MESSAGE};
use vision_shared::{Effect, Event, Model};

fn fallback(app: &Tester) -> Model {
    let mut model = Model::default();
    send(app, &mut model, Event::Start { env: Environment::new() });
    model
}

fn only_renders(effects: &[Effect]) -> bool {
    effects.iter().all(|e| matches!(e, Effect::Render(_)))
}

#[test]
fn fallback_mode_shows_demo_board_on_the_board_route() {
    let app = Tester::default();
    let model = fallback(&app);
    let view = app.view(&model);

    assert_eq!(view.mode, StorageMode::Fallback);
    assert_eq!(view.route, Route::Board);
    assert_eq!(view.cards.len(), model.board.len());
    assert!(!view.grid_is_empty);
    assert!(view.load_error.is_none());
}

#[test]
fn half_configured_backend_falls_back() {
    let app = Tester::default();
    let mut model = Model::default();
    let effects = send(
        &app,
        &mut model,
        Event::Start {
            env: Environment::new().with("VITE_SUPABASE_URL", "https://abc.supabase.co"),
        },
    );
    assert!(only_renders(&effects));
    assert_eq!(app.view(&model).mode, StorageMode::Fallback);
}

#[test]
fn empty_theory_title_adds_nothing() {
    let app = Tester::default();
    let mut model = fallback(&app);
    let before = model.board.theories.len();

    send(
        &app,
        &mut model,
        Event::TheoryAdded(Box::new(TheoryDraft {
            title: String::new(),
            content: "Some content".into(),
            author: None,
            category: Category::Career,
        })),
    );
    assert_eq!(model.board.theories.len(), before);
}

#[test]
fn wish_saved_at_full_progress_is_completed() {
    let app = Tester::default();
    let mut model = fallback(&app);

    send(
        &app,
        &mut model,
        Event::WishAdded(Box::new(WishDraft {
            title: "Finish the novel".into(),
            description: None,
            category: Category::Creativity,
            progress: 100,
        })),
    );
    let wish = &model.board.wishes.entries()[0].item;
    assert!(wish.completed());
    assert_eq!(wish.progress(), Some(100));
}

#[test]
fn toggling_an_incomplete_wish_and_back_restores_progress() {
    let app = Tester::default();
    let mut model = fallback(&app);
    send(
        &app,
        &mut model,
        Event::WishAdded(Box::new(WishDraft {
            title: "Learn to surf".into(),
            description: None,
            category: Category::Travel,
            progress: 45,
        })),
    );
    let id = model.board.wishes.entries()[0].item.id.clone();

    send(&app, &mut model, Event::WishToggled { id: id.clone() });
    let wish = &model.board.wishes.get(&id).unwrap().item;
    assert!(wish.completed());
    assert_eq!(wish.progress(), Some(100));

    send(&app, &mut model, Event::WishToggled { id: id.clone() });
    let wish = &model.board.wishes.get(&id).unwrap().item;
    assert!(!wish.completed());
    assert_eq!(wish.progress(), Some(45));
}

#[test]
fn editing_a_wish_below_full_progress_uncompletes_it() {
    let app = Tester::default();
    let mut model = fallback(&app);
    let id = ContentId::new("demo-wish-3");
    assert!(model.board.wishes.get(&id).unwrap().item.completed());

    send(
        &app,
        &mut model,
        Event::WishEdited {
            id: id.clone(),
            draft: Box::new(WishDraft {
                title: "Launch a side project".into(),
                description: None,
                category: Category::Career,
                progress: 80,
            }),
        },
    );
    let wish = &model.board.wishes.get(&id).unwrap().item;
    assert!(!wish.completed());
    assert_eq!(wish.progress(), Some(80));
}

#[test]
fn image_and_video_drafts_are_validated() {
    let app = Tester::default();
    let mut model = fallback(&app);
    let images = model.board.images.len();
    let videos = model.board.videos.len();

    send(
        &app,
        &mut model,
        Event::ImageAdded(Box::new(ImageDraft {
            src: "javascript:alert(1)".into(),
            alt: "bad".into(),
            category: Category::Health,
        })),
    );
    send(
        &app,
        &mut model,
        Event::ImageAdded(Box::new(ImageDraft {
            src: "data:image/png;base64,iVBORw0KGgo=".into(),
            alt: "Uploaded photo".into(),
            category: Category::Health,
        })),
    );
    send(
        &app,
        &mut model,
        Event::VideoAdded(Box::new(VideoDraft {
            url: "https://www.youtube.com/embed/abc".into(),
            title: "Morning yoga".into(),
            category: Category::Health,
            thumbnail: None,
        })),
    );

    assert_eq!(model.board.images.len(), images + 1);
    assert_eq!(model.board.videos.len(), videos + 1);
}

#[test]
fn edits_of_unknown_records_are_ignored() {
    let app = Tester::default();
    let mut model = fallback(&app);
    let before = model.board.clone();
    send(
        &app,
        &mut model,
        Event::ImageEdited {
            id: ContentId::new("missing"),
            draft: Box::new(ImageDraft {
                src: "https://x.example.com/a.jpg".into(),
                alt: "a".into(),
                category: Category::Career,
            }),
        },
    );
    send(&app, &mut model, Event::WishToggled { id: ContentId::new("missing") });
    assert_eq!(model.board, before);
}

#[test]
fn category_filter_narrows_the_grid() {
    let app = Tester::default();
    let mut model = fallback(&app);

    send(
        &app,
        &mut model,
        Event::CategorySelected {
            filter: CategoryFilter::Only(Category::Health),
        },
    );
    let view = app.view(&model);
    assert!(!view.cards.is_empty());
    assert!(view.cards.iter().all(|c| c.category == Category::Health));
    assert!(view.categories.iter().any(|o| o.selected && o.label == "Health & Wellness"));
}

#[test]
fn empty_category_shows_placeholder() {
    let app = Tester::default();
    let mut model = fallback(&app);
    for card in app.view(&model).cards {
        if card.category == Category::Relationships {
            send(
                &app,
                &mut model,
                Event::ContentDeleted {
                    kind: card.kind,
                    id: card.id,
                },
            );
        }
    }
    send(
        &app,
        &mut model,
        Event::CategorySelected {
            filter: CategoryFilter::Only(Category::Relationships),
        },
    );
    let view = app.view(&model);
    assert!(view.grid_is_empty);
    assert_eq!(view.empty_message.as_deref(), Some(EMPTY_GRID_MESSAGE));
}

#[test]
fn focus_mode_walks_every_item_and_wraps() {
    let app = Tester::default();
    let mut model = fallback(&app);
    let total = model.board.len();

    send(&app, &mut model, Event::FocusOpened);
    let focus = app.view(&model).focus.unwrap();
    assert_eq!(focus.total, total);
    assert_eq!(focus.position, 1);

    let mut seen = std::collections::BTreeSet::new();
    for _ in 0..total {
        let card = app.view(&model).focus.unwrap().card.unwrap();
        seen.insert((card.kind, card.id));
        send(&app, &mut model, Event::FocusKeyPressed { key: "ArrowRight".into() });
    }
    assert_eq!(seen.len(), total);
    assert_eq!(app.view(&model).focus.unwrap().position, 1);

    send(&app, &mut model, Event::FocusShuffled);
    assert_eq!(app.view(&model).focus.unwrap().position, 1);
    send(&app, &mut model, Event::FocusClosed);
    assert!(app.view(&model).focus.is_none());
}

#[test]
fn shuffle_is_ignored_while_focus_is_closed() {
    let app = Tester::default();
    let mut model = fallback(&app);
    send(&app, &mut model, Event::FocusShuffled);
    send(&app, &mut model, Event::FocusNext);
    assert!(model.focus.is_none());
}

#[test]
fn focus_on_empty_board_renders_nothing() {
    let app = Tester::default();
    let mut model = fallback(&app);
    for card in app.view(&model).cards {
        send(
            &app,
            &mut model,
            Event::ContentDeleted {
                kind: card.kind,
                id: card.id,
            },
        );
    }
    send(&app, &mut model, Event::FocusOpened);
    send(&app, &mut model, Event::FocusNext);
    send(&app, &mut model, Event::FocusPrevious);

    let focus = app.view(&model).focus.unwrap();
    assert_eq!(focus.total, 0);
    assert_eq!(focus.position, 0);
    assert!(focus.card.is_none());
}

#[test]
fn focus_card_shows_current_content() {
    let app = Tester::default();
    let mut model = fallback(&app);
    for card in app.view(&model).cards {
        if card.kind != ContentKind::Theory {
            send(
                &app,
                &mut model,
                Event::ContentDeleted {
                    kind: card.kind,
                    id: card.id,
                },
            );
        }
    }
    send(&app, &mut model, Event::FocusOpened);
    let card = app.view(&model).focus.unwrap().card.unwrap();
    assert_matches!(card.body, CardBody::Theory { .. });
}
