//! Built-in board shown on first run and in fallback mode. Never stored
//! remotely.

use crate::cache::{Board, Collection, Entry};
use crate::model::{Category, ContentId, Theory, VisionImage, VisionVideo, Wish};

fn id(s: &str) -> ContentId {
    ContentId::new(s)
}

fn local<T: crate::model::Content>(items: Vec<T>) -> Collection<T> {
    Collection::from_entries(items.into_iter().map(Entry::local).collect())
}

pub fn theories() -> Vec<Theory> {
    vec![
        Theory {
            id: id("demo-theory-1"),
            title: "On Beginnings".into(),
            content: "The secret of getting ahead is getting started.".into(),
            author: Some("Mark Twain".into()),
            category: Category::Personal,
        },
        Theory {
            id: id("demo-theory-2"),
            title: "Small Steps".into(),
            content: "A journey of a thousand miles begins with a single step.".into(),
            author: Some("Lao Tzu".into()),
            category: Category::Travel,
        },
        Theory {
            id: id("demo-theory-3"),
            title: "Craft".into(),
            content: "Creativity is intelligence having fun.".into(),
            author: None,
            category: Category::Creativity,
        },
    ]
}

pub fn wishes() -> Vec<Wish> {
    vec![
        Wish::new(
            id("demo-wish-1"),
            "Run a half marathon",
            Some("Build up to 21 km by the end of the year".into()),
            Category::Health,
            false,
            Some(40),
        ),
        Wish::new(
            id("demo-wish-2"),
            "Visit Japan in spring",
            None,
            Category::Travel,
            false,
            Some(10),
        ),
        Wish::new(
            id("demo-wish-3"),
            "Launch a side project",
            Some("Ship something small and real".into()),
            Category::Career,
            true,
            None,
        ),
        Wish::new(
            id("demo-wish-4"),
            "Weekly dinner with family",
            None,
            Category::Relationships,
            false,
            None,
        ),
    ]
}

pub fn images() -> Vec<VisionImage> {
    vec![
        VisionImage {
            id: id("demo-image-1"),
            src: "https://images.unsplash.com/photo-1506905925346-21bda4d32df4".into(),
            alt: "Mountain range at sunrise".into(),
            category: Category::Travel,
        },
        VisionImage {
            id: id("demo-image-2"),
            src: "https://images.unsplash.com/photo-1517836357463-d25dfeac3438".into(),
            alt: "Morning workout".into(),
            category: Category::Health,
        },
        VisionImage {
            id: id("demo-image-3"),
            src: "https://images.unsplash.com/photo-1497366216548-37526070297c".into(),
            alt: "Bright, calm workspace".into(),
            category: Category::Career,
        },
    ]
}

pub fn videos() -> Vec<VisionVideo> {
    vec![VisionVideo {
        id: id("demo-video-1"),
        url: "https://www.youtube.com/embed/inpok4MKVLM".into(),
        title: "Five minute meditation".into(),
        category: Category::Personal,
        thumbnail: None,
    }]
}

/// The demo dataset, every record marked local.
pub fn board() -> Board {
    Board {
        theories: local(theories()),
        wishes: local(wishes()),
        images: local(images()),
        videos: local(videos()),
    }
}
