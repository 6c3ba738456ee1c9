use crux_http::Response;
use crux_kv::error::KeyValueError;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

use crate::auth::TokenResponse;
use crate::config::Environment;
use crate::grid::CategoryFilter;
use crate::model::{ContentId, ContentKind, ImageDraft, TheoryDraft, VideoDraft, WishDraft};
use crate::remote::{ImageRow, MutationOp, TheoryRow, VideoRow, WishRow};

// --- Secret wrapper: redacts Debug, zeroizes on Drop ---

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

pub type HttpOutcome<T> = Box<crux_http::Result<Response<T>>>;
pub type KvOutcome = Result<Option<Vec<u8>>, KeyValueError>;

// --- Event enum: intents first, capability responses last ---

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum Event {
    // Lifecycle
    Start {
        env: Environment,
    },
    ReloadRequested,
    LoadErrorDismissed,

    // Auth
    SignInRequested {
        email: String,
        password: Secret,
    },
    SignUpRequested {
        email: String,
        password: Secret,
        confirm: Secret,
    },
    SignOutRequested,

    // Board
    CategorySelected {
        filter: CategoryFilter,
    },
    TheoryAdded(Box<TheoryDraft>),
    WishAdded(Box<WishDraft>),
    ImageAdded(Box<ImageDraft>),
    VideoAdded(Box<VideoDraft>),
    TheoryEdited {
        id: ContentId,
        draft: Box<TheoryDraft>,
    },
    WishEdited {
        id: ContentId,
        draft: Box<WishDraft>,
    },
    ImageEdited {
        id: ContentId,
        draft: Box<ImageDraft>,
    },
    VideoEdited {
        id: ContentId,
        draft: Box<VideoDraft>,
    },
    ContentDeleted {
        kind: ContentKind,
        id: ContentId,
    },
    WishToggled {
        id: ContentId,
    },

    // Focus mode
    FocusOpened,
    FocusClosed,
    FocusNext,
    FocusPrevious,
    FocusShuffled,
    FocusKeyPressed {
        key: String,
    },

    // Capability responses (boxed to keep enum size small)
    #[serde(skip)]
    SessionRestored(KvOutcome),
    #[serde(skip)]
    SessionStored(KvOutcome),
    #[serde(skip)]
    SignedIn(HttpOutcome<TokenResponse>),
    #[serde(skip)]
    SignedUp(HttpOutcome<Vec<u8>>),
    #[serde(skip)]
    SignedOut(HttpOutcome<Vec<u8>>),

    #[serde(skip)]
    TheoriesLoaded {
        generation: u64,
        result: HttpOutcome<Vec<TheoryRow>>,
    },
    #[serde(skip)]
    WishesLoaded {
        generation: u64,
        result: HttpOutcome<Vec<WishRow>>,
    },
    #[serde(skip)]
    ImagesLoaded {
        generation: u64,
        result: HttpOutcome<Vec<ImageRow>>,
    },
    #[serde(skip)]
    VideosLoaded {
        generation: u64,
        result: HttpOutcome<Vec<VideoRow>>,
    },

    #[serde(skip)]
    TheoryInserted {
        local_id: ContentId,
        result: HttpOutcome<Vec<TheoryRow>>,
    },
    #[serde(skip)]
    WishInserted {
        local_id: ContentId,
        result: HttpOutcome<Vec<WishRow>>,
    },
    #[serde(skip)]
    ImageInserted {
        local_id: ContentId,
        result: HttpOutcome<Vec<ImageRow>>,
    },
    #[serde(skip)]
    VideoInserted {
        local_id: ContentId,
        result: HttpOutcome<Vec<VideoRow>>,
    },

    #[serde(skip)]
    MutationSettled {
        kind: ContentKind,
        id: ContentId,
        op: MutationOp,
        result: HttpOutcome<Vec<u8>>,
    },
}

impl Event {
    /// Stable name for logging; never includes payload data.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::ReloadRequested => "reload_requested",
            Self::LoadErrorDismissed => "load_error_dismissed",
            Self::SignInRequested { .. } => "sign_in_requested",
            Self::SignUpRequested { .. } => "sign_up_requested",
            Self::SignOutRequested => "sign_out_requested",
            Self::CategorySelected { .. } => "category_selected",
            Self::TheoryAdded(_) => "theory_added",
            Self::WishAdded(_) => "wish_added",
            Self::ImageAdded(_) => "image_added",
            Self::VideoAdded(_) => "video_added",
            Self::TheoryEdited { .. } => "theory_edited",
            Self::WishEdited { .. } => "wish_edited",
            Self::ImageEdited { .. } => "image_edited",
            Self::VideoEdited { .. } => "video_edited",
            Self::ContentDeleted { .. } => "content_deleted",
            Self::WishToggled { .. } => "wish_toggled",
            Self::FocusOpened => "focus_opened",
            Self::FocusClosed => "focus_closed",
            Self::FocusNext => "focus_next",
            Self::FocusPrevious => "focus_previous",
            Self::FocusShuffled => "focus_shuffled",
            Self::FocusKeyPressed { .. } => "focus_key_pressed",
            Self::SessionRestored(_) => "session_restored",
            Self::SessionStored(_) => "session_stored",
            Self::SignedIn(_) => "signed_in",
            Self::SignedUp(_) => "signed_up",
            Self::SignedOut(_) => "signed_out",
            Self::TheoriesLoaded { .. } => "theories_loaded",
            Self::WishesLoaded { .. } => "wishes_loaded",
            Self::ImagesLoaded { .. } => "images_loaded",
            Self::VideosLoaded { .. } => "videos_loaded",
            Self::TheoryInserted { .. } => "theory_inserted",
            Self::WishInserted { .. } => "wish_inserted",
            Self::ImageInserted { .. } => "image_inserted",
            Self::VideoInserted { .. } => "video_inserted",
            Self::MutationSettled { .. } => "mutation_settled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_debug_is_redacted() {
        let s = Secret::new("super_secret");
        assert_eq!(format!("{:?}", s), "[REDACTED]");
    }

    #[test]
    fn secret_serializes_as_plain_string() {
        let s = Secret::new("hunter22");
        assert_eq!(serde_json::to_string(&s).unwrap(), "\"hunter22\"");
        let back: Secret = serde_json::from_str("\"hunter22\"").unwrap();
        assert_eq!(back.expose(), "hunter22");
    }

    #[test]
    fn sign_in_event_debug_hides_password() {
        let event = Event::SignInRequested {
            email: "me@example.com".into(),
            password: Secret::new("hunter22"),
        };
        let debug = format!("{event:?}");
        assert!(!debug.contains("hunter22"));
        assert!(debug.contains("me@example.com"));
    }

    #[test]
    fn intents_round_trip_through_serde() {
        let event = Event::WishToggled {
            id: ContentId::new("42"),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, Event::WishToggled { id } if id.as_str() == "42"));
    }

    #[test]
    fn event_size_is_reasonable() {
        // Ensure boxing keeps the enum small.
        let size = std::mem::size_of::<Event>();
        assert!(
            size <= 128,
            "Event enum is {} bytes; box more variants",
            size
        );
    }
}
